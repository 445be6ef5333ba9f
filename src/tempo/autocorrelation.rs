//! Autocorrelation-based tempo hypothesis generation (spec.md §4.4).

use crate::types::TempoHypothesis;

const MUSICAL_PRIORS: [f32; 8] = [120.0, 128.0, 100.0, 140.0, 90.0, 110.0, 130.0, 150.0];

/// Generate tempo hypotheses from the onset function's autocorrelation,
/// restricted to `[min_bpm, max_bpm]`.
pub fn autocorrelation_hypotheses(
    onset_values: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Vec<TempoHypothesis> {
    if onset_values.len() < 4 {
        return vec![];
    }

    let max_lag = ((frame_rate * 60.0 / min_bpm).round() as usize).min(onset_values.len() - 1);
    if max_lag < 2 {
        return vec![];
    }

    let acf = compute_acf(onset_values, max_lag);
    let (onset_mean, onset_cv) = mean_cv(onset_values);

    let mut hypotheses = Vec::new();
    for lag in 2..acf.len() - 1 {
        let peak = acf[lag];
        if peak <= 0.1 {
            continue;
        }
        if !(peak > acf[lag - 1] && peak >= acf[lag + 1]) {
            continue;
        }

        let bpm = 60.0 * frame_rate / lag as f32;
        if bpm < min_bpm || bpm > max_bpm {
            continue;
        }

        let lo = lag.saturating_sub(lag / 10).max(1);
        let hi = (lag + lag / 10 + 1).min(acf.len());
        let local_max = acf[lo..hi].iter().cloned().fold(0.0f32, f32::max).max(1e-9);
        let prominence = peak / local_max;

        let mut confidence = 0.4 * peak + 0.3 * prominence + 0.2 * onset_mean + 0.1 * (1.0 - onset_cv);
        confidence = confidence.clamp(0.0, 1.0);

        if MUSICAL_PRIORS.iter().any(|&p| (bpm - p).abs() <= 5.0) {
            confidence = (confidence * 1.2).min(1.0);
        }

        hypotheses.push(TempoHypothesis {
            bpm,
            confidence,
            phase: 0.0,
            strength: peak,
            autocorrelation_peak: peak,
        });
    }

    hypotheses.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    hypotheses
}

/// Scaled copies of the top hypotheses at common tempo multiples.
pub fn tempo_multiples(hypotheses: &[TempoHypothesis]) -> Vec<TempoHypothesis> {
    let mut out = Vec::new();
    for h in hypotheses.iter().take(5) {
        for &(factor, scale) in &[(0.25, 0.6), (0.5, 0.8), (2.0, 0.8), (3.0, 0.6), (4.0, 0.6)] {
            let bpm = h.bpm * factor;
            if (50.0..=250.0).contains(&bpm) {
                out.push(TempoHypothesis {
                    bpm,
                    confidence: h.confidence * scale,
                    phase: h.phase,
                    strength: h.strength,
                    autocorrelation_peak: h.autocorrelation_peak,
                });
            }
        }
    }
    out
}

fn compute_acf(values: &[f32], max_lag: usize) -> Vec<f32> {
    let n = values.len();
    let mean = values.iter().sum::<f32>() / n as f32;
    let centered: Vec<f32> = values.iter().map(|&v| v - mean).collect();
    let denom: f32 = centered.iter().map(|&v| v * v).sum::<f32>().max(1e-9);

    (0..=max_lag)
        .map(|lag| {
            let num: f32 = (0..n - lag).map(|i| centered[i] * centered[i + lag]).sum();
            (num / denom).max(0.0)
        })
        .collect()
}

fn mean_cv(values: &[f32]) -> (f32, f32) {
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    let std = var.sqrt();
    let cv = if mean > 1e-9 { (std / mean).clamp(0.0, 1.0) } else { 0.0 };
    (mean.clamp(0.0, 1.0), cv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic_onset(period_frames: usize, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| if i % period_frames < 2 { 1.0 } else { 0.05 })
            .collect()
    }

    #[test]
    fn finds_hypothesis_near_known_period() {
        let frame_rate = 172.27;
        let period = (60.0 / 120.0 * frame_rate).round() as usize;
        let onset = periodic_onset(period, 2000);
        let hyps = autocorrelation_hypotheses(&onset, frame_rate, 60.0, 200.0);
        assert!(!hyps.is_empty());
        assert!(hyps.iter().any(|h| (h.bpm - 120.0).abs() < 10.0));
    }

    #[test]
    fn confidences_bounded() {
        let onset = periodic_onset(80, 2000);
        let hyps = autocorrelation_hypotheses(&onset, 172.27, 60.0, 200.0);
        assert!(hyps.iter().all(|h| (0.0..=1.0).contains(&h.confidence)));
    }

    #[test]
    fn short_input_yields_no_hypotheses() {
        let onset = vec![0.1, 0.2];
        assert!(autocorrelation_hypotheses(&onset, 172.27, 60.0, 200.0).is_empty());
    }

    #[test]
    fn multiples_restricted_to_range() {
        let base = vec![TempoHypothesis {
            bpm: 120.0,
            confidence: 0.9,
            phase: 0.0,
            strength: 0.5,
            autocorrelation_peak: 0.5,
        }];
        let multiples = tempo_multiples(&base);
        assert!(multiples.iter().all(|h| (50.0..=250.0).contains(&h.bpm)));
    }
}
