//! Tempo tracking (spec.md §4.4): a rhythm-band onset function, multi-scale
//! autocorrelation, scoring against musical priors, phase estimation, time
//! signature inference, and beat-grid alignment (DP or template).

mod autocorrelation;
mod beat_track;
mod onset_function;
mod phase;
mod time_signature;

use crate::error::Result;
use crate::types::{Onset, OnsetFunction, Tempo, TempoAlternative, TempoHypothesis};

pub use beat_track::{apply_variable_tempo, enforce_spacing, track_beats_dp, track_beats_template};

/// Estimate tempo from raw samples: builds the rhythm-band onset function,
/// gathers autocorrelation hypotheses (optionally at downsampled scales),
/// adds tempo multiples, scores everything, and picks the best.
pub fn track_tempo(
    samples: &[f32],
    sample_rate: u32,
    min_bpm: f32,
    max_bpm: f32,
    multi_pass: bool,
) -> Result<(Tempo, OnsetFunction)> {
    let rhythm_values = onset_function::rhythm_onset_function(samples, sample_rate)?;
    let frame_rate = onset_function::frame_rate(sample_rate);

    if rhythm_values.len() < 8 {
        return Ok((
            Tempo::default_unknown(),
            OnsetFunction {
                values: rhythm_values,
                hop_size: onset_function::hop(),
                sample_rate,
            },
        ));
    }

    let mut hypotheses = autocorrelation::autocorrelation_hypotheses(
        &rhythm_values,
        frame_rate,
        min_bpm,
        max_bpm,
    );

    if multi_pass {
        for &scale in &[2usize, 4] {
            let downsampled: Vec<f32> = rhythm_values
                .iter()
                .step_by(scale)
                .copied()
                .collect();
            let scaled_rate = frame_rate / scale as f32;
            let scaled = autocorrelation::autocorrelation_hypotheses(
                &downsampled,
                scaled_rate,
                min_bpm,
                max_bpm,
            );
            hypotheses.extend(scaled);
        }
    }

    hypotheses.extend(autocorrelation::tempo_multiples(&hypotheses));

    for h in hypotheses.iter_mut() {
        h.phase = phase::estimate_phase(&rhythm_values, frame_rate, h.bpm);
    }

    let scored = score_hypotheses(hypotheses);

    let tempo = select_tempo(scored, &rhythm_values, frame_rate, sample_rate, min_bpm, max_bpm);

    Ok((
        tempo,
        OnsetFunction {
            values: rhythm_values,
            hop_size: onset_function::hop(),
            sample_rate,
        },
    ))
}

/// Apply the musical-prior preference bands, extreme-tempo penalties,
/// integer-bpm bonuses, and phase-quality factor (spec.md §4.4 Scoring).
fn score_hypotheses(mut hypotheses: Vec<TempoHypothesis>) -> Vec<TempoHypothesis> {
    for h in hypotheses.iter_mut() {
        let mut c = h.confidence;

        c *= match h.bpm {
            bpm if (110.0..130.0).contains(&bpm) => 1.3,
            bpm if (90.0..110.0).contains(&bpm) => 1.2,
            bpm if (60.0..80.0).contains(&bpm) => 1.15,
            bpm if (140.0..160.0).contains(&bpm) => 1.1,
            _ => 1.0,
        };

        c *= if h.bpm < 50.0 {
            0.3
        } else if h.bpm < 70.0 {
            0.7
        } else if h.bpm > 250.0 {
            0.2
        } else if h.bpm > 200.0 {
            0.6
        } else {
            1.0
        };

        let rounded = h.bpm.round();
        if (h.bpm - rounded).abs() < 0.01 {
            c *= 1.08;
        } else if (h.bpm * 2.0 - (h.bpm * 2.0).round()).abs() < 0.01 {
            c *= 1.04;
        } else if (h.bpm * 4.0 - (h.bpm * 4.0).round()).abs() < 0.01 {
            c *= 1.02;
        }

        c *= 0.8 + 0.2 * h.autocorrelation_peak;

        let beat_interval = 60.0 / h.bpm as f64;
        let frac = (h.phase / beat_interval).fract();
        let nearest = [0.0, 0.25, 0.5, 0.75]
            .iter()
            .map(|&p| (frac - p as f64).abs().min((1.0 - (frac - p as f64).abs()).abs()))
            .fold(f64::MAX, f64::min);
        let phase_quality = (1.0 - nearest * 2.0).clamp(0.0, 1.0) as f32;
        c *= 0.9 + 0.1 * phase_quality;

        h.confidence = c.clamp(0.0, 1.0);
    }
    hypotheses
}

fn select_tempo(
    mut hypotheses: Vec<TempoHypothesis>,
    rhythm_values: &[f32],
    frame_rate: f32,
    sample_rate: u32,
    min_bpm: f32,
    max_bpm: f32,
) -> Tempo {
    hypotheses.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let best = match hypotheses.first() {
        Some(h) if h.confidence > 0.0 => h.clone(),
        _ => return Tempo::default_unknown(),
    };

    let alternatives: Vec<TempoAlternative> = hypotheses
        .iter()
        .take(3)
        .map(|h| TempoAlternative {
            bpm: h.bpm,
            confidence: h.confidence,
        })
        .collect();

    let time_signature = time_signature::infer_time_signature(rhythm_values, frame_rate, best.bpm);
    let _ = (sample_rate, min_bpm, max_bpm);

    Tempo {
        bpm: best.bpm,
        confidence: best.confidence,
        time_signature: Some(time_signature),
        phase: Some(best.phase),
        alternatives: Some(alternatives),
    }
}

/// Align `onsets` to the tempo's beat grid using the DP path, falling
/// back to the template path when `use_dp` is false or DP finds nothing.
///
/// `variable_tempo` both gates synthetic-beat emission on the template
/// fallback and, once the grid is built, re-estimates local tempo every
/// 4 beats (spec.md §4.4 "variable-tempo option").
pub fn track_beats(
    onsets: &[Onset],
    tempo: &Tempo,
    duration: f64,
    confidence_threshold: f32,
    use_dp: bool,
    variable_tempo: bool,
) -> Vec<crate::types::Beat> {
    let phase = tempo.phase.unwrap_or(0.0);
    let beats = if use_dp {
        track_beats_dp(onsets, tempo.bpm, phase, duration, confidence_threshold)
    } else {
        track_beats_template(onsets, tempo.bpm, phase, duration, tempo.confidence, variable_tempo)
    };
    let beats = enforce_spacing(beats, tempo.bpm);
    if variable_tempo {
        apply_variable_tempo(beats, tempo.bpm)
    } else {
        beats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_track(sample_rate: u32, bpm: f32, duration_secs: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * duration_secs) as usize;
        let mut samples = vec![0.0f32; n];
        let interval = (60.0 / bpm * sample_rate as f32) as usize;
        let mut pos = 0usize;
        while pos + 8 < n {
            for k in 0..8 {
                samples[pos + k] = 0.9 * (1.0 - k as f32 / 8.0);
            }
            pos += interval;
        }
        samples
    }

    #[test]
    fn tempo_near_ground_truth_for_click_track() {
        let samples = click_track(44_100, 120.0, 10.0);
        let (tempo, _) = track_tempo(&samples, 44_100, 60.0, 200.0, false).unwrap();
        assert!((tempo.bpm - 120.0).abs() / 120.0 < 0.1);
    }

    #[test]
    fn silence_yields_low_confidence() {
        let samples = vec![0.0f32; 44_100 * 2];
        let (tempo, _) = track_tempo(&samples, 44_100, 60.0, 200.0, false).unwrap();
        assert!(tempo.confidence <= 0.3);
    }

    #[test]
    fn short_input_yields_default_tempo() {
        let samples = vec![0.1f32; 100];
        let (tempo, _) = track_tempo(&samples, 44_100, 60.0, 200.0, false).unwrap();
        assert_eq!(tempo.bpm, 120.0);
        assert_eq!(tempo.confidence, 0.0);
    }
}
