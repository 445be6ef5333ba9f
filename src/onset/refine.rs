//! Sample-accurate onset time refinement (spec.md §4.3): a local search
//! around the frame-resolution estimate followed by a zero-crossing snap.

const SEARCH_RADIUS: i64 = 256;
const SEARCH_STEP: i64 = 16;
const SNAP_RADIUS: i64 = 64;

/// Refine `approx_sample` to a sub-frame time estimate and an adjusted
/// confidence. Returns (time_seconds, confidence).
pub fn refine_onset(
    samples: &[f32],
    approx_sample: usize,
    sample_rate: u32,
    base_confidence: f32,
) -> (f64, f32) {
    if samples.is_empty() {
        return (approx_sample as f64 / sample_rate.max(1) as f64, base_confidence);
    }

    let center = approx_sample as i64;
    let mut best_sample = center.clamp(0, samples.len() as i64 - 1);
    let mut best_score = f32::MIN;

    let mut offset = -SEARCH_RADIUS;
    while offset <= SEARCH_RADIUS {
        let candidate = center + offset;
        if candidate >= 0 && (candidate as usize) < samples.len() {
            let score = local_score(samples, candidate as usize, sample_rate);
            if score > best_score {
                best_score = score;
                best_sample = candidate;
            }
        }
        offset += SEARCH_STEP;
    }

    let snapped = snap_to_zero_crossing(samples, best_sample);

    let time = snapped as f64 / sample_rate.max(1) as f64;
    let confidence = (base_confidence * 1.1).min(1.0);
    (time, confidence)
}

/// Score a sample position by local energy, normalized spectral centroid,
/// and zero-crossing rate (spec.md §4.3).
fn local_score(samples: &[f32], index: usize, sample_rate: u32) -> f32 {
    let window = 512usize;
    let lo = index.saturating_sub(window / 2);
    let hi = (index + window / 2).min(samples.len());
    if hi <= lo {
        return 0.0;
    }
    let segment = &samples[lo..hi];

    let energy: f32 = segment.iter().map(|&s| s * s).sum::<f32>() / segment.len() as f32;

    let zcr = segment
        .windows(2)
        .filter(|p| (p[0] >= 0.0) != (p[1] >= 0.0))
        .count() as f32
        / segment.len().max(1) as f32;

    let centroid = normalized_spectral_centroid(segment, sample_rate);

    0.6 * energy + 0.3 * centroid + 0.1 * zcr * 100.0
}

/// Spectral centroid of `segment`, normalized to [0, 1] by the Nyquist
/// frequency.
fn normalized_spectral_centroid(segment: &[f32], sample_rate: u32) -> f32 {
    let size = segment.len().next_power_of_two().max(2);
    let mut padded = vec![0.0f32; size];
    padded[..segment.len()].copy_from_slice(segment);

    let Ok(mut fft) = crate::signal::FftProcessor::new(size) else {
        return 0.0;
    };
    let Ok(mag) = fft.magnitude(&padded) else {
        return 0.0;
    };
    let centroid = crate::signal::spectral_centroid(&mag, sample_rate).unwrap_or(0.0);
    (centroid / (sample_rate as f32 / 2.0)).clamp(0.0, 1.0)
}

/// Snap to the nearest zero crossing within `SNAP_RADIUS` samples, leaving
/// `index` unchanged if none is found.
fn snap_to_zero_crossing(samples: &[f32], index: i64) -> usize {
    let index = index.clamp(0, samples.len() as i64 - 1);
    let mut best: Option<(i64, i64)> = None;

    for offset in 0..=SNAP_RADIUS {
        for candidate in [index - offset, index + offset] {
            if candidate <= 0 || candidate as usize >= samples.len() {
                continue;
            }
            let a = samples[(candidate - 1) as usize];
            let b = samples[candidate as usize];
            if (a >= 0.0) != (b >= 0.0) {
                let dist = (candidate - index).abs();
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((candidate, dist));
                }
            }
        }
        if best.is_some() {
            break;
        }
    }

    best.map(|(c, _)| c as usize).unwrap_or(index.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_stays_within_search_radius() {
        let samples: Vec<f32> = (0..2000).map(|i| (i as f32 * 0.05).sin()).collect();
        let (time, confidence) = refine_onset(&samples, 1000, 44_100, 0.5);
        let sample_est = (time * 44_100.0).round() as i64;
        assert!((sample_est - 1000).abs() <= SEARCH_RADIUS + SNAP_RADIUS);
        assert!(confidence <= 1.0);
    }

    #[test]
    fn confidence_boost_caps_at_one() {
        let samples: Vec<f32> = vec![0.0; 200];
        let (_, confidence) = refine_onset(&samples, 100, 44_100, 0.95);
        assert!(confidence <= 1.0);
    }

    #[test]
    fn empty_input_is_handled() {
        let (time, confidence) = refine_onset(&[], 0, 44_100, 0.5);
        assert_eq!(time, 0.0);
        assert_eq!(confidence, 0.5);
    }
}
