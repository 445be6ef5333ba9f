//! Adaptive peak picking over an onset detection function (spec.md §4.3).

/// A candidate onset before time refinement.
#[derive(Debug, Clone, Copy)]
pub struct PeakHit {
    pub index: usize,
    pub value: f32,
    pub confidence: f32,
}

/// Pick local maxima in `values` that clear an adaptive threshold and are
/// spaced at least `min_interval_frames` apart. `threshold_scale` tightens
/// the threshold for noisy signals (spec.md §4.3).
pub fn pick_peaks(values: &[f32], min_interval_frames: usize, threshold_scale: f32) -> Vec<PeakHit> {
    if values.len() < 3 {
        return vec![];
    }

    let smoothed = smooth3(values);
    let (mean, std) = mean_std(&smoothed);
    let cv = if mean > 1e-9 { std / mean } else { 0.0 };
    let k = (1.0 + cv).clamp(1.0, 3.0);

    let stat_threshold = mean + k * std;
    let percentile_threshold = percentile(&smoothed, 0.9);
    let threshold = stat_threshold.max(percentile_threshold) * threshold_scale;

    let min_interval_frames = min_interval_frames.max(1);
    let mut hits = Vec::new();

    let n = smoothed.len();
    let mut i = 1;
    while i < n - 1 {
        let v = smoothed[i];
        if v > threshold && v >= smoothed[i - 1] && v >= smoothed[i + 1] {
            let confidence = if threshold > 0.0 {
                ((v - threshold) / threshold).clamp(0.0, 1.0)
            } else {
                0.0
            };
            hits.push(PeakHit {
                index: i,
                value: values[i],
                confidence,
            });
            i += min_interval_frames;
        } else {
            i += 1;
        }
    }

    hits
}

fn smooth3(values: &[f32]) -> Vec<f32> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 2).min(n);
            values[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
        })
        .collect()
}

fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    (mean, var.sqrt())
}

fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((sorted.len() as f32 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
