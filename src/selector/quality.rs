//! Selection quality metrics (spec.md §4.5).

use crate::types::{Beat, SelectionQuality};

pub fn compute_quality(beats: &[Beat], duration: f64, target_count: usize) -> SelectionQuality {
    if beats.is_empty() || duration <= 0.0 {
        return SelectionQuality {
            coverage: 0.0,
            diversity: 0.0,
            spacing: 0.0,
            overall: 0.0,
            beat_density: 0.0,
        };
    }

    let first_s = beats.first().unwrap().timestamp_ms / 1000.0;
    let last_s = beats.last().unwrap().timestamp_ms / 1000.0;
    let coverage = ((last_s - first_s) / duration).clamp(0.0, 1.0) as f32;

    let max_strength = beats.iter().map(|b| b.strength).fold(0.0f32, f32::max);
    let min_strength = beats.iter().map(|b| b.strength).fold(f32::MAX, f32::min);
    let diversity = if max_strength > 0.0 {
        (1.0 - (max_strength - min_strength) / max_strength).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let spacing = if beats.len() > 1 {
        let deltas: Vec<f64> = beats.windows(2).map(|w| w[1].timestamp_ms - w[0].timestamp_ms).collect();
        let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
        let var = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
        let std = var.sqrt();
        if mean > 0.0 {
            (1.0 - std / mean).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    } else {
        1.0
    };

    let overall = (coverage + diversity + spacing) / 3.0;
    let beat_density = beats.len() as f32 / target_count.max(1) as f32;

    SelectionQuality {
        coverage,
        diversity,
        spacing,
        overall,
        beat_density,
    }
}
