//! Beat-grid phase estimation (spec.md §4.4): for a candidate bpm, find
//! the grid offset in `[0, 60/bpm)` that maximizes mean onset strength.

const PHASE_SAMPLES: usize = 32;

pub fn estimate_phase(onset_values: &[f32], frame_rate: f32, bpm: f32) -> f64 {
    if onset_values.is_empty() || bpm <= 0.0 {
        return 0.0;
    }

    let beat_interval_frames = 60.0 * frame_rate / bpm;
    if beat_interval_frames < 1.0 {
        return 0.0;
    }

    let mut best_offset = 0usize;
    let mut best_mean = f32::MIN;

    for step in 0..PHASE_SAMPLES {
        let offset = (step as f32 / PHASE_SAMPLES as f32 * beat_interval_frames) as usize;
        let mean = mean_at_grid(onset_values, offset, beat_interval_frames);
        if mean > best_mean {
            best_mean = mean;
            best_offset = offset;
        }
    }

    (best_offset as f64) / frame_rate as f64
}

fn mean_at_grid(values: &[f32], offset: usize, interval_frames: f32) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    let mut pos = offset as f32;
    while (pos as usize) < values.len() {
        sum += values[pos as usize];
        count += 1;
        pos += interval_frames;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_is_within_beat_period() {
        let onset = vec![0.1f32; 1000];
        let frame_rate = 172.27;
        let bpm = 120.0;
        let phase = estimate_phase(&onset, frame_rate, bpm);
        assert!(phase >= 0.0 && phase < 60.0 / bpm as f64);
    }

    #[test]
    fn zero_bpm_yields_zero_phase() {
        assert_eq!(estimate_phase(&[0.1, 0.2], 172.27, 0.0), 0.0);
    }

    #[test]
    fn phase_prefers_aligned_peaks() {
        let frame_rate = 100.0f32;
        let bpm = 120.0f32;
        let interval = (60.0 * frame_rate / bpm) as usize;
        let mut onset = vec![0.0f32; interval * 10];
        let true_phase_frames = 5usize;
        let mut pos = true_phase_frames;
        while pos < onset.len() {
            onset[pos] = 1.0;
            pos += interval;
        }
        let phase = estimate_phase(&onset, frame_rate, bpm);
        let phase_frames = (phase * frame_rate as f64).round() as i64;
        assert!((phase_frames - true_phase_frames as i64).abs() <= 2);
    }
}
