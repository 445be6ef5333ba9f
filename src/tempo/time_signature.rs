//! Time signature inference from the onset function and a chosen tempo
//! (spec.md §4.4).

use crate::types::TimeSignature;

fn accent_template(numerator: u8) -> Vec<f32> {
    match numerator {
        2 => vec![1.0, 0.6],
        3 => vec![1.0, 0.6, 0.7],
        4 => vec![1.0, 0.6, 0.8, 0.6],
        6 => vec![1.0, 0.5, 0.6, 0.8, 0.5, 0.6],
        8 => vec![1.0, 0.5, 0.6, 0.5, 0.8, 0.5, 0.6, 0.5],
        _ => vec![1.0; numerator.max(1) as usize],
    }
}

pub fn infer_time_signature(onset_values: &[f32], frame_rate: f32, bpm: f32) -> TimeSignature {
    if onset_values.is_empty() || bpm <= 0.0 {
        return TimeSignature::default();
    }

    let beat_interval_frames = (60.0 * frame_rate / bpm).max(1.0);

    let mut best_numerator = 4u8;
    let mut best_score = -1.0f32;

    for &numerator in &[2u8, 3, 4, 6, 8] {
        let measure_frames = beat_interval_frames * numerator as f32;
        let template = accent_template(numerator);
        let per_beat = measure_beat_means(onset_values, measure_frames, numerator as usize);
        if per_beat.is_empty() {
            continue;
        }

        let max_beat = per_beat.iter().cloned().fold(0.0f32, f32::max).max(1e-9);
        let score: f32 = template
            .iter()
            .zip(per_beat.iter())
            .map(|(&expected, &actual)| expected.min(actual / max_beat))
            .sum();

        if score > best_score {
            best_score = score;
            best_numerator = numerator;
        }
    }

    if bpm >= 160.0 && bpm <= 200.0 {
        best_numerator = 3;
    } else if bpm >= 60.0 && bpm <= 90.0 && best_numerator == 6 {
        // keep 6/8 reading
    } else if best_score < 0.3 {
        best_numerator = 4;
    }

    let denominator = if best_numerator == 6 || best_numerator == 8 { 8 } else { 4 };
    TimeSignature {
        numerator: best_numerator,
        denominator,
    }
}

fn measure_beat_means(values: &[f32], measure_frames: f32, numerator: usize) -> Vec<f32> {
    if measure_frames < numerator as f32 {
        return vec![];
    }
    let beat_frames = measure_frames / numerator as f32;
    let mut sums = vec![0.0f32; numerator];
    let mut counts = vec![0usize; numerator];

    let mut pos = 0usize;
    while (pos as f32) < values.len() as f32 {
        let within_measure = (pos as f32) % measure_frames;
        let beat_idx = ((within_measure / beat_frames) as usize).min(numerator - 1);
        sums[beat_idx] += values[pos];
        counts[beat_idx] += 1;
        pos += beat_frames.max(1.0) as usize;
    }

    sums.iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c == 0 { 0.0 } else { s / c as f32 })
        .collect()
}
