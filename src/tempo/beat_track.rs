//! Beat-grid alignment: dynamic-programming path and a template fallback
//! (spec.md §4.4).

use crate::types::{Beat, BeatContext, Onset};

/// Build the expected beat grid from `bpm`/`phase` spanning `duration`
/// seconds.
fn beat_grid(bpm: f32, phase: f64, duration: f64) -> Vec<f64> {
    if bpm <= 0.0 {
        return vec![];
    }
    let interval = 60.0 / bpm as f64;
    let mut grid = Vec::new();
    let mut t = phase;
    while t < duration {
        grid.push(t);
        t += interval;
    }
    grid
}

/// Align onsets to an expected beat grid via dynamic programming
/// (spec.md §4.4 "Beat tracking — dynamic programming path").
pub fn track_beats_dp(
    onsets: &[Onset],
    bpm: f32,
    phase: f64,
    duration: f64,
    confidence_threshold: f32,
) -> Vec<Beat> {
    let grid = beat_grid(bpm, phase, duration);
    if grid.is_empty() || onsets.is_empty() {
        return vec![];
    }

    let beat_interval = 60.0 / bpm as f64;
    let tolerance = 0.25 * beat_interval;

    let n = onsets.len();
    let m = grid.len();
    // dp[i][j] = best cumulative score aligning first i onsets to first j grid slots
    let mut dp = vec![vec![f32::MIN / 2.0; m + 1]; n + 1];
    let mut choice = vec![vec![false; m + 1]; n + 1];
    for row in dp.iter_mut() {
        row[0] = 0.0;
    }
    for j in 0..=m {
        dp[0][j] = 0.0;
    }

    for i in 1..=n {
        for j in 1..=m {
            let skip = dp[i - 1][j];

            let onset = &onsets[i - 1];
            let dt = (onset.time - grid[j - 1]).abs();
            let align_score = if dt <= tolerance {
                let mut score = 0.5 * onset.strength + 0.3 * (1.0 - dt / tolerance) as f32
                    + 0.2 * onset.confidence;
                if onset.confidence < confidence_threshold {
                    score *= 0.5;
                }
                dp[i - 1][j - 1] + score
            } else {
                f32::MIN / 2.0
            };

            if align_score > skip {
                dp[i][j] = align_score;
                choice[i][j] = true;
            } else {
                dp[i][j] = skip;
                choice[i][j] = false;
            }
        }
    }

    // backtrack from the best column at row n
    let mut best_j = 0;
    let mut best_score = f32::MIN;
    for j in 0..=m {
        if dp[n][j] > best_score {
            best_score = dp[n][j];
            best_j = j;
        }
    }

    let mut aligned: Vec<(usize, usize)> = Vec::new();
    let (mut i, mut j) = (n, best_j);
    while i > 0 && j > 0 {
        if choice[i][j] {
            aligned.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else {
            i -= 1;
        }
    }
    aligned.reverse();

    aligned
        .into_iter()
        .enumerate()
        .map(|(k, (onset_idx, grid_idx))| {
            let onset = &onsets[onset_idx];
            // Combined phase-alignment rule: blend onset time toward grid.
            let aligned_time = 0.5 * onset.time + 0.5 * grid[grid_idx];
            Beat {
                timestamp_ms: aligned_time * 1000.0,
                strength: onset.strength,
                confidence: onset.confidence,
                classification: None,
                context: Some(BeatContext {
                    beat_number: Some(k as u32),
                    measure_number: None,
                    phase: None,
                    synthetic: false,
                }),
            }
        })
        .collect()
}

/// Template fallback: for each grid position, pick the best onset within
/// `0.35 * beat_interval`, or interpolate a synthetic beat.
pub fn track_beats_template(
    onsets: &[Onset],
    bpm: f32,
    phase: f64,
    duration: f64,
    tempo_confidence: f32,
    allow_synthetic: bool,
) -> Vec<Beat> {
    let grid = beat_grid(bpm, phase, duration);
    if grid.is_empty() {
        return vec![];
    }
    let beat_interval = 60.0 / bpm as f64;
    let window = 0.35 * beat_interval;

    let mut beats = Vec::with_capacity(grid.len());
    for (idx, &t) in grid.iter().enumerate() {
        let best = onsets
            .iter()
            .filter(|o| (o.time - t).abs() <= window)
            .max_by(|a, b| {
                score(a, t, window)
                    .partial_cmp(&score(b, t, window))
                    .unwrap()
            });

        match best {
            Some(onset) => beats.push(Beat {
                timestamp_ms: onset.time * 1000.0,
                strength: onset.strength,
                confidence: onset.confidence,
                classification: None,
                context: Some(BeatContext {
                    beat_number: Some(idx as u32),
                    measure_number: None,
                    phase: None,
                    synthetic: false,
                }),
            }),
            None if allow_synthetic => beats.push(Beat {
                timestamp_ms: t * 1000.0,
                strength: 0.2,
                confidence: tempo_confidence * 0.3,
                classification: None,
                context: Some(BeatContext {
                    beat_number: Some(idx as u32),
                    measure_number: None,
                    phase: None,
                    synthetic: true,
                }),
            }),
            None => {}
        }
    }
    beats
}

fn score(onset: &Onset, grid_time: f64, window: f64) -> f32 {
    let delta = (onset.time - grid_time).abs();
    0.5 * (1.0 - (delta / window) as f32) + 0.3 * onset.strength + 0.2 * onset.confidence
}

/// Post-process: enforce minimum spacing `0.7 * beat_interval`, dropping
/// the weaker of any colliding pair.
pub fn enforce_spacing(mut beats: Vec<Beat>, bpm: f32) -> Vec<Beat> {
    if beats.is_empty() || bpm <= 0.0 {
        return beats;
    }
    beats.sort_by(|a, b| a.timestamp_ms.partial_cmp(&b.timestamp_ms).unwrap());
    let min_spacing_ms = 0.7 * 60_000.0 / bpm as f64;

    let mut kept: Vec<Beat> = Vec::with_capacity(beats.len());
    for beat in beats.drain(..) {
        if let Some(last) = kept.last() {
            if beat.timestamp_ms - last.timestamp_ms < min_spacing_ms {
                if beat.strength > last.strength {
                    kept.pop();
                    kept.push(beat);
                }
                continue;
            }
        }
        kept.push(beat);
    }
    kept
}

/// Re-estimate local tempo every 4 beats from the median inter-beat
/// interval, smoothing `0.9*old + 0.1*new`, and boost confidence by 1.1x
/// wherever the local estimate agrees with `global_bpm` within 10%
/// (spec.md §4.4 "variable-tempo option").
pub fn apply_variable_tempo(mut beats: Vec<Beat>, global_bpm: f32) -> Vec<Beat> {
    if beats.len() < 4 || global_bpm <= 0.0 {
        return beats;
    }

    let mut local_bpm = global_bpm;
    let mut i = 4;
    while i <= beats.len() {
        let group = &beats[i - 4..i];
        let mut intervals: Vec<f64> = group
            .windows(2)
            .map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms)
            .collect();
        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap());

        if let Some(&median_ms) = intervals.get(intervals.len() / 2) {
            if median_ms > 0.0 {
                let local_bpm_new = (60_000.0 / median_ms) as f32;
                local_bpm = 0.9 * local_bpm + 0.1 * local_bpm_new;
            }
        }

        if (local_bpm - global_bpm).abs() / global_bpm < 0.1 {
            for beat in beats[i - 4..i].iter_mut() {
                beat.confidence = (beat.confidence * 1.1).min(1.0);
            }
        }

        i += 4;
    }

    beats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_onsets(bpm: f32, n_beats: usize) -> Vec<Onset> {
        let interval = 60.0 / bpm as f64;
        (0..n_beats)
            .map(|i| Onset {
                time: i as f64 * interval,
                strength: 0.8,
                confidence: 0.9,
            })
            .collect()
    }

    #[test]
    fn dp_aligns_beats_to_onsets() {
        let onsets = click_onsets(120.0, 8);
        let beats = track_beats_dp(&onsets, 120.0, 0.0, 4.0, 0.5);
        assert!(!beats.is_empty());
        for pair in beats.windows(2) {
            assert!(pair[1].timestamp_ms > pair[0].timestamp_ms);
        }
    }

    #[test]
    fn template_fills_synthetic_gaps() {
        let onsets = vec![Onset {
            time: 0.0,
            strength: 0.8,
            confidence: 0.9,
        }];
        let beats = track_beats_template(&onsets, 120.0, 0.0, 2.0, 0.8, true);
        assert!(beats.iter().any(|b| b.context.unwrap().synthetic));
    }

    #[test]
    fn spacing_enforced() {
        let beats = vec![
            Beat {
                timestamp_ms: 0.0,
                strength: 0.5,
                confidence: 0.5,
                classification: None,
                context: None,
            },
            Beat {
                timestamp_ms: 10.0,
                strength: 0.9,
                confidence: 0.5,
                classification: None,
                context: None,
            },
        ];
        let out = enforce_spacing(beats, 120.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].strength, 0.9);
    }

    #[test]
    fn variable_tempo_boosts_confidence_when_steady() {
        let onsets = click_onsets(120.0, 12);
        let beats = track_beats_dp(&onsets, 120.0, 0.0, 6.0, 0.5);
        let boosted = apply_variable_tempo(beats.clone(), 120.0);
        assert_eq!(boosted.len(), beats.len());
        for (original, after) in beats.iter().zip(boosted.iter()) {
            assert!(after.confidence >= original.confidence);
            assert!(after.confidence <= 1.0);
        }
    }

    #[test]
    fn variable_tempo_is_a_no_op_below_four_beats() {
        let beats = vec![Beat {
            timestamp_ms: 0.0,
            strength: 0.5,
            confidence: 0.5,
            classification: None,
            context: None,
        }];
        let out = apply_variable_tempo(beats.clone(), 120.0);
        assert_eq!(out.len(), beats.len());
        assert_eq!(out[0].confidence, beats[0].confidence);
    }
}
