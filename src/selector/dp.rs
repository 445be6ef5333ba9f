//! Adaptive selection: DP over (candidate, selected-count) with a minimum
//! spacing constraint (spec.md §4.5 "DP selection").

use crate::selector::strategies::{isolation, local_prominence, musical_subscore};
use crate::types::BeatCandidate;

/// Four subscores in [0, 1] (energy, regularity, musical, context) plus
/// the total weighted score for one candidate.
fn adaptive_score(
    candidate: &BeatCandidate,
    index: usize,
    all: &[&BeatCandidate],
    duration: f64,
    weights: (f32, f32, f32),
) -> f32 {
    let max_strength = all
        .iter()
        .map(|c| c.beat.strength)
        .fold(0.0f32, f32::max)
        .max(1e-9);

    let energy = ((candidate.beat.strength / max_strength) + candidate.beat.confidence) / 2.0;

    let regularity = if duration > 0.0 && all.len() > 1 {
        let position_frac = index as f32 / all.len().max(1) as f32;
        let time_frac = (candidate.beat.timestamp_ms / 1000.0 / duration) as f32;
        (1.0 - (position_frac - time_frac).abs() * 2.0).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let musical = musical_subscore(candidate, all, duration).clamp(0.0, 1.0);

    let prominence = local_prominence(candidate, all, 500.0);
    let neighbor_better = prominence < 0.5;
    let context = 0.5 + if neighbor_better { 0.2 } else { 0.0 } - 0.3 * isolation(candidate, all);

    weights.0 * energy + weights.1 * regularity + weights.2 * musical + 0.1 * context
}

/// Select up to `target` candidates via dynamic programming under a
/// minimum-spacing constraint of `0.3 * mean inter-candidate interval`.
pub fn select_adaptive(
    candidates: &[&BeatCandidate],
    target: usize,
    duration: f64,
    weights: (f32, f32, f32),
) -> Vec<BeatCandidate> {
    if candidates.is_empty() || target == 0 {
        return vec![];
    }

    let mut sorted: Vec<&BeatCandidate> = candidates.to_vec();
    sorted.sort_by(|a, b| a.beat.timestamp_ms.partial_cmp(&b.beat.timestamp_ms).unwrap());

    let n = sorted.len();
    let scores: Vec<f32> = sorted
        .iter()
        .enumerate()
        .map(|(i, c)| adaptive_score(c, i, &sorted, duration, weights))
        .collect();

    let mean_interval_ms = if n > 1 {
        (sorted[n - 1].beat.timestamp_ms - sorted[0].beat.timestamp_ms) / (n - 1) as f64
    } else {
        0.0
    };
    let min_spacing_ms = 0.3 * mean_interval_ms;

    // dp[i][j]: best score using first i candidates selecting j of them.
    // back[i][j]: (used_i, k) where k is the previous selected index + 1.
    let mut dp = vec![vec![f32::MIN / 2.0; target + 1]; n + 1];
    let mut take = vec![vec![false; target + 1]; n + 1];
    for row in dp.iter_mut() {
        row[0] = 0.0;
    }

    for i in 1..=n {
        for j in 1..=target.min(i) {
            let skip = dp[i - 1][j];

            // find the most recent selectable predecessor index k (1-based)
            // satisfying the spacing constraint against candidate i-1.
            let mut best_take = f32::MIN / 2.0;
            for k in (0..i - 1).rev() {
                if sorted[i - 1].beat.timestamp_ms - sorted[k].beat.timestamp_ms >= min_spacing_ms {
                    let candidate_score = dp[k + 1][j - 1] + scores[i - 1];
                    if candidate_score > best_take {
                        best_take = candidate_score;
                    }
                    break;
                }
            }
            if j == 1 {
                best_take = best_take.max(dp[0][0] + scores[i - 1]);
            }

            if best_take > skip {
                dp[i][j] = best_take;
                take[i][j] = true;
            } else {
                dp[i][j] = skip;
                take[i][j] = false;
            }
        }
    }

    let mut best_j = 0;
    for j in 0..=target {
        if dp[n][j] > dp[n][best_j] {
            best_j = j;
        }
    }

    let mut selected_indices = Vec::new();
    let (mut i, mut j) = (n, best_j);
    while i > 0 && j > 0 {
        if take[i][j] {
            selected_indices.push(i - 1);
            j -= 1;
            // move i to just before this candidate for the next lookup
            i -= 1;
        } else {
            i -= 1;
        }
    }
    selected_indices.reverse();

    let mut selected: Vec<BeatCandidate> = selected_indices.iter().map(|&idx| sorted[idx].clone()).collect();

    if selected.len() < target {
        let used: std::collections::HashSet<usize> = selected_indices.into_iter().collect();
        let mut remaining: Vec<(usize, f32)> = (0..n)
            .filter(|i| !used.contains(i))
            .map(|i| (i, scores[i]))
            .collect();
        remaining.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        for (idx, _) in remaining.into_iter().take(target - selected.len()) {
            selected.push(sorted[idx].clone());
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Beat, CandidateSource};

    fn candidate(ms: f64, strength: f32) -> BeatCandidate {
        BeatCandidate {
            beat: Beat {
                timestamp_ms: ms,
                strength,
                confidence: 0.8,
                classification: None,
                context: None,
            },
            source: CandidateSource::Onset,
        }
    }

    #[test]
    fn adaptive_selects_up_to_target() {
        let candidates: Vec<BeatCandidate> = (0..30).map(|i| candidate(i as f64 * 200.0, 0.5)).collect();
        let refs: Vec<&BeatCandidate> = candidates.iter().collect();
        let selected = select_adaptive(&refs, 10, 6.0, (0.3, 0.3, 0.4));
        assert!(selected.len() <= 10);
    }

    #[test]
    fn adaptive_pads_when_few_candidates() {
        let candidates: Vec<BeatCandidate> = (0..3).map(|i| candidate(i as f64 * 500.0, 0.5)).collect();
        let refs: Vec<&BeatCandidate> = candidates.iter().collect();
        let selected = select_adaptive(&refs, 5, 1.5, (0.3, 0.3, 0.4));
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn energy_only_weights_match_energy_strategy_ordering() {
        let candidates = vec![candidate(0.0, 0.1), candidate(1000.0, 0.9), candidate(2000.0, 0.3)];
        let refs: Vec<&BeatCandidate> = candidates.iter().collect();
        let selected = select_adaptive(&refs, 1, 3.0, (1.0, 0.0, 0.0));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].beat.strength, 0.9);
    }
}
