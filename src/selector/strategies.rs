//! Concrete selection strategies: energy, regular, musical (spec.md §4.5).
//! Adaptive lives in [`crate::selector::dp`]; this module also exposes the
//! adaptive subscore functions dp.rs composes into a total score.

use crate::types::{BeatCandidate, BeatClass};

/// Default weights for the adaptive strategy's (energy, regular, musical)
/// subscores; context is always weighted 0.1 on top.
pub const ADAPTIVE_WEIGHTS: (f32, f32, f32) = (0.3, 0.3, 0.4);

pub fn select_energy(candidates: &[&BeatCandidate], target: usize) -> Vec<BeatCandidate> {
    let mut sorted: Vec<&&BeatCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| b.beat.strength.partial_cmp(&a.beat.strength).unwrap());
    sorted
        .into_iter()
        .take(target)
        .map(|c| (*c).clone())
        .collect()
}

pub fn select_regular(
    candidates: &[&BeatCandidate],
    target: usize,
    duration: f64,
) -> Vec<BeatCandidate> {
    if target == 0 || candidates.is_empty() || duration <= 0.0 {
        return vec![];
    }
    let mut remaining: Vec<&BeatCandidate> = candidates.to_vec();
    let mut out = Vec::with_capacity(target);

    for i in 0..target {
        let target_time_ms = (i as f64 * duration * 1000.0 / target as f64) as f64;
        if remaining.is_empty() {
            break;
        }
        let (idx, _) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.beat.timestamp_ms - target_time_ms)
                    .abs()
                    .partial_cmp(&(b.beat.timestamp_ms - target_time_ms).abs())
                    .unwrap()
            })
            .unwrap();
        out.push(remaining.remove(idx).clone());
    }
    out
}

pub fn select_musical(
    candidates: &[&BeatCandidate],
    target: usize,
    duration: f64,
) -> Vec<BeatCandidate> {
    let mut scored: Vec<(f32, &BeatCandidate)> = candidates
        .iter()
        .map(|c| (musical_subscore(c, candidates, duration), *c))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
    scored.into_iter().take(target).map(|(_, c)| c.clone()).collect()
}

/// Musical subscore in roughly [0, 1]: tempo-grid alignment proxy (via
/// `beat_number`), downbeat/backbeat role bonus, and local prominence.
pub fn musical_subscore(candidate: &BeatCandidate, all: &[&BeatCandidate], _duration: f64) -> f32 {
    let context = candidate.beat.context;
    let beat_number = context.and_then(|c| c.beat_number);

    let alignment = if context.is_some() { 0.2 } else { 0.0 };

    let role_bonus = match (beat_number, candidate.beat.classification) {
        (_, Some(BeatClass::Downbeat)) => 0.2,
        (Some(n), _) if n % 4 == 0 => 0.2,
        (_, Some(BeatClass::Offbeat)) => 0.1,
        (Some(n), _) if n % 4 == 1 || n % 4 == 3 => 0.1,
        _ => 0.0,
    };

    let prominence = local_prominence(candidate, all, 1000.0);

    (0.5 + alignment + role_bonus + 0.2 * prominence).clamp(0.0, 1.5)
}

/// Candidate strength relative to the mean strength of neighbors within
/// `window_ms` milliseconds, clamped to [0, 1].
pub fn local_prominence(candidate: &BeatCandidate, all: &[&BeatCandidate], window_ms: f64) -> f32 {
    let neighbors: Vec<f32> = all
        .iter()
        .filter(|c| {
            (c.beat.timestamp_ms - candidate.beat.timestamp_ms).abs() <= window_ms
                && !std::ptr::eq(**c, candidate)
        })
        .map(|c| c.beat.strength)
        .collect();

    if neighbors.is_empty() {
        return 0.5;
    }
    let mean = neighbors.iter().sum::<f32>() / neighbors.len() as f32;
    if mean <= 0.0 {
        return 0.5;
    }
    (candidate.beat.strength / (mean + candidate.beat.strength)).clamp(0.0, 1.0)
}

/// Isolation: how few neighbors a candidate has within 500ms, in [0, 1].
pub fn isolation(candidate: &BeatCandidate, all: &[&BeatCandidate]) -> f32 {
    let count = all
        .iter()
        .filter(|c| {
            (c.beat.timestamp_ms - candidate.beat.timestamp_ms).abs() <= 500.0
                && !std::ptr::eq(**c, candidate)
        })
        .count();
    (1.0 - count as f32 / 5.0).max(0.0)
}
