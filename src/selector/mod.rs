//! Beat selection (spec.md §4.5): reduce a merged candidate pool to a
//! target-size ordered set under quality and spacing criteria.

mod dp;
mod quality;
mod strategies;

pub use quality::compute_quality;

use crate::types::{Beat, BeatCandidate};

/// Beat selection strategy. A closed enumeration (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    Energy,
    Regular,
    Musical,
    /// Combined DP selection over four subscores. The default strategy.
    Adaptive,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::Adaptive
    }
}

/// Select `target_count` beats from `candidates` using `strategy`.
///
/// `duration` is the audio length in seconds, used by the regular/adaptive
/// strategies' time-based scoring.
pub fn select_beats(
    candidates: &[BeatCandidate],
    strategy: SelectionStrategy,
    target_count: usize,
    min_confidence: f32,
    duration: f64,
) -> (Vec<Beat>, crate::types::SelectionQuality) {
    let filtered: Vec<&BeatCandidate> = candidates
        .iter()
        .filter(|c| c.beat.confidence >= min_confidence)
        .collect();

    let selected = match strategy {
        SelectionStrategy::Energy => strategies::select_energy(&filtered, target_count),
        SelectionStrategy::Regular => strategies::select_regular(&filtered, target_count, duration),
        SelectionStrategy::Musical => strategies::select_musical(&filtered, target_count, duration),
        SelectionStrategy::Adaptive => {
            dp::select_adaptive(&filtered, target_count, duration, strategies::ADAPTIVE_WEIGHTS)
        }
    };

    let mut beats: Vec<Beat> = selected.into_iter().map(|c| c.beat.clone()).collect();
    beats.sort_by(|a, b| a.timestamp_ms.partial_cmp(&b.timestamp_ms).unwrap());

    let quality = quality::compute_quality(&beats, duration, target_count);
    (beats, quality)
}
