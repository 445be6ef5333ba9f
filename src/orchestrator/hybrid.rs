//! Hybrid detector (spec.md §4.6 step 4): runs onset detection and tempo
//! tracking, aligns onsets to the tempo grid, and merges everything into a
//! single tagged candidate pool.

use crate::config::ParseConfig;
use crate::error::Result;
use crate::onset::{self, OnsetMethod};
use crate::tempo;
use crate::types::{Beat, BeatCandidate, BeatContext, CandidateSource, Onset, Tempo};

const MERGE_WINDOW_MS: f64 = 30.0;

pub fn detect(samples: &[f32], config: &ParseConfig) -> Result<(Vec<BeatCandidate>, Tempo)> {
    let (_onset_function, onsets) = onset::detect_onsets(
        samples,
        config.sample_rate,
        config.frame_size,
        config.hop_size,
        OnsetMethod::Combined,
        config.min_onset_spacing,
    )?;

    let (tempo, _rhythm_function) = tempo::track_tempo(
        samples,
        config.sample_rate,
        config.min_bpm,
        config.max_bpm,
        config.multi_pass,
    )?;

    let duration = samples.len() as f64 / config.sample_rate as f64;
    let tempo_beats = tempo::track_beats(
        &onsets,
        &tempo,
        duration,
        config.confidence_threshold,
        true,
        config.variable_tempo,
    );

    let onset_candidates: Vec<BeatCandidate> = onsets
        .iter()
        .map(|o| onset_to_candidate(o))
        .collect();

    let candidates = merge(onset_candidates, tempo_beats);
    Ok((candidates, tempo))
}

fn onset_to_candidate(onset: &Onset) -> BeatCandidate {
    BeatCandidate {
        beat: Beat {
            timestamp_ms: onset.time * 1000.0,
            strength: onset.strength,
            confidence: onset.confidence,
            classification: None,
            context: None,
        },
        source: CandidateSource::Onset,
    }
}

/// Merge onset- and tempo-derived beats: pairs within `MERGE_WINDOW_MS`
/// collapse into one `Hybrid`-tagged candidate with boosted confidence.
fn merge(onset_candidates: Vec<BeatCandidate>, tempo_beats: Vec<Beat>) -> Vec<BeatCandidate> {
    let mut used_onsets = vec![false; onset_candidates.len()];
    let mut out = Vec::with_capacity(onset_candidates.len() + tempo_beats.len());

    for tempo_beat in tempo_beats {
        let closest = onset_candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| !used_onsets[*i])
            .min_by(|(_, a), (_, b)| {
                (a.beat.timestamp_ms - tempo_beat.timestamp_ms)
                    .abs()
                    .partial_cmp(&(b.beat.timestamp_ms - tempo_beat.timestamp_ms).abs())
                    .unwrap()
            });

        match closest {
            Some((idx, onset_candidate))
                if (onset_candidate.beat.timestamp_ms - tempo_beat.timestamp_ms).abs()
                    <= MERGE_WINDOW_MS =>
            {
                used_onsets[idx] = true;
                out.push(BeatCandidate {
                    beat: Beat {
                        timestamp_ms: tempo_beat.timestamp_ms,
                        strength: onset_candidate.beat.strength.max(tempo_beat.strength),
                        confidence: (onset_candidate.beat.confidence + tempo_beat.confidence) / 2.0
                            * 1.1,
                        classification: tempo_beat.classification,
                        context: tempo_beat.context.or(Some(BeatContext::default())),
                    },
                    source: CandidateSource::Hybrid,
                });
            }
            _ => {
                out.push(BeatCandidate {
                    beat: tempo_beat,
                    source: CandidateSource::Tempo,
                });
            }
        }
    }

    for (idx, candidate) in onset_candidates.into_iter().enumerate() {
        if !used_onsets[idx] {
            out.push(candidate);
        }
    }

    out.sort_by(|a, b| a.beat.timestamp_ms.partial_cmp(&b.beat.timestamp_ms).unwrap());
    out
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
    fn detect_yields_candidates_for_click_track() {
        let samples = click_track(44_100, 120.0, 6.0);
        let config = ParseConfig::default();
        let (candidates, tempo) = detect(&samples, &config).unwrap();
        assert!(!candidates.is_empty());
        assert!((tempo.bpm - 120.0).abs() < 20.0);
    }

    #[test]
    fn silence_yields_no_candidates() {
        let samples = vec![0.0f32; 44_100 * 2];
        let config = ParseConfig::default();
        let (candidates, _) = detect(&samples, &config).unwrap();
        assert!(candidates.is_empty());
    }
}
