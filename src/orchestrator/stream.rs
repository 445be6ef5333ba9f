//! Streaming/chunked driver (spec.md §4.6 "Streaming"): consumes chunks
//! from a pull-based producer, maintains an overlap tail, and dedups beats
//! detected twice across a chunk boundary.

use tokio::sync::mpsc::Receiver;

use crate::config::{ParseConfig, ParseOptions};
use crate::error::{BeatParserError, Result};
use crate::orchestrator::hybrid;
use crate::orchestrator::plugin::Plugin;
use crate::selector::select_beats;
use crate::types::{BeatCandidate, ParseMetadata, ParseResult, PluginInfo};

/// Progress reported between chunks (spec.md §6 worker progress messages).
#[derive(Debug, Clone, Copy)]
pub struct StreamProgress {
    pub samples_processed: usize,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Onset,
    Tempo,
    Beat,
    Select,
    Finalize,
}

pub async fn run(
    mut chunks: Receiver<Vec<f32>>,
    config: &ParseConfig,
    options: &ParseOptions,
    plugins: &[Box<dyn Plugin>],
    mut progress: Option<tokio::sync::mpsc::Sender<StreamProgress>>,
) -> Result<ParseResult> {
    let chunk_target = options.chunk_size.unwrap_or(config.sample_rate as usize);
    let overlap = (chunk_target as f32 * options.overlap_fraction).ceil() as usize;

    let mut tail: Vec<f32> = Vec::new();
    let mut sample_offset: usize = 0;
    let mut all_candidates: Vec<BeatCandidate> = Vec::new();
    let mut total_samples: usize = 0;
    let mut chunk_count: usize = 0;
    let mut last_tempo = None;

    let mut received_any = false;
    while let Some(chunk) = chunks.recv().await {
        received_any = true;
        chunk_count += 1;

        let mut buffer = tail.clone();
        buffer.extend_from_slice(&chunk);

        let transformed = apply_audio_plugins(buffer, plugins)?;

        let (candidates, tempo) = hybrid::detect(&transformed, config)?;
        last_tempo = Some(tempo);

        for candidate in candidates {
            let shifted_ms = candidate.beat.timestamp_ms + (sample_offset as f64 * 1000.0
                / config.sample_rate as f64);
            let mut shifted = candidate;
            shifted.beat.timestamp_ms = shifted_ms;
            all_candidates.push(shifted);
        }

        sample_offset += chunk.len();
        total_samples += chunk.len();

        tail = if transformed.len() >= overlap {
            transformed[transformed.len() - overlap..].to_vec()
        } else {
            transformed
        };

        if let Some(tx) = &mut progress {
            let _ = tx
                .send(StreamProgress {
                    samples_processed: sample_offset,
                    stage: Stage::Beat,
                })
                .await;
        }
    }

    if !received_any {
        return Err(BeatParserError::StreamAborted(
            "producer terminated before any samples arrived".into(),
        ));
    }

    let deduped = dedup_overlap(all_candidates);
    let transformed_candidates = apply_candidate_plugins(deduped, plugins)?;

    let duration = total_samples as f64 / config.sample_rate as f64;
    let (beats, quality) = select_beats(
        &transformed_candidates,
        options.selection_strategy,
        options.target_count,
        options.min_confidence,
        duration,
    );

    Ok(ParseResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        beats,
        tempo: last_tempo,
        metadata: ParseMetadata {
            processing_ms: 0.0,
            samples_processed: total_samples,
            audio_length_seconds: duration,
            sample_rate: config.sample_rate,
            algorithms_used: vec!["combined_onset".into(), "autocorrelation_tempo".into()],
            plugins_used: plugins
                .iter()
                .map(|p| PluginInfo {
                    name: p.name().to_string(),
                    version: p.version().to_string(),
                })
                .collect(),
            parameters: Default::default(),
            chunks: Some(chunk_count),
            analysis: if config.output.include_quality_metrics {
                Some(quality)
            } else {
                None
            },
        },
    })
}

fn apply_audio_plugins(mut samples: Vec<f32>, plugins: &[Box<dyn Plugin>]) -> Result<Vec<f32>> {
    for plugin in plugins {
        samples = plugin
            .transform_audio(samples)
            .map_err(|e| BeatParserError::PluginFailure {
                plugin: plugin.name().to_string(),
                reason: e.to_string(),
            })?;
    }
    Ok(samples)
}

fn apply_candidate_plugins(
    mut candidates: Vec<BeatCandidate>,
    plugins: &[Box<dyn Plugin>],
) -> Result<Vec<BeatCandidate>> {
    for plugin in plugins {
        candidates = plugin
            .transform_candidates(candidates)
            .map_err(|e| BeatParserError::PluginFailure {
                plugin: plugin.name().to_string(),
                reason: e.to_string(),
            })?;
    }
    Ok(candidates)
}

/// Drop the weaker of any pair of candidates within 50ms of each other,
/// the fixed overlap-dedup minimum (spec.md §9 open question).
fn dedup_overlap(mut candidates: Vec<BeatCandidate>) -> Vec<BeatCandidate> {
    candidates.sort_by(|a, b| a.beat.timestamp_ms.partial_cmp(&b.beat.timestamp_ms).unwrap());

    let mut kept: Vec<BeatCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates.drain(..) {
        if let Some(last) = kept.last() {
            if candidate.beat.timestamp_ms - last.beat.timestamp_ms < 50.0 {
                if candidate.beat.confidence > last.beat.confidence {
                    kept.pop();
                    kept.push(candidate);
                }
                continue;
            }
        }
        kept.push(candidate);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn empty_stream_is_aborted() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let config = ParseConfig::default();
        let options = ParseOptions::default();
        let result = run(rx, &config, &options, &[], None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn streamed_chunks_produce_a_result() {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for _ in 0..4 {
                let chunk: Vec<f32> = (0..4096).map(|i| if i % 1000 < 50 { 0.8 } else { 0.0 }).collect();
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        });

        let config = ParseConfig::default();
        let mut options = ParseOptions::default();
        options.chunk_size = Some(4096);
        let result = run(rx, &config, &options, &[], None).await;
        assert!(result.is_ok());
    }
}
