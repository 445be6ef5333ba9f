//! Orchestrator (spec.md §4.6): composes onset detection, tempo tracking,
//! and beat selection into the public `parse_*` entry points. The only
//! component aware of plugins and streaming.

pub mod hybrid;
pub mod plugin;
pub mod stream;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::config::{ParseConfig, ParseOptions};
use crate::error::{AudioError, BeatParserError, Result};
use crate::selector::select_beats;
use crate::signal::{apply_filter, FilterKind};
use crate::types::{ParseMetadata, ParseResult, PluginInfo};

pub use plugin::Plugin;
pub use stream::{Stage, StreamProgress};

/// File extensions recognized at the `parse_file` entry point. Only `.wav`
/// is actually decoded here (spec.md §6 "decoding boundary"); the rest are
/// recognized but rejected with `UnsupportedExtension`.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a"];

/// The hybrid beat detector. Holds an immutable configuration snapshot and
/// a plugin list, both frozen the moment the first parse begins (spec.md
/// §4.7, §9 "Configuration immutability").
pub struct BeatParser {
    config: ParseConfig,
    plugins: Vec<Box<dyn Plugin>>,
    frozen: AtomicBool,
}

impl BeatParser {
    pub fn new(config: ParseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            plugins: Vec::new(),
            frozen: AtomicBool::new(false),
        })
    }

    /// Register a plugin. Fails once a parse is in flight.
    pub fn add_plugin(&mut self, mut plugin: Box<dyn Plugin>) -> Result<()> {
        if self.frozen.load(Ordering::SeqCst) {
            return Err(crate::error::ConfigError::Frozen.into());
        }
        plugin
            .initialize()
            .map_err(|e| BeatParserError::PluginFailure {
                plugin: plugin.name().to_string(),
                reason: e.to_string(),
            })?;
        self.plugins.push(plugin);
        Ok(())
    }

    fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn supported_extensions() -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    /// Parse a single in-memory buffer (spec.md §4.6 steps 1-7).
    pub async fn parse_buffer(&self, samples: &[f32], options: &ParseOptions) -> Result<ParseResult> {
        self.freeze();
        if samples.is_empty() {
            return Err(BeatParserError::Audio(AudioError::Empty));
        }
        options.validate()?;
        let started = std::time::Instant::now();

        info!(samples = samples.len(), "starting parse_buffer");

        let preprocessed = self.preprocess(samples)?;

        let mut audio = preprocessed;
        for plugin in &self.plugins {
            audio = plugin
                .transform_audio(audio)
                .map_err(|e| BeatParserError::PluginFailure {
                    plugin: plugin.name().to_string(),
                    reason: e.to_string(),
                })?;
        }

        let (mut candidates, tempo) = hybrid::detect(&audio, &self.config)?;
        debug!(count = candidates.len(), "merged beat candidates");

        for plugin in &self.plugins {
            candidates = plugin
                .transform_candidates(candidates)
                .map_err(|e| BeatParserError::PluginFailure {
                    plugin: plugin.name().to_string(),
                    reason: e.to_string(),
                })?;
        }

        let duration = audio.len() as f64 / self.config.sample_rate as f64;
        let (beats, quality) = select_beats(
            &candidates,
            options.selection_strategy,
            options.target_count,
            options.min_confidence,
            duration,
        );

        info!(selected = beats.len(), bpm = tempo.bpm, "parse_buffer complete");

        Ok(ParseResult {
            version: Self::version().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            beats,
            tempo: Some(tempo),
            metadata: ParseMetadata {
                processing_ms: started.elapsed().as_secs_f64() * 1000.0,
                samples_processed: audio.len(),
                audio_length_seconds: duration,
                sample_rate: self.config.sample_rate,
                algorithms_used: vec!["combined_onset".into(), "autocorrelation_tempo".into()],
                plugins_used: self
                    .plugins
                    .iter()
                    .map(|p| PluginInfo {
                        name: p.name().to_string(),
                        version: p.version().to_string(),
                    })
                    .collect(),
                parameters: Default::default(),
                chunks: None,
                analysis: if self.config.output.include_quality_metrics {
                    Some(quality)
                } else {
                    None
                },
            },
        })
    }

    /// Parse a stream of fixed-size chunks (spec.md §4.6 "Streaming").
    pub async fn parse_stream(
        &self,
        chunks: tokio::sync::mpsc::Receiver<Vec<f32>>,
        options: &ParseOptions,
        progress: Option<tokio::sync::mpsc::Sender<StreamProgress>>,
    ) -> Result<ParseResult> {
        self.freeze();
        options.validate()?;
        stream::run(chunks, &self.config, options, &self.plugins, progress).await
    }

    /// Parse a WAV file from disk (spec.md §6 parse_file, WAV path only).
    pub async fn parse_file(
        &self,
        path: &std::path::Path,
        options: &ParseOptions,
    ) -> Result<ParseResult> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if extension != "wav" {
            if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                return Err(BeatParserError::Format(
                    crate::error::FormatError::UnsupportedExtension { extension },
                ));
            }
            return Err(BeatParserError::FileNotFound(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|_| BeatParserError::FileNotFound(path.display().to_string()))?;
        let decoded = crate::wav::decode(&bytes)?;

        let mut opts = options.clone();
        opts.filename = Some(path.display().to_string());
        self.parse_buffer(&decoded.samples, &opts).await
    }

    fn preprocess(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let mut out = samples.to_vec();

        if self.config.preprocessing.normalize {
            let peak = out.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
            if peak > 1e-9 {
                for s in out.iter_mut() {
                    *s /= peak;
                }
            }
        }

        if self.config.preprocessing.high_pass {
            out = apply_filter(&out, FilterKind::HighPass, 80.0, self.config.sample_rate, 2)?;
        }

        Ok(out)
    }
}

impl Drop for BeatParser {
    /// Run every registered plugin's teardown hook once, at instance
    /// drop (spec.md §9 plugin lifecycle).
    fn drop(&mut self) {
        for plugin in &mut self.plugins {
            if let Err(e) = plugin.finalize() {
                tracing::warn!(plugin = plugin.name(), error = %e, "plugin finalize failed");
            }
        }
    }
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

    #[tokio::test]
    async fn parse_buffer_respects_target_count() {
        let parser = BeatParser::new(ParseConfig::default()).unwrap();
        let samples = click_track(44_100, 120.0, 8.0);
        let mut options = ParseOptions::default();
        options.target_count = 5;
        let result = parser.parse_buffer(&samples, &options).await.unwrap();
        assert!(result.beats.len() <= 5);
    }

    #[tokio::test]
    async fn empty_buffer_is_rejected() {
        let parser = BeatParser::new(ParseConfig::default()).unwrap();
        let options = ParseOptions::default();
        let result = parser.parse_buffer(&[], &options).await;
        assert!(matches!(
            result,
            Err(BeatParserError::Audio(crate::error::AudioError::Empty))
        ));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let parser = BeatParser::new(ParseConfig::default()).unwrap();
        let options = ParseOptions::default();
        let result = parser
            .parse_file(std::path::Path::new("track.mp3"), &options)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn version_and_extensions_are_static() {
        assert!(!BeatParser::version().is_empty());
        assert!(BeatParser::supported_extensions().contains(&"wav"));
    }

    #[test]
    fn dropping_the_parser_finalizes_every_plugin() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        struct Tracked(Arc<AtomicBool>);
        impl Plugin for Tracked {
            fn name(&self) -> &str {
                "tracked"
            }
            fn finalize(&mut self) -> Result<()> {
                self.0.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let finalized = Arc::new(AtomicBool::new(false));
        let mut parser = BeatParser::new(ParseConfig::default()).unwrap();
        parser.add_plugin(Box::new(Tracked(finalized.clone()))).unwrap();

        drop(parser);
        assert!(finalized.load(Ordering::SeqCst));
    }
}
