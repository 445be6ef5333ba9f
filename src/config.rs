use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BeatParserError, ConfigError, Result};
use crate::selector::SelectionStrategy;

/// Immutable analysis configuration shared by every stage of the pipeline.
///
/// A `ParseConfig` is consumed by value at construction time; there is no
/// setter. [`crate::orchestrator::BeatParser`] freezes its configuration the
/// moment the first parse begins, so any attempt to swap it afterwards is
/// rejected rather than silently accepted (see
/// [`crate::orchestrator::BeatParser::parse_buffer`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Sample rate all buffers passed to this instance are assumed to use.
    pub sample_rate: u32,

    /// FFT analysis window size; must be a power of two.
    pub frame_size: usize,

    /// Stride between frames; must be <= frame_size.
    pub hop_size: usize,

    pub min_bpm: f32,
    pub max_bpm: f32,

    /// Fusion weight for the onset-derived candidates, in [0, 1].
    pub onset_weight: f32,
    /// Fusion weight for the tempo-grid-derived candidates, in [0, 1].
    pub tempo_weight: f32,
    /// Fusion weight for the spectral-feature-derived candidates, in [0, 1].
    pub spectral_weight: f32,

    /// Re-run detection at a second, coarser resolution and merge.
    pub multi_pass: bool,
    /// Adjust musical-prior weighting based on estimated genre tempo bands.
    pub genre_adaptive: bool,
    /// Track local tempo drift across the beat grid instead of assuming a
    /// single fixed bpm for the whole buffer.
    pub variable_tempo: bool,

    /// Global minimum confidence accepted into the final beat list.
    pub confidence_threshold: f32,

    pub preprocessing: PreprocessingConfig,
    pub output: OutputConfig,

    /// Minimum spacing between consecutive onsets/beats, in seconds.
    pub min_onset_spacing: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Normalize peak amplitude to 1.0 before analysis.
    pub normalize: bool,
    /// Apply an 80 Hz high-pass filter before analysis.
    pub high_pass: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            high_pass: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Include per-stage spectral features in the result metadata.
    pub include_spectral_features: bool,
    /// Include the selection quality block in the result metadata.
    pub include_quality_metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_spectral_features: false,
            include_quality_metrics: true,
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frame_size: 1024,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            onset_weight: 0.35,
            tempo_weight: 0.35,
            spectral_weight: 0.30,
            multi_pass: false,
            genre_adaptive: true,
            variable_tempo: false,
            confidence_threshold: 0.5,
            preprocessing: PreprocessingConfig::default(),
            output: OutputConfig::default(),
            min_onset_spacing: 0.050,
        }
    }
}

impl ParseConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| {
            BeatParserError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            })
        })?;

        let config: ParseConfig = toml::from_str(&content).map_err(|_| {
            BeatParserError::Config(ConfigError::ParseFailed {
                path: path.display().to_string(),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            BeatParserError::Config(ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration parameters (spec.md §4.7 / §7 InvalidConfig).
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::OutOfRange {
                name: "sample_rate".into(),
                value: self.sample_rate.to_string(),
            }
            .into());
        }

        if self.frame_size == 0 || !self.frame_size.is_power_of_two() {
            return Err(ConfigError::OutOfRange {
                name: "frame_size".into(),
                value: self.frame_size.to_string(),
            }
            .into());
        }

        if self.hop_size == 0 || self.hop_size > self.frame_size {
            return Err(ConfigError::HopExceedsFrame {
                hop: self.hop_size,
                frame: self.frame_size,
            }
            .into());
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(ConfigError::BpmRangeInverted {
                min: self.min_bpm,
                max: self.max_bpm,
            }
            .into());
        }

        for (name, value) in [
            ("onset_weight", self.onset_weight),
            ("tempo_weight", self.tempo_weight),
            ("spectral_weight", self.spectral_weight),
            ("confidence_threshold", self.confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange {
                    name: name.to_string(),
                    value,
                }
                .into());
            }
        }

        if self.min_onset_spacing < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "min_onset_spacing".into(),
                value: self.min_onset_spacing.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Per-call options for a single parse (spec.md §6).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub target_count: usize,
    pub selection_strategy: SelectionStrategy,
    pub min_confidence: f32,
    pub chunk_size: Option<usize>,
    pub overlap_fraction: f32,
    pub filename: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            target_count: 10,
            selection_strategy: SelectionStrategy::Adaptive,
            min_confidence: 0.5,
            chunk_size: None,
            overlap_fraction: 0.1,
            filename: None,
        }
    }
}

impl ParseOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::WeightOutOfRange {
                name: "min_confidence".into(),
                value: self.min_confidence,
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.overlap_fraction) {
            return Err(ConfigError::WeightOutOfRange {
                name: "overlap_fraction".into(),
                value: self.overlap_fraction,
            }
            .into());
        }
        Ok(())
    }
}
