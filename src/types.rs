//! Core value types shared across the beat analysis pipeline.
//!
//! These are the "nouns" of the system: frames and spectra produced and
//! consumed by the signal primitives, onsets and tempo hypotheses produced
//! by the detection stages, and the beats/tempo/result types that outlive
//! a parse and are returned to the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A windowed slice of mono audio samples, as produced by the framer.
///
/// Owned exclusively by the stage that produced it; callers that need to
/// keep data past the current frame must copy what they need.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    /// Index of the frame's first sample in the original buffer.
    pub start_sample: usize,
}

/// A magnitude spectrum, optionally paired with phase, of length N/2.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub magnitudes: Vec<f32>,
    pub phases: Option<Vec<f32>>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// A per-frame onset detection function; sampling rate = audio rate / hop.
#[derive(Debug, Clone, Default)]
pub struct OnsetFunction {
    pub values: Vec<f32>,
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl OnsetFunction {
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    pub fn time_at(&self, index: usize) -> f64 {
        (index * self.hop_size) as f64 / self.sample_rate as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A detected onset: the beginning of a perceptible audio event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onset {
    /// Time in seconds, >= 0.
    pub time: f64,
    /// Non-negative onset strength.
    pub strength: f32,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

/// A single tempo hypothesis produced by autocorrelation analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoHypothesis {
    pub bpm: f32,
    pub confidence: f32,
    /// Phase in seconds, in [0, 60/bpm).
    pub phase: f64,
    pub strength: f32,
    pub autocorrelation_peak: f32,
}

/// Time signature: numerator/denominator describing beats per measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// The estimated tempo for a parse, with optional time signature/phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f32,
    pub confidence: f32,
    pub time_signature: Option<TimeSignature>,
    /// Beat grid phase offset in seconds, in [0, 60/bpm).
    pub phase: Option<f64>,
    pub alternatives: Option<Vec<TempoAlternative>>,
}

impl Tempo {
    /// The "no tempo found" default: 120 bpm, zero confidence.
    pub fn default_unknown() -> Self {
        Self {
            bpm: 120.0,
            confidence: 0.0,
            time_signature: None,
            phase: None,
            alternatives: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempoAlternative {
    pub bpm: f32,
    pub confidence: f32,
}

/// Classification of a beat's musical role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatClass {
    Downbeat,
    Beat,
    Offbeat,
    Syncopated,
}

/// Optional contextual metadata attached to a beat.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BeatContext {
    pub beat_number: Option<u32>,
    pub measure_number: Option<u32>,
    pub phase: Option<f32>,
    pub synthetic: bool,
}

/// A single detected and (possibly) selected beat.
///
/// Timestamp is in milliseconds, matching the canonical `ParseResult` shape
/// (spec.md §6); internal stages mostly work in seconds and convert at the
/// selector/orchestrator boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beat {
    pub timestamp_ms: f64,
    pub strength: f32,
    pub confidence: f32,
    pub classification: Option<BeatClass>,
    pub context: Option<BeatContext>,
}

impl Beat {
    pub fn time_seconds(&self) -> f64 {
        self.timestamp_ms / 1000.0
    }
}

/// Where a [`BeatCandidate`] originated from, before selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    Onset,
    Tempo,
    Spectral,
    Hybrid,
}

/// A tentative beat produced by a detector, before selection reduces the
/// candidate pool to the requested target count.
#[derive(Debug, Clone)]
pub struct BeatCandidate {
    pub beat: Beat,
    pub source: CandidateSource,
}

impl BeatCandidate {
    pub fn time_seconds(&self) -> f64 {
        self.beat.time_seconds()
    }
}

/// Quality metrics describing a completed beat selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionQuality {
    pub coverage: f32,
    pub diversity: f32,
    pub spacing: f32,
    pub overall: f32,
    pub beat_density: f32,
}

/// Metadata describing how a parse was executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub processing_ms: f64,
    pub samples_processed: usize,
    pub audio_length_seconds: f64,
    pub sample_rate: u32,
    pub algorithms_used: Vec<String>,
    pub plugins_used: Vec<PluginInfo>,
    pub parameters: HashMap<String, String>,
    pub chunks: Option<usize>,
    pub analysis: Option<SelectionQuality>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
}

/// Final result of a parse: ordered beats, optional tempo, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub version: String,
    pub timestamp: String,
    pub beats: Vec<Beat>,
    pub tempo: Option<Tempo>,
    pub metadata: ParseMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onset_function_frame_rate() {
        let of = OnsetFunction {
            values: vec![0.0; 10],
            hop_size: 256,
            sample_rate: 44_100,
        };
        assert!((of.frame_rate() - 172.265_6).abs() < 0.01);
    }

    #[test]
    fn time_signature_default_is_four_four() {
        let ts = TimeSignature::default();
        assert_eq!(ts.numerator, 4);
        assert_eq!(ts.denominator, 4);
    }

    #[test]
    fn beat_time_seconds_matches_ms() {
        let beat = Beat {
            timestamp_ms: 1500.0,
            strength: 0.5,
            confidence: 0.9,
            classification: None,
            context: None,
        };
        assert!((beat.time_seconds() - 1.5).abs() < 1e-9);
    }
}
