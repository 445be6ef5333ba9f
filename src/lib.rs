//! # beatparser
//!
//! Multi-algorithm beat detection, tempo tracking, and beat selection for
//! raw PCM audio.
//!
//! This library turns a buffer (or stream, or file) of mono/stereo samples
//! into a confidence-scored list of beats, an estimated tempo and time
//! signature, and per-stage metadata describing how the analysis ran.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beatparser::{config::ParseConfig, config::ParseOptions, orchestrator::BeatParser};
//!
//! # #[tokio::main]
//! # async fn main() -> beatparser::error::Result<()> {
//! let parser = BeatParser::new(ParseConfig::default())?;
//! let result = parser
//!     .parse_file(std::path::Path::new("track.wav"), &ParseOptions::default())
//!     .await?;
//!
//! for beat in &result.beats {
//!     println!("{:.3}s strength={:.2}", beat.time_seconds(), beat.strength);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`signal`] - windowing, FFT, filters: the DSP primitives every other
//!   stage is built on
//! - [`framer`] - slices a buffer into overlapping analysis frames
//! - [`onset`] - spectral-flux, energy-difference, complex-domain and
//!   combined onset detection, peak picking, onset refinement
//! - [`tempo`] - rhythm-band onset function, autocorrelation tempo
//!   hypotheses, phase and time-signature estimation, beat-grid alignment
//! - [`selector`] - reduces a candidate pool to a target beat count under
//!   one of several [`selector::SelectionStrategy`] policies
//! - [`orchestrator`] - composes the above into [`orchestrator::BeatParser`],
//!   the public entry point, plus streaming and plugin support
//! - [`worker`] - async request/response envelope for running a
//!   [`orchestrator::BeatParser`] behind a background executor
//! - [`wav`] - fallback WAV decoder used by `parse_file`
//! - [`config`] - [`config::ParseConfig`] (analysis parameters) and
//!   [`config::ParseOptions`] (per-call options)
//! - [`types`] - shared value types: frames, spectra, onsets, beats, results
//! - [`error`] - [`error::BeatParserError`] and friends
//!
//! ## Writing a plugin
//!
//! Plugins hook into audio preprocessing or the candidate pool before
//! selection by implementing [`orchestrator::Plugin`]:
//!
//! ```rust
//! use beatparser::orchestrator::Plugin;
//! use beatparser::types::BeatCandidate;
//! use beatparser::error::Result;
//!
//! struct Gain(f32);
//!
//! impl Plugin for Gain {
//!     fn name(&self) -> &str {
//!         "gain"
//!     }
//!
//!     fn transform_audio(&self, samples: Vec<f32>) -> Result<Vec<f32>> {
//!         Ok(samples.into_iter().map(|s| s * self.0).collect())
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod framer;
pub mod onset;
pub mod orchestrator;
pub mod selector;
pub mod signal;
pub mod tempo;
pub mod types;
pub mod wav;
pub mod worker;

pub use crate::{
    config::ParseConfig,
    error::{BeatParserError, Result},
    orchestrator::BeatParser,
};
