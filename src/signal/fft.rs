//! FFT magnitude/phase primitives.
//!
//! Two entry points: the free functions [`fft_magnitude`]/[`fft_complex`]
//! match the module's plain contract (spec.md §4.1) for one-off calls, and
//! [`FftProcessor`] caches the `realfft` plan and scratch buffers so hot
//! loops (onset detection, tempo tracking) pay the planning cost once per
//! instance rather than once per frame (spec.md §9, arena reuse).

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::{AudioError, BeatParserError, Result};

fn check_power_of_two(n: usize) -> Result<()> {
    if n == 0 || !n.is_power_of_two() {
        return Err(BeatParserError::Audio(AudioError::InvalidParameters {
            details: format!("FFT size {n} must be a non-zero power of two"),
        }));
    }
    Ok(())
}

/// Reusable FFT scratch space for a fixed frame size.
pub struct FftProcessor {
    size: usize,
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
}

impl FftProcessor {
    pub fn new(size: usize) -> Result<Self> {
        check_power_of_two(size)?;
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        Ok(Self {
            size,
            fft,
            input,
            spectrum,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute a non-negative magnitude spectrum of length `size/2`.
    ///
    /// `frame` must already be windowed; shorter frames are zero-padded.
    pub fn magnitude(&mut self, frame: &[f32]) -> Result<Vec<f32>> {
        self.load(frame)?;
        self.fft
            .process(&mut self.input, &mut self.spectrum)
            .map_err(|e| BeatParserError::ComputationFailure {
                stage: "fft".into(),
                reason: e.to_string(),
            })?;

        let half = self.size / 2;
        Ok(self.spectrum[..half]
            .iter()
            .map(|c| sanitize(c.norm()))
            .collect())
    }

    /// Compute (magnitude, phase) each of length `size/2`; phase in [-π, π].
    pub fn complex(&mut self, frame: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        self.load(frame)?;
        self.fft
            .process(&mut self.input, &mut self.spectrum)
            .map_err(|e| BeatParserError::ComputationFailure {
                stage: "fft".into(),
                reason: e.to_string(),
            })?;

        let half = self.size / 2;
        let mut magnitudes = Vec::with_capacity(half);
        let mut phases = Vec::with_capacity(half);
        for c in &self.spectrum[..half] {
            magnitudes.push(sanitize(c.norm()));
            phases.push(sanitize(c.arg()));
        }
        Ok((magnitudes, phases))
    }

    fn load(&mut self, frame: &[f32]) -> Result<()> {
        if frame.is_empty() {
            return Err(BeatParserError::Audio(AudioError::Empty));
        }
        if frame.len() > self.size {
            return Err(BeatParserError::Audio(AudioError::InvalidParameters {
                details: format!(
                    "frame length {} exceeds FFT size {}",
                    frame.len(),
                    self.size
                ),
            }));
        }
        for (dst, &src) in self.input.iter_mut().zip(frame.iter()) {
            *dst = if src.is_finite() { src } else { 0.0 };
        }
        for dst in self.input[frame.len()..].iter_mut() {
            *dst = 0.0;
        }
        Ok(())
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0).min(f32::MAX)
    } else {
        0.0
    }
}

/// One-off magnitude spectrum computation (spec.md §4.1 contract).
pub fn fft_magnitude(frame: &[f32]) -> Result<Vec<f32>> {
    if frame.is_empty() {
        return Err(BeatParserError::Audio(AudioError::Empty));
    }
    let size = frame.len().next_power_of_two();
    let mut proc = FftProcessor::new(size)?;
    proc.magnitude(frame)
}

/// One-off (magnitude, phase) computation (spec.md §4.1 contract).
pub fn fft_complex(frame: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
    if frame.is_empty() {
        return Err(BeatParserError::Audio(AudioError::Empty));
    }
    let size = frame.len().next_power_of_two();
    let mut proc = FftProcessor::new(size)?;
    proc.complex(frame)
}
