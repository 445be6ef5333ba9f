//! Scalar signal features: RMS, zero-crossing rate, spectral centroid and
//! rolloff (spec.md §4.1).

use crate::error::{AudioError, BeatParserError, Result};

fn check_non_empty(samples: &[f32]) -> Result<()> {
    if samples.is_empty() {
        return Err(BeatParserError::Audio(AudioError::Empty));
    }
    Ok(())
}

/// Root-mean-square energy.
pub fn rms(samples: &[f32]) -> Result<f32> {
    check_non_empty(samples)?;
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    let v = (sum_sq / samples.len() as f32).sqrt();
    Ok(if v.is_finite() { v } else { 0.0 })
}

/// Fraction of adjacent sample pairs that cross zero.
pub fn zero_crossing_rate(samples: &[f32]) -> Result<f32> {
    check_non_empty(samples)?;
    if samples.len() < 2 {
        return Ok(0.0);
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    Ok(crossings as f32 / (samples.len() - 1) as f32)
}

/// Magnitude-weighted mean frequency, in Hz, of a magnitude spectrum.
pub fn spectral_centroid(magnitudes: &[f32], sample_rate: u32) -> Result<f32> {
    check_non_empty(magnitudes)?;
    let total: f32 = magnitudes.iter().sum();
    if total <= 0.0 {
        return Ok(0.0);
    }
    let n = magnitudes.len();
    let weighted: f32 = magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| i as f32 * m)
        .sum();
    let bin_hz = sample_rate as f32 / (2.0 * n as f32);
    let centroid = (weighted / total) * bin_hz;
    Ok(if centroid.is_finite() { centroid } else { 0.0 })
}

/// Frequency, in Hz, below which `threshold` (default 0.85) of the spectral
/// energy is concentrated.
pub fn spectral_rolloff(magnitudes: &[f32], sample_rate: u32, threshold: f32) -> Result<f32> {
    check_non_empty(magnitudes)?;
    let threshold = threshold.clamp(0.0, 1.0);
    let total: f32 = magnitudes.iter().sum();
    if total <= 0.0 {
        return Ok(0.0);
    }
    let target = total * threshold;
    let mut cumulative = 0.0f32;
    let mut bin = magnitudes.len().saturating_sub(1);
    for (i, &m) in magnitudes.iter().enumerate() {
        cumulative += m;
        if cumulative >= target {
            bin = i;
            break;
        }
    }
    let bin_hz = sample_rate as f32 / (2.0 * magnitudes.len() as f32);
    Ok(bin as f32 * bin_hz)
}
