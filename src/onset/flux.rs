//! Spectral flux onset detection function (spec.md §4.3).

use crate::error::Result;
use crate::framer;
use crate::onset::perceptual_weight;
use crate::signal::{window, FftProcessor, WindowKind};

pub fn spectral_flux(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>> {
    let frames = framer::frame(samples, frame_size, hop_size, true)?;
    if frames.is_empty() {
        return Ok(vec![]);
    }

    let coeffs = window(WindowKind::Hann, frame_size);
    let mut fft = FftProcessor::new(frame_size)?;
    let half = frame_size / 2;
    let bin_limit = ((0.8 * half as f32).floor() as usize).min(half);

    let mut prev_log_mag: Option<Vec<f32>> = None;
    let mut flux = Vec::with_capacity(frames.len());

    for f in &frames {
        let mut windowed = vec![0.0f32; frame_size];
        for (i, slot) in windowed.iter_mut().enumerate() {
            *slot = f.samples[i] * coeffs[i];
        }
        let mag = fft.magnitude(&windowed)?;
        let log_mag: Vec<f32> = mag.iter().map(|&m| (1.0 + m).ln()).collect();

        let value = if let Some(prev) = &prev_log_mag {
            let mut acc = 0.0f32;
            for k in 1..bin_limit {
                let diff = log_mag[k] - prev[k];
                if diff > 0.0 {
                    acc += diff * diff * perceptual_weight(k, half);
                }
            }
            acc.sqrt()
        } else {
            0.0
        };

        flux.push(if value.is_finite() { value } else { 0.0 });
        prev_log_mag = Some(log_mag);
    }

    normalize_local(&mut flux, 7);
    Ok(flux)
}

/// Divide each value by the max of a centered window of `span` frames.
fn normalize_local(values: &mut [f32], span: usize) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let half = span / 2;
    let original = values.to_vec();
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let local_max = original[lo..hi].iter().cloned().fold(0.0f32, f32::max);
        if local_max > 1e-9 {
            values[i] = (original[i] / local_max).min(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_is_non_negative_and_finite() {
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (i as f32 * 0.01).sin() * 0.5)
            .collect();
        let flux = spectral_flux(&samples, 1024, 512).unwrap();
        assert!(flux.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn silence_has_zero_flux() {
        let samples = vec![0.0f32; 4096];
        let flux = spectral_flux(&samples, 1024, 512).unwrap();
        assert!(flux.iter().all(|&v| v.abs() < 1e-6));
    }
}
