//! Rhythm-band onset function used for tempo tracking (spec.md §4.4):
//! finer hop than onset detection, restricted to the low 30% of the
//! spectrum, half-wave rectified, low-passed at 20 Hz.

use crate::error::Result;
use crate::framer;
use crate::signal::{window, FftProcessor, OnePoleLowPass, WindowKind};

const HOP: usize = 256;
const WINDOW_SIZE: usize = 1024;

pub fn rhythm_onset_function(samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
    let frames = framer::frame(samples, WINDOW_SIZE, HOP, true)?;
    if frames.is_empty() {
        return Ok(vec![]);
    }

    let coeffs = window(WindowKind::Hann, WINDOW_SIZE);
    let mut fft = FftProcessor::new(WINDOW_SIZE)?;
    let half = WINDOW_SIZE / 2;
    let band_limit = (half as f32 * 0.3).round() as usize;

    let mut prev: Option<Vec<f32>> = None;
    let mut raw = Vec::with_capacity(frames.len());

    for f in &frames {
        let mut windowed = vec![0.0f32; WINDOW_SIZE];
        for (i, slot) in windowed.iter_mut().enumerate() {
            *slot = f.samples[i] * coeffs[i];
        }
        let mag = fft.magnitude(&windowed)?;

        let value = match &prev {
            Some(p) => {
                let mut acc = 0.0f32;
                for k in 0..band_limit.min(half) {
                    acc += (mag[k] - p[k]).max(0.0);
                }
                acc
            }
            None => 0.0,
        };
        raw.push(if value.is_finite() { value } else { 0.0 });
        prev = Some(mag);
    }

    let frame_rate = sample_rate as f32 / HOP as f32;
    let mut lp = OnePoleLowPass::new(20.0, frame_rate);
    Ok(raw.into_iter().map(|v| lp.process(v)).collect())
}

pub fn frame_rate(sample_rate: u32) -> f32 {
    sample_rate as f32 / HOP as f32
}

pub fn hop() -> usize {
    HOP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rhythm_onset_is_non_negative_and_finite() {
        let samples: Vec<f32> = (0..44_100)
            .map(|i| if i % 8820 < 100 { 0.8 } else { 0.0 })
            .collect();
        let values = rhythm_onset_function(&samples, 44_100).unwrap();
        assert!(values.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn silence_yields_near_zero() {
        let samples = vec![0.0f32; 8192];
        let values = rhythm_onset_function(&samples, 44_100).unwrap();
        assert!(values.iter().all(|&v| v.abs() < 1e-6));
    }
}
