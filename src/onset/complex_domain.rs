//! Complex-domain (phase-deviation) onset detection function (spec.md §4.3).

use std::f32::consts::PI;

use crate::error::Result;
use crate::framer;
use crate::onset::perceptual_weight;
use crate::signal::{window, FftProcessor, WindowKind};

pub fn complex_domain(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>> {
    let frames = framer::frame(samples, frame_size, hop_size, true)?;
    if frames.is_empty() {
        return Ok(vec![]);
    }

    let coeffs = window(WindowKind::Hann, frame_size);
    let mut fft = FftProcessor::new(frame_size)?;
    let half = frame_size / 2;

    const WEIGHT_PHASE: f32 = 0.6;
    const WEIGHT_MAG: f32 = 0.4;

    let mut prev_mag: Option<Vec<f32>> = None;
    let mut prev_phase: Option<Vec<f32>> = None;
    let mut prev_prev_phase: Option<Vec<f32>> = None;

    let mut out = Vec::with_capacity(frames.len());

    for f in &frames {
        let mut windowed = vec![0.0f32; frame_size];
        for (i, slot) in windowed.iter_mut().enumerate() {
            *slot = f.samples[i] * coeffs[i];
        }
        let (mag, phase) = fft.complex(&windowed)?;

        let value = match (&prev_mag, &prev_phase, &prev_prev_phase) {
            (Some(pmag), Some(pphase), Some(ppphase)) => {
                // second-order: linear extrapolation from the two prior phases.
                let mut acc = 0.0f32;
                for k in 1..half {
                    let predicted_phase = 2.0 * pphase[k] - ppphase[k];
                    let phase_dev = wrap_phase(phase[k] - wrap_phase(predicted_phase));
                    let mag_dev = (mag[k] - pmag[k]).max(0.0);

                    let deviation = mag[k] * phase_dev.abs() * WEIGHT_PHASE + mag_dev * WEIGHT_MAG;
                    acc += deviation * perceptual_weight(k, half);
                }
                acc
            }
            (Some(pmag), Some(pphase), None) => {
                // first frame with only one prior phase: predict via a
                // constant per-bin carrier advance of 2*pi*bin*hop/N.
                let mut acc = 0.0f32;
                for k in 1..half {
                    let carrier = 2.0 * PI * k as f32 * hop_size as f32 / frame_size as f32;
                    let predicted_phase = pphase[k] + carrier;
                    let phase_dev = wrap_phase(phase[k] - wrap_phase(predicted_phase));
                    let mag_dev = (mag[k] - pmag[k]).max(0.0);

                    let deviation = mag[k] * phase_dev.abs() * WEIGHT_PHASE + mag_dev * WEIGHT_MAG;
                    acc += deviation * perceptual_weight(k, half);
                }
                acc
            }
            _ => 0.0,
        };

        out.push(if value.is_finite() { value } else { 0.0 });

        prev_prev_phase = prev_phase;
        prev_phase = Some(phase);
        prev_mag = Some(mag);
    }

    normalize_local(&mut out, 7);
    Ok(out)
}

fn wrap_phase(p: f32) -> f32 {
    let mut p = p % (2.0 * PI);
    if p > PI {
        p -= 2.0 * PI;
    } else if p < -PI {
        p += 2.0 * PI;
    }
    p
}

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
