//! Energy-difference onset detection function (spec.md §4.3).

use crate::error::Result;
use crate::framer;
use crate::signal::{window, FftProcessor, WindowKind};

pub fn energy_difference(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>> {
    let frames = framer::frame(samples, frame_size, hop_size, true)?;
    if frames.is_empty() {
        return Ok(vec![]);
    }

    let coeffs = window(WindowKind::Hann, frame_size);
    let mut fft = FftProcessor::new(frame_size)?;
    let half = frame_size / 2;
    let hf_start = half * 3 / 10;

    let mut energies = Vec::with_capacity(frames.len());
    let mut hf_energies = Vec::with_capacity(frames.len());

    for f in &frames {
        let energy: f32 = f.samples.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32;
        energies.push(energy);

        let mut windowed = vec![0.0f32; frame_size];
        for (i, slot) in windowed.iter_mut().enumerate() {
            *slot = f.samples[i] * coeffs[i];
        }
        let mag = fft.magnitude(&windowed)?;
        let hf: f32 = mag[hf_start..].iter().map(|&m| m * m).sum();
        hf_energies.push(hf);
    }

    let energies = smooth(&energies, 5);
    let hf_energies = smooth(&hf_energies, 5);

    const EPS: f32 = 1e-9;
    let mut raw = Vec::with_capacity(frames.len());
    raw.push(0.0);
    for i in 1..frames.len() {
        let d_energy = (energies[i] - energies[i - 1]).max(0.0);
        let d_hf = (hf_energies[i] - hf_energies[i - 1]).max(0.0);
        raw.push(d_energy / (energies[i - 1] + EPS) + 0.5 * d_hf / (hf_energies[i - 1] + EPS));
    }

    Ok(apply_adaptive_threshold(&raw, &energies))
}

fn smooth(values: &[f32], window_len: usize) -> Vec<f32> {
    let n = values.len();
    let half = window_len / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            values[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
        })
        .collect()
}

/// Apply the binary adaptive-energy-threshold multiplier (spec.md §4.3):
/// ×1.5 when the frame's energy exceeds `mean + 0.5*std` over the
/// surrounding ±10 frames, else ×0.5.
fn apply_adaptive_threshold(values: &[f32], energies: &[f32]) -> Vec<f32> {
    let n = values.len();
    let span = 10usize;
    let mut out = vec![0.0f32; n];
    for i in 0..n {
        let lo = i.saturating_sub(span);
        let hi = (i + span + 1).min(energies.len());
        let window = &energies[lo..hi];
        let mean = window.iter().sum::<f32>() / window.len() as f32;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / window.len() as f32;
        let std = var.sqrt();
        let threshold = mean + 0.5 * std;
        out[i] = if energies[i] > threshold {
            values[i] * 1.5
        } else {
            values[i] * 0.5
        };
    }
    out
}
