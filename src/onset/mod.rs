//! Onset detection (spec.md §4.3): four detection methods sharing one peak
//! picker and one refinement pass.

mod combined;
mod complex_domain;
mod energy;
mod flux;
mod peak_picking;
mod refine;

use crate::error::Result;
use crate::signal::{rms, zero_crossing_rate};
use crate::types::{Onset, OnsetFunction};

/// Onset detection method. A closed enumeration (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnsetMethod {
    SpectralFlux,
    EnergyDifference,
    ComplexDomain,
    /// Fusion of the other three plus a cross-function variance signal.
    /// The default method.
    Combined,
}

impl Default for OnsetMethod {
    fn default() -> Self {
        OnsetMethod::Combined
    }
}

/// Perceptual frequency weighting curve shared by flux/complex-domain:
/// very low bins are de-emphasized, the mid band is full-weight, upper
/// bins are slightly de-emphasized (spec.md §4.3).
pub(crate) fn perceptual_weight(bin: usize, half_n: usize) -> f32 {
    if half_n == 0 {
        return 1.0;
    }
    let frac = bin as f32 / half_n as f32;
    if frac < 0.1 {
        0.5
    } else if frac <= 0.5 {
        1.0
    } else {
        0.7
    }
}

pub(crate) fn normalize_to_unit(values: &mut [f32]) {
    let max = values.iter().cloned().fold(0.0f32, f32::max);
    if max > 1e-9 {
        for v in values.iter_mut() {
            *v /= max;
        }
    }
}

fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    (mean, var.sqrt())
}

/// Detect onsets in `samples` using `method`.
///
/// `min_interval` is the minimum spacing between accepted onsets, in
/// seconds (spec.md default 50 ms). Returns the underlying onset function
/// (for downstream tempo tracking reuse) alongside the picked onsets.
pub fn detect_onsets(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    method: OnsetMethod,
    min_interval: f64,
) -> Result<(OnsetFunction, Vec<Onset>)> {
    if samples.is_empty() {
        return Ok((
            OnsetFunction {
                values: vec![],
                hop_size,
                sample_rate,
            },
            vec![],
        ));
    }

    // Combined pre-checks (spec.md §4.3): silent buffers short-circuit to
    // no onsets; noisy buffers get a stricter threshold and wider spacing.
    let signal_rms = rms(samples).unwrap_or(0.0);
    if signal_rms < 0.001 {
        return Ok((
            OnsetFunction {
                values: vec![0.0; samples.len() / hop_size.max(1)],
                hop_size,
                sample_rate,
            },
            vec![],
        ));
    }

    let zcr = zero_crossing_rate(samples).unwrap_or(0.0);
    let zcr_hz = zcr * sample_rate as f32;
    let noisy = zcr_hz > 3000.0;

    let (values, threshold_scale, min_interval) = match method {
        OnsetMethod::SpectralFlux => {
            let v = flux::spectral_flux(samples, frame_size, hop_size)?;
            (v, 1.0, min_interval)
        }
        OnsetMethod::EnergyDifference => {
            let v = energy::energy_difference(samples, frame_size, hop_size)?;
            (v, 1.0, min_interval)
        }
        OnsetMethod::ComplexDomain => {
            let v = complex_domain::complex_domain(samples, frame_size, hop_size)?;
            (v, 1.0, min_interval)
        }
        OnsetMethod::Combined => {
            let out = combined::combined(samples, frame_size, hop_size)?;
            let scale = if noisy { 1.5 } else { 1.0 };
            let interval = if noisy { min_interval * 1.2 } else { min_interval };
            (out, scale, interval)
        }
    };

    let frame_rate = sample_rate as f32 / hop_size as f32;
    let min_interval_frames = ((min_interval * frame_rate as f64).round() as usize).max(1);

    let peaks = peak_picking::pick_peaks(&values, min_interval_frames, threshold_scale);

    let mut onsets: Vec<Onset> = peaks
        .into_iter()
        .map(|hit| {
            let approx_sample = hit.index * hop_size;
            let (time, confidence) =
                refine::refine_onset(samples, approx_sample, sample_rate, hit.confidence);
            Onset {
                time,
                strength: hit.value,
                confidence,
            }
        })
        .collect();

    post_process(&mut onsets, min_interval);

    Ok((
        OnsetFunction {
            values,
            hop_size,
            sample_rate,
        },
        onsets,
    ))
}

/// Sort by time and drop the weaker of any pair closer than `min_spacing`
/// seconds (spec.md §4.3 post-process).
fn post_process(onsets: &mut Vec<Onset>, min_spacing: f64) {
    onsets.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap());

    let mut kept: Vec<Onset> = Vec::with_capacity(onsets.len());
    for onset in onsets.drain(..) {
        if let Some(last) = kept.last() {
            if onset.time - last.time < min_spacing {
                if onset.confidence > last.confidence {
                    kept.pop();
                    kept.push(onset);
                }
                continue;
            }
        }
        kept.push(onset);
    }
    *onsets = kept;
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

    #[test]
    fn silence_yields_no_onsets() {
        let samples = vec![0.0f32; 44_100];
        let (_, onsets) = detect_onsets(&samples, 44_100, 1024, 512, OnsetMethod::Combined, 0.05)
            .unwrap();
        assert!(onsets.is_empty());
    }

    #[test]
    fn click_track_yields_onsets_with_valid_spacing() {
        let samples = click_track(44_100, 120.0, 4.0);
        let (_, onsets) =
            detect_onsets(&samples, 44_100, 1024, 512, OnsetMethod::Combined, 0.05).unwrap();

        for pair in onsets.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert!(pair[1].time - pair[0].time >= 0.049);
        }
        for onset in &onsets {
            assert!((0.0..=1.0).contains(&onset.confidence));
            assert!(onset.strength >= 0.0 && onset.strength.is_finite());
        }
    }

    #[test]
    fn onset_function_length_matches_frame_count() {
        let samples = vec![0.1f32; 44_100];
        let (of, _) =
            detect_onsets(&samples, 44_100, 1024, 512, OnsetMethod::SpectralFlux, 0.05).unwrap();
        let expected_frames = (samples.len() - 1024) / 512 + 1;
        assert_eq!(of.len(), expected_frames);
    }

    #[test]
    fn empty_input_yields_no_onsets() {
        let (of, onsets) =
            detect_onsets(&[], 44_100, 1024, 512, OnsetMethod::Combined, 0.05).unwrap();
        assert!(onsets.is_empty());
        assert!(of.is_empty());
    }

    #[test]
    fn perceptual_weight_bands() {
        assert_eq!(perceptual_weight(5, 512), 0.5);
        assert_eq!(perceptual_weight(200, 512), 1.0);
        assert_eq!(perceptual_weight(500, 512), 0.7);
    }
}
