//! Fusion of flux/energy/complex-domain onset functions plus a
//! cross-function variance ("HFC") signal (spec.md §4.3).

use crate::error::Result;
use crate::onset::{complex_domain, energy, flux, normalize_to_unit};

const WEIGHT_FLUX: f32 = 0.35;
const WEIGHT_ENERGY: f32 = 0.25;
const WEIGHT_COMPLEX: f32 = 0.25;
const WEIGHT_HFC: f32 = 0.15;

pub fn combined(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Vec<f32>> {
    let mut flux_values = flux::spectral_flux(samples, frame_size, hop_size)?;
    let mut energy_values = energy::energy_difference(samples, frame_size, hop_size)?;
    let mut complex_values = complex_domain::complex_domain(samples, frame_size, hop_size)?;

    let n = flux_values.len().min(energy_values.len()).min(complex_values.len());
    flux_values.truncate(n);
    energy_values.truncate(n);
    complex_values.truncate(n);

    normalize_to_unit(&mut flux_values);
    normalize_to_unit(&mut energy_values);
    normalize_to_unit(&mut complex_values);

    let rel_flux = reliability(&flux_values);
    let rel_energy = reliability(&energy_values);
    let rel_complex = reliability(&complex_values);

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let conf_flux = dynamic_confidence(&flux_values, i) * rel_flux;
        let conf_energy = dynamic_confidence(&energy_values, i) * rel_energy;
        let conf_complex = dynamic_confidence(&complex_values, i) * rel_complex;

        let hfc = cross_function_variance(flux_values[i], energy_values[i], complex_values[i]);

        let numerator = WEIGHT_FLUX * flux_values[i] * conf_flux
            + WEIGHT_ENERGY * energy_values[i] * conf_energy
            + WEIGHT_COMPLEX * complex_values[i] * conf_complex;
        let denominator = WEIGHT_FLUX * conf_flux + WEIGHT_ENERGY * conf_energy + WEIGHT_COMPLEX * conf_complex;

        let normalized = if denominator > 1e-9 { numerator / denominator } else { 0.0 };
        let weighted = normalized + WEIGHT_HFC * hfc;

        out.push(weighted.max(0.0));
    }

    Ok(out)
}

/// A function's overall signal-to-noise reliability: high mean/std ratio
/// means a clean, peaky function worth trusting more.
fn reliability(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    let std = var.sqrt();
    if mean < 1e-6 {
        return 0.5;
    }
    (std / mean).clamp(0.2, 1.0)
}

/// Local z-score based confidence for a single sample, mapped to [0, 1].
fn dynamic_confidence(values: &[f32], index: usize) -> f32 {
    let span = 10usize;
    let lo = index.saturating_sub(span);
    let hi = (index + span + 1).min(values.len());
    let window = &values[lo..hi];
    let mean = window.iter().sum::<f32>() / window.len() as f32;
    let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / window.len() as f32;
    let std = var.sqrt().max(1e-6);
    let z = (values[index] - mean) / std;
    (0.5 + 0.5 * (z / 3.0)).clamp(0.0, 1.0)
}

/// High variance across the three functions at a given frame indicates
/// disagreement, which is itself evidence of a transient.
fn cross_function_variance(a: f32, b: f32, c: f32) -> f32 {
    let mean = (a + b + c) / 3.0;
    let var = ((a - mean).powi(2) + (b - mean).powi(2) + (c - mean).powi(2)) / 3.0;
    var.sqrt().min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_values_are_non_negative_and_finite() {
        let samples: Vec<f32> = (0..44_100)
            .map(|i| (i as f32 * 0.015).sin() * 0.5)
            .collect();
        let out = combined(&samples, 1024, 512).unwrap();
        assert!(out.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn silence_yields_near_zero() {
        let samples = vec![0.0f32; 8192];
        let out = combined(&samples, 1024, 512).unwrap();
        assert!(out.iter().all(|&v| v.abs() < 1e-3));
    }
}
