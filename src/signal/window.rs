//! Window functions applied to frames before FFT analysis.

use std::f32::consts::PI;

/// Built-in window kinds. A closed enumeration — see spec.md §9 on tagged
/// variants vs. trait objects for strategies that are not truly open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

/// Compute length-`n` window coefficients for the given kind.
pub fn window(kind: WindowKind, n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }

    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| {
            let x = i as f32;
            match kind {
                WindowKind::Hann => 0.5 * (1.0 - (2.0 * PI * x / denom).cos()),
                WindowKind::Hamming => 0.54 - 0.46 * (2.0 * PI * x / denom).cos(),
                WindowKind::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x / denom).cos() + 0.08 * (4.0 * PI * x / denom).cos()
                }
                WindowKind::Rectangular => 1.0,
            }
        })
        .collect()
}

/// Apply a precomputed window in place, zero-padding any remaining tail.
pub fn apply_window(samples: &[f32], coefficients: &[f32], out: &mut [f32]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = match (samples.get(i), coefficients.get(i)) {
            (Some(&s), Some(&w)) => s * w,
            _ => 0.0,
        };
    }
}
