//! Sample-rate conversion via monotone linear interpolation.
//!
//! Deterministic by construction (spec.md §9's determinism requirement does
//! not hinge on a particular resampling algorithm, just a repeatable one).

use crate::error::{AudioError, BeatParserError, Result};

/// Resample `x` from `from_rate` to `to_rate`, preserving duration to
/// within one sample.
pub fn resample(x: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if x.is_empty() {
        return Err(BeatParserError::Audio(AudioError::Empty));
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(BeatParserError::Audio(AudioError::InvalidParameters {
            details: "sample rates must be positive".into(),
        }));
    }
    if from_rate == to_rate {
        return Ok(x.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = ((x.len() as f64) * ratio).round() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx0 = src_pos.floor() as usize;
        let frac = (src_pos - idx0 as f64) as f32;
        let s0 = *x.get(idx0).unwrap_or(&0.0);
        let s1 = *x.get(idx0 + 1).unwrap_or(&s0);
        let v = s0 + (s1 - s0) * frac;
        out.push(if v.is_finite() { v } else { 0.0 });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_preserves_duration() {
        let x = vec![0.0f32; 44_100];
        let y = resample(&x, 44_100, 22_050).unwrap();
        let expected = 22_050;
        assert!((y.len() as i64 - expected as i64).abs() <= 1);
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let x = vec![1.0, 2.0, 3.0];
        let y = resample(&x, 44_100, 44_100).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn resample_upsampling_interpolates() {
        let x = vec![0.0, 1.0, 0.0, -1.0];
        let y = resample(&x, 4, 8).unwrap();
        assert!(y.len() >= x.len());
        assert!(y.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(resample(&[], 44_100, 22_050).is_err());
    }
}
