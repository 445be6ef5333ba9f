//! Biquad filter cascades (RBJ cookbook coefficients) and a one-pole
//! low-pass used by the tempo tracker's rhythm-band smoothing.

use std::f32::consts::PI;

use crate::error::{BeatParserError, ConfigError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

/// A single second-order IIR section in direct form I, with its own state.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    fn process(&mut self, x0: f32) -> f32 {
        let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = if y0.is_finite() { y0 } else { 0.0 };
        self.y1
    }
}

fn design(kind: FilterKind, cutoff: f32, sample_rate: f32, q: f32) -> Result<Biquad> {
    if cutoff <= 0.0 || cutoff >= sample_rate / 2.0 {
        return Err(BeatParserError::Config(ConfigError::OutOfRange {
            name: "cutoff".into(),
            value: cutoff.to_string(),
        }));
    }

    let omega = 2.0 * PI * cutoff / sample_rate;
    let (sin_w, cos_w) = (omega.sin(), omega.cos());
    let alpha = sin_w / (2.0 * q);

    let (b0, b1, b2, a0, a1, a2) = match kind {
        FilterKind::LowPass => {
            let b1 = 1.0 - cos_w;
            (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
        }
        FilterKind::HighPass => {
            let b1 = -(1.0 + cos_w);
            (
                (1.0 + cos_w) / 2.0,
                b1,
                (1.0 + cos_w) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w,
                1.0 - alpha,
            )
        }
        FilterKind::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
    };

    Ok(Biquad {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
        x1: 0.0,
        x2: 0.0,
        y1: 0.0,
        y2: 0.0,
    })
}

/// A cascade of `order` identical biquad sections.
pub struct BiquadCascade {
    stages: Vec<Biquad>,
}

impl BiquadCascade {
    pub fn new(kind: FilterKind, cutoff: f32, sample_rate: f32, order: usize) -> Result<Self> {
        let order = order.max(1);
        let stages = (0..order)
            .map(|_| design(kind, cutoff, sample_rate, std::f32::consts::FRAC_1_SQRT_2))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { stages })
    }

    pub fn process(&mut self, sample: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(sample, |acc, stage| stage.process(acc))
    }

    pub fn process_buffer(&mut self, samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|&s| self.process(s)).collect()
    }
}

/// Apply a filter of the given kind/order to a whole buffer (convenience
/// free-function wrapper matching spec.md §4.1's "filters are biquad
/// cascades" contract).
pub fn apply_filter(
    samples: &[f32],
    kind: FilterKind,
    cutoff: f32,
    sample_rate: u32,
    order: usize,
) -> Result<Vec<f32>> {
    let mut cascade = BiquadCascade::new(kind, cutoff, sample_rate as f32, order)?;
    Ok(cascade.process_buffer(samples))
}

/// A one-pole low-pass, used to smooth the tempo tracker's rhythm-band
/// onset function (spec.md §4.4: "apply a one-pole low-pass at 20 Hz").
pub struct OnePoleLowPass {
    alpha: f32,
    y: f32,
}

impl OnePoleLowPass {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        let alpha = dt / (rc + dt);
        Self { alpha, y: 0.0 }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        self.y += self.alpha * (x - self.y);
        self.y
    }

    pub fn process_buffer(&mut self, samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|&s| self.process(s)).collect()
    }
}
