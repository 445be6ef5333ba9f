//! Free-function signal primitives: FFT, windows, filters, resampling, and
//! scalar features (spec.md §4.1). Pure and stateless except for
//! [`fft::FftProcessor`]'s cached scratch space.

pub mod features;
pub mod fft;
pub mod filters;
pub mod resample;
pub mod window;

pub use features::{rms, spectral_centroid, spectral_rolloff, zero_crossing_rate};
pub use fft::{fft_complex, fft_magnitude, FftProcessor};
pub use filters::{apply_filter, BiquadCascade, FilterKind, OnePoleLowPass};
pub use resample::resample;
pub use window::{apply_window, window, WindowKind};
