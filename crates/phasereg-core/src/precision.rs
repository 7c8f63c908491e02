use std::fmt::Display;

use num_traits::{Float, FloatConst};
use rustfft::FftNum;

/// Floating-point type the engine computes spectra and surfaces in.
///
/// Implemented for `f32` and `f64`. Results are always reported as `f64`
/// regardless of the working precision.
pub trait Precision: FftNum + Float + FloatConst + Display + Default {
    fn cast(value: f64) -> Self;
    fn as_f64(self) -> f64;
}

impl Precision for f32 {
    #[inline]
    fn cast(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Precision for f64 {
    #[inline]
    fn cast(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
