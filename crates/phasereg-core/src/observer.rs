//! Hooks for inspecting intermediate pipeline products.
//!
//! Pass a [`DebugContext`] through
//! [`CalculateOptions::debug`](crate::engine::CalculateOptions) to receive
//! every intermediate array. Without one the pipeline skips the hooks
//! entirely.

use std::path::PathBuf;

use ndarray::ArrayView2;
use num_complex::Complex;

use crate::correlation::Peak;
use crate::engine::Estimate;
use crate::precision::Precision;
use crate::refine::RefinementFailure;
use crate::shift::Shift;

/// Receives intermediate arrays from a single registration.
///
/// All methods default to no-ops, so implementors only override the stages
/// they care about. Calls arrive in pipeline order from the calling thread.
pub trait RegistrationObserver<F: Precision = f64>: Send + Sync {
    /// Both inputs after conversion to the working precision.
    fn input_images(&self, _info: &DebugInfo, _image1: ArrayView2<F>, _image2: ArrayView2<F>) {}

    /// Both inputs after the spatial window is applied.
    fn windowed_images(&self, _info: &DebugInfo, _image1: ArrayView2<F>, _image2: ArrayView2<F>) {}

    /// Bandpass-filtered cross-power spectrum, in DFT layout.
    fn cross_power(&self, _info: &DebugInfo, _spectrum: ArrayView2<Complex<F>>) {}

    /// Correlation surface (L3) and the integer peak picked on it.
    fn correlation_surface(&self, _info: &DebugInfo, _surface: ArrayView2<F>, _peak: Peak) {}

    /// Neighborhood (L2) cropped around the peak.
    fn neighborhood(&self, _info: &DebugInfo, _l2: ArrayView2<F>) {}

    /// Upsampled neighborhood (L2U).
    fn upsampled_neighborhood(&self, _info: &DebugInfo, _l2u: ArrayView2<F>) {}

    /// Centroid window (L1) examined at `iteration` of the attempt with `ratio`.
    fn centroid_window(&self, _info: &DebugInfo, _l1: ArrayView2<F>, _ratio: f64, _iteration: usize) {
    }

    /// A refinement attempt with `ratio` was abandoned.
    fn attempt_failed(&self, _info: &DebugInfo, _ratio: f64, _failure: RefinementFailure) {}

    /// The final estimate returned to the caller.
    fn finished(&self, _info: &DebugInfo, _estimate: &Estimate) {}
}

/// Identifies one registration in observer callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugInfo {
    pub index: usize,
    pub name: String,
    /// Known ground truth, when the caller has one.
    pub true_shift: Option<Shift>,
    /// Where file-writing observers should put their output.
    pub output_dir: Option<PathBuf>,
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self {
            index: 0,
            name: "phasereg".into(),
            true_shift: None,
            output_dir: None,
        }
    }
}

/// A [`DebugInfo`] paired with the observer that should receive the callbacks.
pub struct DebugContext<'a, F: Precision = f64> {
    pub info: DebugInfo,
    pub observer: &'a dyn RegistrationObserver<F>,
}

impl<'a, F: Precision> DebugContext<'a, F> {
    pub fn new(observer: &'a dyn RegistrationObserver<F>) -> Self {
        Self {
            info: DebugInfo::default(),
            observer,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.info.index = index;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.info.name = name.into();
        self
    }

    pub fn with_true_shift(mut self, shift: Shift) -> Self {
        self.info.true_shift = Some(shift);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.info.output_dir = Some(dir.into());
        self
    }
}
