//! Iterative centroid refinement on the upsampled neighborhood (L2U).
//!
//! A window of `ratio * L2U` pixels (L1) starts at the L2U center and is
//! moved onto its own weighted centroid until the centroid lies within half
//! a pixel of the window center. An attempt that leaves L2U, produces an
//! undefined centroid, or runs out of iterations is retried with a smaller
//! ratio.

use std::borrow::Cow;

use ndarray::ArrayView2;
use tracing::debug;

use crate::config::RegistrationConfig;
use crate::consts::{CENTROID_RATIO_STEP, CONVERGENCE_THRESHOLD, MIN_CENTROID_WINDOW};
use crate::correlation::Peak;
use crate::masks::centroid_mask;
use crate::neighborhood::{crop, fit_neighborhood, is_out_of_bounds};
use crate::observer::DebugContext;
use crate::precision::Precision;
use crate::shift::Shift;

/// L1 window size for `ratio`: `floor(ratio * upsampled_size)`, bumped to odd.
///
/// Non-positive results mean no window fits.
pub fn centroid_window_size(upsampled_size: usize, ratio: f64) -> isize {
    let size = (ratio * upsampled_size as f64).floor() as isize;
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Weighted centroid `(row, col)` of `patch`, in patch coordinates.
///
/// Returns `None` when the total weight is zero or the result is not finite.
pub fn centroid<F: Precision>(
    patch: ArrayView2<'_, F>,
    weights: Option<ArrayView2<'_, F>>,
) -> Option<(f64, f64)> {
    let mut m00 = 0.0f64;
    let mut m10 = 0.0f64;
    let mut m01 = 0.0f64;
    for ((r, c), &value) in patch.indexed_iter() {
        let weight = weights.as_ref().map_or(1.0, |w| w[[r, c]].as_f64());
        let v = value.as_f64() * weight;
        m00 += v;
        m10 += c as f64 * v;
        m01 += r as f64 * v;
    }

    if m00 == 0.0 || !m00.is_finite() {
        return None;
    }
    let row = m01 / m00;
    let col = m10 / m00;
    (row.is_finite() && col.is_finite()).then_some((row, col))
}

/// Why a single refinement attempt was abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefinementFailure {
    WindowTooSmall,
    OutOfBounds,
    UndefinedCentroid,
    NotConverged,
}

impl std::fmt::Display for RefinementFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WindowTooSmall => write!(f, "window too small"),
            Self::OutOfBounds => write!(f, "window left the upsampled neighborhood"),
            Self::UndefinedCentroid => write!(f, "undefined centroid"),
            Self::NotConverged => write!(f, "iteration limit reached"),
        }
    }
}

/// Result of refining one upsampled neighborhood.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Refinement {
    /// `offset` is in L2U pixels relative to the L2U center.
    Converged {
        offset: Shift,
        ratio: f64,
        iterations: usize,
    },
    Diverged,
}

/// Run the ratio back-off loop over `upsampled`.
pub fn refine<F: Precision>(
    upsampled: ArrayView2<'_, F>,
    config: &RegistrationConfig<F>,
    debug_ctx: Option<&DebugContext<'_, F>>,
) -> Refinement {
    let mut ratio = config.centroid_ratio();
    loop {
        let size = centroid_window_size(upsampled.ncols(), ratio);
        if size <= 0 {
            break;
        }

        match attempt(upsampled, size as usize, ratio, config, debug_ctx) {
            Ok((offset, iterations)) => {
                debug!(ratio, iterations, size, "Centroid refinement converged");
                return Refinement::Converged {
                    offset,
                    ratio,
                    iterations,
                };
            }
            Err(failure) => {
                debug!(ratio, size, %failure, "Centroid refinement attempt failed");
                if let Some(ctx) = debug_ctx {
                    ctx.observer.attempt_failed(&ctx.info, ratio, failure);
                }
            }
        }
        ratio -= CENTROID_RATIO_STEP;
    }
    Refinement::Diverged
}

fn attempt<F: Precision>(
    upsampled: ArrayView2<'_, F>,
    size: usize,
    ratio: f64,
    config: &RegistrationConfig<F>,
    debug_ctx: Option<&DebugContext<'_, F>>,
) -> std::result::Result<(Shift, usize), RefinementFailure> {
    if size < MIN_CENTROID_WINDOW {
        return Err(RefinementFailure::WindowTooSmall);
    }

    let mask = if config.centroid().nrows() == size {
        Cow::Borrowed(config.centroid())
    } else {
        Cow::Owned(centroid_mask(config.centroid_window_kind(), size))
    };

    let (rows, cols) = upsampled.dim();
    let mid = Peak::center(rows, cols);
    let half = (size / 2) as f64;
    let mut row = mid.row as isize;
    let mut col = mid.col as isize;

    for iteration in 0..config.max_iterations() {
        if is_out_of_bounds(row, col, rows, cols, size) {
            return Err(RefinementFailure::OutOfBounds);
        }

        let window = crop(upsampled, row as usize, col as usize, size);
        if let Some(ctx) = debug_ctx {
            ctx.observer.centroid_window(&ctx.info, window, ratio, iteration);
        }

        let (c_row, c_col) =
            centroid(window, Some(mask.view())).ok_or(RefinementFailure::UndefinedCentroid)?;
        let d_row = c_row - half;
        let d_col = c_col - half;
        // Near-zero total weight yields steps far outside the surface.
        if !(d_row.abs() <= rows as f64 && d_col.abs() <= cols as f64) {
            return Err(RefinementFailure::OutOfBounds);
        }
        row += d_row.round() as isize;
        col += d_col.round() as isize;

        if d_row.abs() < CONVERGENCE_THRESHOLD && d_col.abs() < CONVERGENCE_THRESHOLD {
            let offset = Shift::new(
                (col - mid.col as isize) as f64 + d_col,
                (row - mid.row as isize) as f64 + d_row,
            );
            return Ok((offset, iteration + 1));
        }
    }
    Err(RefinementFailure::NotConverged)
}

/// One-shot centroid of the native-resolution neighborhood around `peak`.
///
/// The neighborhood starts at `size` and shrinks to fit the surface. The
/// returned offset is relative to `peak`; `None` when no neighborhood fits
/// or its centroid is undefined.
pub fn subpixel_offset<F: Precision>(surface: ArrayView2<'_, F>, peak: Peak, size: usize) -> Option<Shift> {
    let (rows, cols) = surface.dim();
    let size = fit_neighborhood(peak, rows, cols, size)?;
    let neighborhood = crop(surface, peak.row, peak.col, size);
    let (c_row, c_col) = centroid(neighborhood, None)?;
    let half = (size / 2) as f64;
    Some(Shift::new(c_col - half, c_row - half))
}
