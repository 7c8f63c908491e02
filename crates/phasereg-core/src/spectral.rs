//! 2D discrete Fourier transforms and quadrant shifts.
//!
//! Transforms are separable: every row, then every column (inverse runs the
//! other way round). Large arrays process their lanes with Rayon.

use std::sync::Arc;

use ndarray::{Array2, ArrayViewMut1, Axis};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::precision::Precision;

/// 2D forward FFT of a real array. The spectrum is not normalized.
pub fn fft2d<F: Precision>(data: &Array2<F>) -> Array2<Complex<F>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::<F>::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v, F::zero()));
    transform_lanes(&mut result, Axis(0), &fft_row);
    transform_lanes(&mut result, Axis(1), &fft_col);
    result
}

/// 2D inverse FFT, returning the real part normalized by `1/(h*w)`.
pub fn ifft2d_real<F: Precision>(data: &Array2<Complex<F>>) -> Array2<F> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::<F>::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();
    transform_lanes(&mut work, Axis(1), &ifft_col);
    transform_lanes(&mut work, Axis(0), &ifft_row);

    let scale = F::one() / F::cast((h * w) as f64);
    work.mapv(|v| v.re * scale)
}

/// Run `fft` over every lane of `data`. `Axis(0)` yields rows, `Axis(1)` columns.
fn transform_lanes<F: Precision>(data: &mut Array2<Complex<F>>, axis: Axis, fft: &Arc<dyn Fft<F>>) {
    let (h, w) = data.dim();
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(axis)
            .into_par_iter()
            .for_each(|mut lane| process_lane(&mut lane, fft));
    } else {
        for mut lane in data.axis_iter_mut(axis) {
            process_lane(&mut lane, fft);
        }
    }
}

fn process_lane<F: Precision>(lane: &mut ArrayViewMut1<Complex<F>>, fft: &Arc<dyn Fft<F>>) {
    let mut buffer = lane.to_vec();
    fft.process(&mut buffer);
    for (dst, src) in lane.iter_mut().zip(buffer) {
        *dst = src;
    }
}

/// Move the zero-frequency element from `[0, 0]` to `[h/2, w/2]`.
pub fn fftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        data[[(r + h - h / 2) % h, (c + w - w / 2) % w]].clone()
    })
}

/// Inverse of [`fftshift`]: move `[h/2, w/2]` back to `[0, 0]`.
pub fn ifftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| data[[(r + h / 2) % h, (c + w / 2) % w]].clone())
}
