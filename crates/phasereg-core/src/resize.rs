//! Upsampling of the L2 neighborhood.
//!
//! Resampling is separable. Each output index maps to source coordinate
//! `(dst + 0.5) * scale - 0.5` with `scale = src / dst`, and taps that fall
//! outside the source are clamped to the border.

use ndarray::{Array2, ArrayView2};

use crate::config::InterpolationKind;
use crate::precision::Precision;

const CUBIC_A: f64 = -0.75;

/// Resample `src` to `rows x cols` with the given interpolation.
pub fn resize<F: Precision>(
    src: ArrayView2<'_, F>,
    rows: usize,
    cols: usize,
    kind: InterpolationKind,
) -> Array2<F> {
    let (src_rows, src_cols) = src.dim();
    let row_taps = axis_taps(src_rows, rows, kind);
    let col_taps = axis_taps(src_cols, cols, kind);

    // Horizontal pass: src_rows x cols.
    let horizontal = Array2::from_shape_fn((src_rows, cols), |(r, c)| {
        col_taps[c]
            .iter()
            .map(|&(sc, weight)| src[[r, sc]].as_f64() * weight)
            .sum::<f64>()
    });

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let value: f64 = row_taps[r]
            .iter()
            .map(|&(sr, weight)| horizontal[[sr, c]] * weight)
            .sum();
        F::cast(value)
    })
}

/// Source indices and weights contributing to each destination index.
fn axis_taps(src_len: usize, dst_len: usize, kind: InterpolationKind) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len as isize - 1;
    let clamp = |i: isize| i.clamp(0, last) as usize;

    (0..dst_len)
        .map(|dst| match kind {
            InterpolationKind::NearestNeighbor => {
                let index = (dst as f64 * scale).floor() as isize;
                vec![(clamp(index), 1.0)]
            }
            InterpolationKind::Linear => {
                let x = (dst as f64 + 0.5) * scale - 0.5;
                let x0 = x.floor();
                let t = x - x0;
                let x0 = x0 as isize;
                vec![(clamp(x0), 1.0 - t), (clamp(x0 + 1), t)]
            }
            InterpolationKind::Cubic => {
                let x = (dst as f64 + 0.5) * scale - 0.5;
                let x0 = x.floor();
                let t = x - x0;
                let x0 = x0 as isize;
                let weights = cubic_weights(t);
                (0..4)
                    .map(|k| (clamp(x0 - 1 + k as isize), weights[k]))
                    .collect()
            }
        })
        .collect()
}

/// Keys cubic convolution weights for taps at offsets -1, 0, 1, 2.
fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}
