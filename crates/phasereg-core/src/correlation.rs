//! Correlation surface (L3) construction and peak search.

use ndarray::Array2;
use num_complex::Complex;

use crate::masks::disk;
use crate::precision::Precision;
use crate::shift::Shift;
use crate::spectral::{fftshift, ifft2d_real};

/// Integer position on a correlation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peak {
    pub row: usize,
    pub col: usize,
}

impl Peak {
    /// Center of a `rows x cols` surface, where zero shift lands.
    pub fn center(rows: usize, cols: usize) -> Self {
        Self {
            row: rows / 2,
            col: cols / 2,
        }
    }

    /// Signed offset of this peak from `origin`.
    pub fn offset_from(&self, origin: Peak) -> Shift {
        Shift::new(
            self.col as f64 - origin.col as f64,
            self.row as f64 - origin.row as f64,
        )
    }
}

/// Real part of the inverse transform, quadrant-shifted so zero shift is
/// at the center `(rows/2, cols/2)`.
pub fn correlation_surface<F: Precision>(cross_power: &Array2<Complex<F>>) -> Array2<F> {
    fftshift(&ifft2d_real(cross_power))
}

/// Position of the maximum. Ties go to the first one in row-major order;
/// NaN entries never win.
pub fn find_peak<F: Precision>(surface: &Array2<F>) -> Peak {
    let mut best = F::neg_infinity();
    let mut peak = Peak { row: 0, col: 0 };
    for ((row, col), &value) in surface.indexed_iter() {
        if value > best {
            best = value;
            peak = Peak { row, col };
        }
    }
    peak
}

/// Zero out the disk of `radius` around the surface center so that shifts
/// shorter than the radius cannot be picked.
pub fn suppress_minimal_shift<F: Precision>(surface: &mut Array2<F>, radius: f64) {
    let (rows, cols) = surface.dim();
    let mask: Array2<F> = disk(rows, cols, radius);
    surface.zip_mut_with(&mask, |v, &m| *v = *v * (F::one() - m));
}
