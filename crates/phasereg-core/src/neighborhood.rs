//! Square neighborhoods (L2) around a correlation peak.

use ndarray::{s, ArrayView2};

use crate::consts::MIN_NEIGHBORHOOD_SIZE;
use crate::correlation::Peak;

/// True when a `size x size` square centered on `(row, col)` leaves a
/// `rows x cols` surface.
pub fn is_out_of_bounds(row: isize, col: isize, rows: usize, cols: usize, size: usize) -> bool {
    let half = (size / 2) as isize;
    col - half < 0 || row - half < 0 || col + half >= cols as isize || row + half >= rows as isize
}

/// Largest odd size, starting at `size` and shrinking by 2, whose square
/// around `peak` fits inside the surface. `None` once it would drop below 3.
pub fn fit_neighborhood(peak: Peak, rows: usize, cols: usize, size: usize) -> Option<usize> {
    let mut size = size;
    while size >= MIN_NEIGHBORHOOD_SIZE {
        if !is_out_of_bounds(peak.row as isize, peak.col as isize, rows, cols, size) {
            return Some(size);
        }
        size -= 2;
    }
    None
}

/// View of the `size x size` square centered on `(row, col)`.
///
/// The square must be in bounds; check with [`is_out_of_bounds`] first.
pub fn crop<'a, F>(surface: ArrayView2<'a, F>, row: usize, col: usize, size: usize) -> ArrayView2<'a, F> {
    let top = row - size / 2;
    let left = col - size / 2;
    surface.slice_move(s![top..top + size, left..left + size])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn bounds_are_inclusive_of_last_index() {
        assert!(!is_out_of_bounds(3, 3, 7, 7, 7));
        assert!(is_out_of_bounds(3, 4, 7, 7, 7));
        assert!(is_out_of_bounds(2, 3, 7, 7, 7));
    }

    #[test]
    fn neighborhood_shrinks_near_edge() {
        let peak = Peak { row: 1, col: 10 };
        assert_eq!(fit_neighborhood(peak, 20, 20, 7), Some(3));
        let corner = Peak { row: 0, col: 0 };
        assert_eq!(fit_neighborhood(corner, 20, 20, 7), None);
    }

    #[test]
    fn crop_is_centered() {
        let surface = Array2::from_shape_fn((6, 6), |(r, c)| (r * 6 + c) as f64);
        let l2 = crop(surface.view(), 2, 3, 3);
        assert_eq!(l2.dim(), (3, 3));
        assert_eq!(l2[[1, 1]], surface[[2, 3]]);
        assert_eq!(l2[[0, 0]], surface[[1, 2]]);
    }
}
