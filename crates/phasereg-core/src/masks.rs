//! Window, bandpass and centroid masks.
//!
//! All generators are pure. [`RegistrationConfig`](crate::config::RegistrationConfig)
//! caches their output and regenerates a mask when a parameter it depends
//! on changes.

use ndarray::Array2;

use crate::config::{BandpassKind, CentroidWindowKind, WindowKind};
use crate::precision::Precision;
use crate::spectral::ifftshift;

/// Spatial window applied to both input images before the forward transform.
pub fn window_mask<F: Precision>(kind: WindowKind, rows: usize, cols: usize) -> Array2<F> {
    match kind {
        WindowKind::None => Array2::from_elem((rows, cols), F::one()),
        WindowKind::Hann => hann(rows, cols),
    }
}

fn hann<F: Precision>(rows: usize, cols: usize) -> Array2<F> {
    let wy: Vec<f64> = (0..rows).map(|r| hann_coefficient(r, rows)).collect();
    let wx: Vec<f64> = (0..cols).map(|c| hann_coefficient(c, cols)).collect();
    Array2::from_shape_fn((rows, cols), |(r, c)| F::cast(wy[r] * wx[c]))
}

fn hann_coefficient(i: usize, n: usize) -> f64 {
    0.5 * (1.0 - (std::f64::consts::TAU * i as f64 / n as f64).cos())
}

/// Frequency-domain filter multiplied into the cross-power spectrum.
///
/// The filter is evaluated with the zero frequency at `(rows/2, cols/2)`
/// and returned in DFT layout (zero frequency at `[0, 0]`). `rows` and
/// `cols` must both be at least 2.
pub fn bandpass_mask<F: Precision>(
    kind: BandpassKind,
    low: f64,
    high: f64,
    rows: usize,
    cols: usize,
) -> Array2<F> {
    let ones = || Array2::from_elem((rows, cols), F::one());

    if low == 0.0 && high == 0.0 {
        return ones();
    }

    let centered: Array2<f64> = match kind {
        BandpassKind::None => return ones(),
        BandpassKind::Gaussian => {
            if low == 0.0 {
                Array2::from_shape_fn((rows, cols), |(r, c)| {
                    lowpass(radius_sq(r, c, rows, cols), high)
                })
            } else if high == 0.0 {
                Array2::from_shape_fn((rows, cols), |(r, c)| {
                    highpass(radius_sq(r, c, rows, cols), low)
                })
            } else {
                let band = Array2::from_shape_fn((rows, cols), |(r, c)| {
                    let rsq = radius_sq(r, c, rows, cols);
                    lowpass(rsq, high) * highpass(rsq, low)
                });
                normalize_min_max(band)
            }
        }
        BandpassKind::Rectangular => {
            if low >= high {
                return ones();
            }
            Array2::from_shape_fn((rows, cols), |(r, c)| {
                let radius = (0.5 * radius_sq(r, c, rows, cols)).sqrt();
                if low <= radius && radius <= high {
                    1.0
                } else {
                    0.0
                }
            })
        }
    };

    ifftshift(&centered).mapv(F::cast)
}

/// Squared distance from the spectrum center, normalized per axis by the half size.
fn radius_sq(row: usize, col: usize, rows: usize, cols: usize) -> f64 {
    let half_r = (rows / 2) as f64;
    let half_c = (cols / 2) as f64;
    let dr = row as f64 - half_r;
    let dc = col as f64 - half_c;
    dc * dc / (half_c * half_c) + dr * dr / (half_r * half_r)
}

fn lowpass(radius_sq: f64, cutoff: f64) -> f64 {
    (-radius_sq / (2.0 * cutoff * cutoff)).exp()
}

fn highpass(radius_sq: f64, cutoff: f64) -> f64 {
    1.0 - (-radius_sq / (2.0 * cutoff * cutoff)).exp()
}

fn normalize_min_max(mut data: Array2<f64>) -> Array2<f64> {
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range > 0.0 {
        data.mapv_inplace(|v| (v - min) / range);
    }
    data
}

/// Weighting applied to each L1 patch before its centroid is taken.
pub fn centroid_mask<F: Precision>(kind: CentroidWindowKind, size: usize) -> Array2<F> {
    match kind {
        CentroidWindowKind::None => Array2::from_elem((size, size), F::one()),
        CentroidWindowKind::Circular => disk(size, size, 0.5 * size as f64),
        CentroidWindowKind::Gaussian => {
            let sigma = 0.5 * size as f64;
            let mid = (size / 2) as f64;
            Array2::from_shape_fn((size, size), |(r, c)| {
                let dr = r as f64 - mid;
                let dc = c as f64 - mid;
                let dist_sq = dr * dr + dc * dc;
                F::cast((-0.5 * dist_sq / (sigma * sigma)).exp())
            })
        }
    }
}

/// Binary disk centered at `(rows/2, cols/2)`.
///
/// A pixel is inside when its integer squared distance is at most
/// `floor(radius^2)`.
pub fn disk<F: Precision>(rows: usize, cols: usize, radius: f64) -> Array2<F> {
    let radius_sq = (radius * radius).floor() as i64;
    let mid_r = (rows / 2) as i64;
    let mid_c = (cols / 2) as i64;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let dr = r as i64 - mid_r;
        let dc = c as i64 - mid_c;
        if dr * dr + dc * dc <= radius_sq {
            F::one()
        } else {
            F::zero()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_vanishes_at_origin_and_peaks_mid() {
        let w: Array2<f64> = window_mask(WindowKind::Hann, 8, 8);
        assert_eq!(w[[0, 0]], 0.0);
        assert!((w[[4, 4]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn circular_mask_of_seven() {
        let m: Array2<f64> = centroid_mask(CentroidWindowKind::Circular, 7);
        // radius 3.5 -> floor(12.25) = 12
        assert_eq!(m[[3, 3]], 1.0);
        assert_eq!(m[[3, 0]], 1.0);
        assert_eq!(m[[1, 1]], 1.0);
        assert_eq!(m[[0, 0]], 0.0);
        assert_eq!(m[[0, 1]], 0.0);
    }
}
