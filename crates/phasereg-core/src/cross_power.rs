use ndarray::{Array2, Zip};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::precision::Precision;

/// How the two spectra are combined before the inverse transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationMode {
    /// Magnitude-normalized cross-power (phase correlation).
    #[default]
    Phase,
    /// Raw cross-power without normalization.
    Cross,
}

impl std::fmt::Display for CorrelationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phase => write!(f, "Phase"),
            Self::Cross => write!(f, "Cross"),
        }
    }
}

/// Bandpass-filtered cross-power spectrum `conj(F1) * F2`.
///
/// With this ordering the correlation peak sits at `+d` when the second
/// image is the first one moved by `d`. In [`CorrelationMode::Phase`] each
/// bin is divided by `|conj(F1) * F2| + epsilon * rows * cols`; bins whose
/// divisor is zero come out as zero.
pub fn cross_power_spectrum<F: Precision>(
    spectrum1: &Array2<Complex<F>>,
    spectrum2: &Array2<Complex<F>>,
    bandpass: &Array2<F>,
    epsilon: f64,
    mode: CorrelationMode,
) -> Array2<Complex<F>> {
    let (h, w) = spectrum1.dim();
    let epsilon = F::cast(epsilon * (h * w) as f64);

    let combine = move |a: &Complex<F>, b: &Complex<F>, band: &F| {
        let cross = a.conj() * b;
        match mode {
            CorrelationMode::Cross => cross * *band,
            CorrelationMode::Phase => {
                let denom = cross.norm() + epsilon;
                if denom > F::zero() {
                    cross / denom * *band
                } else {
                    Complex::new(F::zero(), F::zero())
                }
            }
        }
    };

    let zip = Zip::from(spectrum1).and(spectrum2).and(bandpass);
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_map_collect(combine)
    } else {
        zip.map_collect(combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_bins_have_unit_magnitude() {
        let s1 = Array2::from_shape_fn((4, 4), |(r, c)| Complex::new(1.0 + r as f64, c as f64));
        let s2 = Array2::from_shape_fn((4, 4), |(r, c)| Complex::new(c as f64 - 1.5, 2.0 + r as f64));
        let band = Array2::from_elem((4, 4), 1.0);
        let cp = cross_power_spectrum(&s1, &s2, &band, 0.0, CorrelationMode::Phase);
        for v in cp.iter() {
            assert!((v.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_bins_stay_zero() {
        let s = Array2::from_elem((2, 2), Complex::new(0.0f32, 0.0));
        let band = Array2::from_elem((2, 2), 1.0f32);
        let cp = cross_power_spectrum(&s, &s, &band, 0.0, CorrelationMode::Phase);
        assert!(cp.iter().all(|v| v.re == 0.0 && v.im == 0.0));
    }
}
