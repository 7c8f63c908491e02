//! Objective functions for tuning registration parameters.
//!
//! The optimizer itself lives outside this crate. It sees a configuration
//! as a flat vector of [`OptimizedParameter::COUNT`] reals bounded by
//! [`LOWER_BOUNDS`] and [`UPPER_BOUNDS`], and minimizes the mean shift
//! error over a set of [`ImagePair`]s with known shifts.

use ndarray::Array2;
use num_traits::AsPrimitive;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{
    BandpassKind, CentroidWindowKind, InterpolationKind, RegistrationConfig, RegistrationParams,
    WindowKind,
};
use crate::consts::{MIN_CENTROID_WINDOW, PARALLEL_PAIR_THRESHOLD};
use crate::engine::{Accuracy, CalculateOptions};
use crate::error::{RegistrationError, Result};
use crate::precision::Precision;
use crate::shift::Shift;

/// Two images and the shift of the second relative to the first.
#[derive(Clone, Debug)]
pub struct ImagePair<T = f64> {
    pub image1: Array2<T>,
    pub image2: Array2<T>,
    pub shift: Shift,
}

/// Position of each tuned parameter in the optimizer's vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptimizedParameter {
    BandpassKind,
    BandpassLow,
    BandpassHigh,
    InterpolationKind,
    WindowKind,
    UpsampledSize,
    CentroidRatio,
    CrossPowerEpsilon,
    CentroidWindowKind,
}

impl OptimizedParameter {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::BandpassKind,
        Self::BandpassLow,
        Self::BandpassHigh,
        Self::InterpolationKind,
        Self::WindowKind,
        Self::UpsampledSize,
        Self::CentroidRatio,
        Self::CrossPowerEpsilon,
        Self::CentroidWindowKind,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BandpassKind => "BPT",
            Self::BandpassLow => "BPL",
            Self::BandpassHigh => "BPH",
            Self::InterpolationKind => "IntT",
            Self::WindowKind => "WinT",
            Self::UpsampledSize => "L2Usize",
            Self::CentroidRatio => "L1ratio",
            Self::CrossPowerEpsilon => "CPeps",
            Self::CentroidWindowKind => "L1WinT",
        }
    }
}

/// Lower search bounds, indexed by [`OptimizedParameter::index`].
pub const LOWER_BOUNDS: [f64; OptimizedParameter::COUNT] =
    [0.0, -0.5, 0.0, 0.0, 0.0, 21.0, 0.1, -1e-4, 0.0];

/// Upper search bounds. Kind parameters stay just below their variant count
/// so truncation never overflows.
pub const UPPER_BOUNDS: [f64; OptimizedParameter::COUNT] = [
    BandpassKind::ALL.len() as f64 - 1e-8,
    0.5,
    2.0,
    InterpolationKind::ALL.len() as f64 - 1e-8,
    WindowKind::ALL.len() as f64 - 1e-8,
    501.0,
    0.8,
    1e-4,
    CentroidWindowKind::ALL.len() as f64 - 1e-8,
];

fn kind_index(value: f64) -> usize {
    value.max(0.0) as usize
}

/// Build a configuration from an optimizer vector.
///
/// Size, neighborhood size, iteration cap and minimal shift come from
/// `base`; the rest is read from `values`. Out-of-range values are handled
/// like the corresponding setters: negative cutoffs and epsilon clamp to
/// zero, kind indices truncate.
pub fn config_from_parameters<F: Precision>(
    base: &RegistrationConfig<F>,
    values: &[f64],
) -> Result<RegistrationConfig<F>> {
    if values.len() < OptimizedParameter::COUNT {
        return Err(RegistrationError::ParameterCount {
            got: values.len(),
            expected: OptimizedParameter::COUNT,
        });
    }
    let value = |p: OptimizedParameter| values[p.index()];

    let params = RegistrationParams {
        bandpass_kind: BandpassKind::from_index(kind_index(value(OptimizedParameter::BandpassKind))),
        bandpass_low: value(OptimizedParameter::BandpassLow),
        bandpass_high: value(OptimizedParameter::BandpassHigh),
        interpolation_kind: InterpolationKind::from_index(kind_index(value(
            OptimizedParameter::InterpolationKind,
        ))),
        window_kind: WindowKind::from_index(kind_index(value(OptimizedParameter::WindowKind))),
        upsampled_size: value(OptimizedParameter::UpsampledSize).max(0.0) as usize,
        centroid_ratio: value(OptimizedParameter::CentroidRatio),
        cross_power_epsilon: value(OptimizedParameter::CrossPowerEpsilon),
        centroid_window_kind: CentroidWindowKind::from_index(kind_index(value(
            OptimizedParameter::CentroidWindowKind,
        ))),
        ..base.params().clone()
    };
    RegistrationConfig::from_params(params)
}

/// Parameter vector describing `config`, the inverse of [`config_from_parameters`].
pub fn parameters_from_config<F: Precision>(config: &RegistrationConfig<F>) -> Vec<f64> {
    let index_of = |i: Option<usize>| i.unwrap_or(0) as f64;
    OptimizedParameter::ALL
        .iter()
        .map(|p| match p {
            OptimizedParameter::BandpassKind => {
                index_of(BandpassKind::ALL.iter().position(|&k| k == config.bandpass_kind()))
            }
            OptimizedParameter::BandpassLow => config.bandpass_low(),
            OptimizedParameter::BandpassHigh => config.bandpass_high(),
            OptimizedParameter::InterpolationKind => index_of(
                InterpolationKind::ALL
                    .iter()
                    .position(|&k| k == config.interpolation_kind()),
            ),
            OptimizedParameter::WindowKind => {
                index_of(WindowKind::ALL.iter().position(|&k| k == config.window_kind()))
            }
            OptimizedParameter::UpsampledSize => config.upsampled_size() as f64,
            OptimizedParameter::CentroidRatio => config.centroid_ratio(),
            OptimizedParameter::CrossPowerEpsilon => config.cross_power_epsilon(),
            OptimizedParameter::CentroidWindowKind => index_of(
                CentroidWindowKind::ALL
                    .iter()
                    .position(|&k| k == config.centroid_window_kind()),
            ),
        })
        .collect()
}

/// Shifts of every pair at the given accuracy, in pair order.
pub fn calculate_shifts<F, T>(
    config: &RegistrationConfig<F>,
    pairs: &[ImagePair<T>],
    accuracy: Accuracy,
) -> Result<Vec<Shift>>
where
    F: Precision,
    T: AsPrimitive<F> + Send + Sync,
{
    let options = CalculateOptions::default().with_accuracy(accuracy);
    let shift_of = |pair: &ImagePair<T>| {
        config.calculate_with(pair.image1.view(), pair.image2.view(), &options)
    };

    if pairs.len() >= PARALLEL_PAIR_THRESHOLD {
        pairs.par_iter().map(shift_of).collect()
    } else {
        pairs.iter().map(shift_of).collect()
    }
}

/// Reference shifts of every pair, in pair order.
pub fn reference_shifts<T>(pairs: &[ImagePair<T>]) -> Vec<Shift> {
    pairs.iter().map(|pair| pair.shift).collect()
}

/// Mean magnitude of `calculated - reference`.
pub fn average_error(reference: &[Shift], calculated: &[Shift]) -> Result<f64> {
    if reference.len() != calculated.len() {
        return Err(RegistrationError::ShiftCountMismatch {
            reference: reference.len(),
            calculated: calculated.len(),
        });
    }
    if reference.is_empty() {
        return Err(RegistrationError::EmptyPairs);
    }
    let total: f64 = reference
        .iter()
        .zip(calculated)
        .map(|(&r, &c)| (c - r).magnitude())
        .sum();
    Ok(total / reference.len() as f64)
}

/// Mean error of `config` over `pairs` with full iterative accuracy.
pub fn mean_error<F, T>(config: &RegistrationConfig<F>, pairs: &[ImagePair<T>]) -> Result<f64>
where
    F: Precision,
    T: AsPrimitive<F> + Send + Sync,
{
    let shifts = calculate_shifts(config, pairs, Accuracy::SubpixelIterative)?;
    average_error(&reference_shifts(pairs), &shifts)
}

/// Objective over optimizer vectors: mean shift error of the configuration
/// each vector describes.
///
/// Vectors that do not form a valid configuration, or whose L1 window would
/// be smaller than the minimum, score `f64::MAX`.
pub fn objective_function<'a, F, T>(
    base: &'a RegistrationConfig<F>,
    pairs: &'a [ImagePair<T>],
) -> impl Fn(&[f64]) -> f64 + Send + Sync + 'a
where
    F: Precision,
    T: AsPrimitive<F> + Send + Sync,
{
    objective_function_with(base, move |config| mean_error(config, pairs))
}

/// Objective over optimizer vectors with a caller-supplied error measure.
pub fn objective_function_with<'a, F, E>(
    base: &'a RegistrationConfig<F>,
    error: E,
) -> impl Fn(&[f64]) -> f64 + Send + Sync + 'a
where
    F: Precision,
    E: Fn(&RegistrationConfig<F>) -> Result<f64> + Send + Sync + 'a,
{
    move |values: &[f64]| {
        let config = match config_from_parameters(base, values) {
            Ok(config) => config,
            Err(err) => {
                debug!(%err, "Rejected parameter vector");
                return f64::MAX;
            }
        };
        let window = (config.upsampled_size() as f64 * config.centroid_ratio()).floor();
        if window < MIN_CENTROID_WINDOW as f64 {
            return f64::MAX;
        }
        match error(&config) {
            Ok(value) if value.is_finite() => value,
            Ok(_) => f64::MAX,
            Err(err) => {
                debug!(%err, "Objective evaluation failed");
                f64::MAX
            }
        }
    }
}

/// Replace `config`'s tuned parameters with the optimizer's result.
pub fn apply_optimal_parameters<F: Precision>(
    config: &mut RegistrationConfig<F>,
    values: &[f64],
) -> Result<()> {
    let optimized = config_from_parameters(config, values)?;
    info!(before = %config, after = %optimized, "Applying optimal parameters");
    *config = optimized;
    Ok(())
}
