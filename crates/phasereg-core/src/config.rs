use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BANDPASS_HIGH, DEFAULT_BANDPASS_LOW, DEFAULT_CENTROID_RATIO, DEFAULT_MAX_ITERATIONS,
    DEFAULT_NEIGHBORHOOD_SIZE, DEFAULT_UPSAMPLED_SIZE, MIN_NEIGHBORHOOD_SIZE,
};
use crate::diagnostics::Diagnostics;
use crate::error::{RegistrationError, Result};
use crate::masks::{bandpass_mask, centroid_mask, window_mask};
use crate::precision::Precision;
use crate::refine::centroid_window_size;

/// Frequency-domain filter applied to the cross-power spectrum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandpassKind {
    None,
    Rectangular,
    #[default]
    Gaussian,
}

impl BandpassKind {
    pub const ALL: [Self; 3] = [Self::None, Self::Rectangular, Self::Gaussian];

    /// Variant at `index` in [`Self::ALL`], saturating at the last one.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

impl std::fmt::Display for BandpassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Rectangular => write!(f, "Rect"),
            Self::Gaussian => write!(f, "Gauss"),
        }
    }
}

/// Spatial window applied to the input images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    None,
    #[default]
    Hann,
}

impl WindowKind {
    pub const ALL: [Self; 2] = [Self::None, Self::Hann];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Hann => write!(f, "Hann"),
        }
    }
}

/// Interpolation used to upsample the L2 neighborhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationKind {
    NearestNeighbor,
    #[default]
    Linear,
    Cubic,
}

impl InterpolationKind {
    pub const ALL: [Self; 3] = [Self::NearestNeighbor, Self::Linear, Self::Cubic];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

impl std::fmt::Display for InterpolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NearestNeighbor => write!(f, "NN"),
            Self::Linear => write!(f, "Linear"),
            Self::Cubic => write!(f, "Cubic"),
        }
    }
}

/// Weighting applied to each L1 patch before its centroid is taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentroidWindowKind {
    None,
    #[default]
    Circular,
    Gaussian,
}

impl CentroidWindowKind {
    pub const ALL: [Self; 3] = [Self::None, Self::Circular, Self::Gaussian];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

impl std::fmt::Display for CentroidWindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Circular => write!(f, "Circular"),
            Self::Gaussian => write!(f, "Gaussian"),
        }
    }
}

/// Plain, serializable registration parameters.
///
/// This is what config files and the optimizer manipulate. Turn it into a
/// usable engine with [`RegistrationConfig::from_params`], which validates
/// the values and builds the cached masks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    pub rows: usize,
    pub cols: usize,
    pub bandpass_low: f64,
    pub bandpass_high: f64,
    pub bandpass_kind: BandpassKind,
    pub window_kind: WindowKind,
    /// L2 size. Even values are bumped to the next odd one.
    pub neighborhood_size: usize,
    /// L2U size. Never smaller than `neighborhood_size`.
    pub upsampled_size: usize,
    /// L1 window size as a fraction of `upsampled_size`, in (0, 1).
    pub centroid_ratio: f64,
    pub max_iterations: usize,
    pub cross_power_epsilon: f64,
    pub interpolation_kind: InterpolationKind,
    pub centroid_window_kind: CentroidWindowKind,
    /// Radius around zero shift excluded from the peak search. 0 disables it.
    pub minimal_shift: f64,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            bandpass_low: DEFAULT_BANDPASS_LOW,
            bandpass_high: DEFAULT_BANDPASS_HIGH,
            bandpass_kind: BandpassKind::default(),
            window_kind: WindowKind::default(),
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
            upsampled_size: DEFAULT_UPSAMPLED_SIZE,
            centroid_ratio: DEFAULT_CENTROID_RATIO,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cross_power_epsilon: 0.0,
            interpolation_kind: InterpolationKind::default(),
            centroid_window_kind: CentroidWindowKind::default(),
            minimal_shift: 0.0,
        }
    }
}

impl RegistrationParams {
    /// Default parameters for `rows x cols` images.
    pub fn with_size(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Check every value and bring the tolerated ones into canonical form.
    fn normalized(mut self) -> Result<Self> {
        check_dimensions(self.rows, self.cols)?;
        check_finite("bandpass_low", self.bandpass_low)?;
        check_finite("bandpass_high", self.bandpass_high)?;
        check_finite("cross_power_epsilon", self.cross_power_epsilon)?;
        check_ratio(self.centroid_ratio)?;
        check_iterations(self.max_iterations)?;
        check_minimal_shift(self.minimal_shift)?;

        self.neighborhood_size = odd_neighborhood(self.neighborhood_size)?;
        self.upsampled_size = self.upsampled_size.max(self.neighborhood_size);
        self.bandpass_low = self.bandpass_low.max(0.0);
        self.bandpass_high = self.bandpass_high.max(0.0);
        self.cross_power_epsilon = self.cross_power_epsilon.max(0.0);
        Ok(self)
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows < 2 || cols < 2 {
        return Err(RegistrationError::InvalidDimensions { rows, cols });
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(RegistrationError::InvalidParameter {
            name,
            reason: format!("{value} is not finite"),
        });
    }
    Ok(())
}

fn check_ratio(ratio: f64) -> Result<()> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(RegistrationError::InvalidParameter {
            name: "centroid_ratio",
            reason: format!("{ratio} is outside (0, 1)"),
        });
    }
    Ok(())
}

fn check_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(RegistrationError::InvalidParameter {
            name: "max_iterations",
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

fn check_minimal_shift(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(RegistrationError::InvalidParameter {
            name: "minimal_shift",
            reason: format!("{radius} is not a non-negative radius"),
        });
    }
    Ok(())
}

fn odd_neighborhood(size: usize) -> Result<usize> {
    if size < MIN_NEIGHBORHOOD_SIZE {
        return Err(RegistrationError::InvalidParameter {
            name: "neighborhood_size",
            reason: format!("{size} is smaller than {MIN_NEIGHBORHOOD_SIZE}"),
        });
    }
    Ok(if size % 2 == 1 { size } else { size + 1 })
}

/// Registration engine configuration: parameters plus the masks derived from them.
///
/// Build once and share it across threads; [`calculate`](Self::calculate)
/// only reads it. Setters need `&mut self` and regenerate the masks they
/// affect.
#[derive(Clone, Debug)]
pub struct RegistrationConfig<F: Precision = f64> {
    params: RegistrationParams,
    window: Array2<F>,
    bandpass: Array2<F>,
    centroid: Array2<F>,
}

impl<F: Precision> RegistrationConfig<F> {
    /// Default configuration for `rows x cols` images.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::from_params(RegistrationParams::with_size(rows, cols))
    }

    pub fn from_params(params: RegistrationParams) -> Result<Self> {
        let params = params.normalized()?;
        let mut config = Self {
            params,
            window: Array2::zeros((0, 0)),
            bandpass: Array2::zeros((0, 0)),
            centroid: Array2::zeros((0, 0)),
        };
        config.update_window();
        config.update_bandpass();
        config.update_centroid_mask();
        Ok(config)
    }

    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    pub fn rows(&self) -> usize {
        self.params.rows
    }

    pub fn cols(&self) -> usize {
        self.params.cols
    }

    pub fn bandpass_low(&self) -> f64 {
        self.params.bandpass_low
    }

    pub fn bandpass_high(&self) -> f64 {
        self.params.bandpass_high
    }

    pub fn bandpass_kind(&self) -> BandpassKind {
        self.params.bandpass_kind
    }

    pub fn window_kind(&self) -> WindowKind {
        self.params.window_kind
    }

    pub fn neighborhood_size(&self) -> usize {
        self.params.neighborhood_size
    }

    pub fn upsampled_size(&self) -> usize {
        self.params.upsampled_size
    }

    pub fn centroid_ratio(&self) -> f64 {
        self.params.centroid_ratio
    }

    pub fn max_iterations(&self) -> usize {
        self.params.max_iterations
    }

    pub fn cross_power_epsilon(&self) -> f64 {
        self.params.cross_power_epsilon
    }

    pub fn interpolation_kind(&self) -> InterpolationKind {
        self.params.interpolation_kind
    }

    pub fn centroid_window_kind(&self) -> CentroidWindowKind {
        self.params.centroid_window_kind
    }

    pub fn minimal_shift(&self) -> f64 {
        self.params.minimal_shift
    }

    /// Upsample coefficient for the configured neighborhood size.
    pub fn upsample_coefficient(&self) -> f64 {
        self.params.upsampled_size as f64 / self.params.neighborhood_size as f64
    }

    /// Read-only view of the cached masks and derived quantities.
    pub fn diagnostics(&self) -> Diagnostics<'_, F> {
        Diagnostics::new(self)
    }

    pub fn set_size(&mut self, rows: usize, cols: usize) -> Result<()> {
        check_dimensions(rows, cols)?;
        self.params.rows = rows;
        self.params.cols = cols;
        if self.window.dim() != (rows, cols) {
            self.update_window();
        }
        if self.bandpass.dim() != (rows, cols) {
            self.update_bandpass();
        }
        Ok(())
    }

    /// Set the bandpass cutoffs. Negative values are clamped to zero.
    pub fn set_bandpass_parameters(&mut self, low: f64, high: f64) -> Result<()> {
        check_finite("bandpass_low", low)?;
        check_finite("bandpass_high", high)?;
        self.params.bandpass_low = low.max(0.0);
        self.params.bandpass_high = high.max(0.0);
        self.update_bandpass();
        Ok(())
    }

    pub fn set_bandpass_kind(&mut self, kind: BandpassKind) {
        self.params.bandpass_kind = kind;
        self.update_bandpass();
    }

    pub fn set_window_kind(&mut self, kind: WindowKind) {
        self.params.window_kind = kind;
        self.update_window();
    }

    /// Set the L2 size. Even sizes are bumped to the next odd one and the
    /// L2U size grows to stay at least as large.
    pub fn set_neighborhood_size(&mut self, size: usize) -> Result<()> {
        self.params.neighborhood_size = odd_neighborhood(size)?;
        self.params.upsampled_size = self.params.upsampled_size.max(self.params.neighborhood_size);
        self.update_centroid_mask();
        Ok(())
    }

    /// Set the L2U size, never below the neighborhood size.
    pub fn set_upsampled_size(&mut self, size: usize) {
        self.params.upsampled_size = size.max(self.params.neighborhood_size);
        self.update_centroid_mask();
    }

    pub fn set_centroid_ratio(&mut self, ratio: f64) -> Result<()> {
        check_ratio(ratio)?;
        self.params.centroid_ratio = ratio;
        self.update_centroid_mask();
        Ok(())
    }

    pub fn set_centroid_window_kind(&mut self, kind: CentroidWindowKind) {
        self.params.centroid_window_kind = kind;
        self.update_centroid_mask();
    }

    pub fn set_max_iterations(&mut self, iterations: usize) -> Result<()> {
        check_iterations(iterations)?;
        self.params.max_iterations = iterations;
        Ok(())
    }

    /// Set the cross-power stabilizer. Negative values are clamped to zero.
    pub fn set_cross_power_epsilon(&mut self, epsilon: f64) -> Result<()> {
        check_finite("cross_power_epsilon", epsilon)?;
        self.params.cross_power_epsilon = epsilon.max(0.0);
        Ok(())
    }

    pub fn set_interpolation_kind(&mut self, kind: InterpolationKind) {
        self.params.interpolation_kind = kind;
    }

    pub fn set_minimal_shift(&mut self, radius: f64) -> Result<()> {
        check_minimal_shift(radius)?;
        self.params.minimal_shift = radius;
        Ok(())
    }

    pub(crate) fn window(&self) -> &Array2<F> {
        &self.window
    }

    pub(crate) fn bandpass(&self) -> &Array2<F> {
        &self.bandpass
    }

    pub(crate) fn centroid(&self) -> &Array2<F> {
        &self.centroid
    }

    fn update_window(&mut self) {
        self.window = window_mask(self.params.window_kind, self.params.rows, self.params.cols);
    }

    fn update_bandpass(&mut self) {
        self.bandpass = bandpass_mask(
            self.params.bandpass_kind,
            self.params.bandpass_low,
            self.params.bandpass_high,
            self.params.rows,
            self.params.cols,
        );
    }

    fn update_centroid_mask(&mut self) {
        let size = centroid_window_size(self.params.upsampled_size, self.params.centroid_ratio);
        self.centroid = centroid_mask(self.params.centroid_window_kind, size.max(0) as usize);
    }
}

impl<F: Precision> std::fmt::Display for RegistrationConfig<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = &self.params;
        write!(
            f,
            "Rows: {}, Cols: {}, BPL: {}, BPH: {}, L2size: {}, L1ratio: {}, L2Usize: {}, \
             CPeps: {}, BPT: {}, WinT: {}, IntT: {}, L1WinT: {}",
            p.rows,
            p.cols,
            p.bandpass_low,
            p.bandpass_high,
            p.neighborhood_size,
            p.centroid_ratio,
            p.upsampled_size,
            p.cross_power_epsilon,
            p.bandpass_kind,
            p.window_kind,
            p.interpolation_kind,
            p.centroid_window_kind,
        )
    }
}
