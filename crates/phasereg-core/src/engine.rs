//! End-to-end shift estimation.

use ndarray::{Array2, ArrayView2, ArrayView3, Axis, Zip};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::RegistrationConfig;
use crate::consts::SUBPIXEL_NEIGHBORHOOD_SIZE;
use crate::correlation::{correlation_surface, find_peak, suppress_minimal_shift, Peak};
use crate::cross_power::{cross_power_spectrum, CorrelationMode};
use crate::error::{RegistrationError, Result};
use crate::neighborhood::{crop, fit_neighborhood};
use crate::observer::DebugContext;
use crate::precision::Precision;
use crate::refine::{refine, subpixel_offset, Refinement};
use crate::resize::resize;
use crate::shift::Shift;
use crate::spectral::fft2d;

/// How far the estimate is pushed past the integer correlation peak.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accuracy {
    /// Integer peak position only.
    Pixel,
    /// Centroid of a small native-resolution neighborhood.
    Subpixel,
    /// Iterative centroid refinement on the upsampled neighborhood.
    #[default]
    SubpixelIterative,
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pixel => write!(f, "Pixel"),
            Self::Subpixel => write!(f, "Subpixel"),
            Self::SubpixelIterative => write!(f, "SubpixelIterative"),
        }
    }
}

/// Per-call options for [`RegistrationConfig::calculate_with`].
#[derive(Clone, Copy, Default)]
pub struct CalculateOptions<'a, F: Precision = f64> {
    pub accuracy: Accuracy,
    pub mode: CorrelationMode,
    pub debug: Option<&'a DebugContext<'a, F>>,
}

impl<'a, F: Precision> CalculateOptions<'a, F> {
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_mode(mut self, mode: CorrelationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_debug(mut self, debug: &'a DebugContext<'a, F>) -> Self {
        self.debug = Some(debug);
        self
    }
}

/// Pipeline stage that produced an [`Estimate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EstimateStage {
    /// Integer peak, either requested or because no neighborhood fit.
    Pixel,
    /// One-shot neighborhood centroid, either requested or as the fallback
    /// after iterative refinement failed for every ratio.
    Subpixel,
    /// Iterative refinement converged.
    Iterative { ratio: f64, iterations: usize },
}

impl std::fmt::Display for EstimateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pixel => write!(f, "pixel"),
            Self::Subpixel => write!(f, "subpixel"),
            Self::Iterative { ratio, iterations } => {
                write!(f, "iterative (ratio {ratio:.3}, {iterations} iterations)")
            }
        }
    }
}

/// A shift together with the stage that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub shift: Shift,
    pub stage: EstimateStage,
}

impl<F: Precision> RegistrationConfig<F> {
    /// Shift of `image2` relative to `image1` with default options.
    pub fn calculate<T>(&self, image1: ArrayView2<'_, T>, image2: ArrayView2<'_, T>) -> Result<Shift>
    where
        T: AsPrimitive<F>,
    {
        self.calculate_with(image1, image2, &CalculateOptions::default())
    }

    pub fn calculate_with<T>(
        &self,
        image1: ArrayView2<'_, T>,
        image2: ArrayView2<'_, T>,
        options: &CalculateOptions<'_, F>,
    ) -> Result<Shift>
    where
        T: AsPrimitive<F>,
    {
        self.estimate(image1, image2, options).map(|e| e.shift)
    }

    /// Single-channel images stored as `rows x cols x channels`.
    ///
    /// Any channel count other than one is rejected.
    pub fn calculate_channels<T>(
        &self,
        image1: ArrayView3<'_, T>,
        image2: ArrayView3<'_, T>,
        options: &CalculateOptions<'_, F>,
    ) -> Result<Shift>
    where
        T: AsPrimitive<F>,
    {
        self.estimate_channels(image1, image2, options).map(|e| e.shift)
    }

    /// [`estimate`](Self::estimate) for `rows x cols x channels` images.
    pub fn estimate_channels<T>(
        &self,
        image1: ArrayView3<'_, T>,
        image2: ArrayView3<'_, T>,
        options: &CalculateOptions<'_, F>,
    ) -> Result<Estimate>
    where
        T: AsPrimitive<F>,
    {
        let (rows1, cols1, channels1) = image1.dim();
        let (rows2, cols2, channels2) = image2.dim();
        self.check_input((rows1, cols1), (rows2, cols2))?;
        for channels in [channels1, channels2] {
            if channels != 1 {
                return Err(RegistrationError::Multichannel { channels });
            }
        }
        self.estimate(
            image1.index_axis_move(Axis(2), 0),
            image2.index_axis_move(Axis(2), 0),
            options,
        )
    }

    /// Like [`calculate_with`](Self::calculate_with), also reporting which
    /// stage produced the shift.
    pub fn estimate<T>(
        &self,
        image1: ArrayView2<'_, T>,
        image2: ArrayView2<'_, T>,
        options: &CalculateOptions<'_, F>,
    ) -> Result<Estimate>
    where
        T: AsPrimitive<F>,
    {
        self.check_input(image1.dim(), image2.dim())?;
        let debug_ctx = options.debug;

        let mut image1: Array2<F> = image1.mapv(|v| v.as_());
        let mut image2: Array2<F> = image2.mapv(|v| v.as_());
        if let Some(ctx) = debug_ctx {
            ctx.observer.input_images(&ctx.info, image1.view(), image2.view());
        }

        self.apply_window(&mut image1);
        self.apply_window(&mut image2);
        if let Some(ctx) = debug_ctx {
            ctx.observer.windowed_images(&ctx.info, image1.view(), image2.view());
        }

        let spectrum1 = fft2d(&image1);
        let spectrum2 = fft2d(&image2);
        let cross_power = cross_power_spectrum(
            &spectrum1,
            &spectrum2,
            self.bandpass(),
            self.cross_power_epsilon(),
            options.mode,
        );
        if let Some(ctx) = debug_ctx {
            ctx.observer.cross_power(&ctx.info, cross_power.view());
        }

        let mut surface = correlation_surface(&cross_power);
        if self.minimal_shift() > 0.0 {
            suppress_minimal_shift(&mut surface, self.minimal_shift());
        }

        let peak = find_peak(&surface);
        let (rows, cols) = surface.dim();
        let pixel = peak.offset_from(Peak::center(rows, cols));
        trace!(row = peak.row, col = peak.col, %pixel, "Correlation peak");
        if let Some(ctx) = debug_ctx {
            ctx.observer.correlation_surface(&ctx.info, surface.view(), peak);
        }

        let estimate = match options.accuracy {
            Accuracy::Pixel => Estimate {
                shift: pixel,
                stage: EstimateStage::Pixel,
            },
            Accuracy::Subpixel => {
                one_shot_estimate(surface.view(), peak, pixel, SUBPIXEL_NEIGHBORHOOD_SIZE)
            }
            Accuracy::SubpixelIterative => self.iterative_estimate(surface.view(), peak, pixel, debug_ctx),
        };

        let estimate = if estimate.shift.is_finite() {
            estimate
        } else {
            debug!(shift = %estimate.shift, "Non-finite estimate, using pixel shift");
            Estimate {
                shift: pixel,
                stage: EstimateStage::Pixel,
            }
        };
        if let Some(ctx) = debug_ctx {
            ctx.observer.finished(&ctx.info, &estimate);
        }
        Ok(estimate)
    }

    fn check_input(&self, dim1: (usize, usize), dim2: (usize, usize)) -> Result<()> {
        let (rows1, cols1) = dim1;
        let (rows2, cols2) = dim2;
        if rows1 != self.rows() || cols1 != self.cols() {
            return Err(RegistrationError::UnexpectedSize {
                rows: rows1,
                cols: cols1,
                expected_rows: self.rows(),
                expected_cols: self.cols(),
            });
        }
        if dim1 != dim2 {
            return Err(RegistrationError::SizeMismatch {
                rows1,
                cols1,
                rows2,
                cols2,
            });
        }
        Ok(())
    }

    fn apply_window(&self, image: &mut Array2<F>) {
        Zip::from(image).and(self.window()).for_each(|v, &w| *v = *v * w);
    }

    fn iterative_estimate(
        &self,
        surface: ArrayView2<'_, F>,
        peak: Peak,
        pixel: Shift,
        debug_ctx: Option<&DebugContext<'_, F>>,
    ) -> Estimate {
        let (rows, cols) = surface.dim();
        let Some(size) = fit_neighborhood(peak, rows, cols, self.neighborhood_size()) else {
            debug!(row = peak.row, col = peak.col, "Peak too close to the border, using pixel shift");
            return Estimate {
                shift: pixel,
                stage: EstimateStage::Pixel,
            };
        };

        let neighborhood = crop(surface, peak.row, peak.col, size);
        if let Some(ctx) = debug_ctx {
            ctx.observer.neighborhood(&ctx.info, neighborhood);
        }

        let upsampled_size = self.upsampled_size();
        let upsampled = resize(neighborhood, upsampled_size, upsampled_size, self.interpolation_kind());
        if let Some(ctx) = debug_ctx {
            ctx.observer.upsampled_neighborhood(&ctx.info, upsampled.view());
        }

        match refine(upsampled.view(), self, debug_ctx) {
            Refinement::Converged {
                offset,
                ratio,
                iterations,
            } => {
                let coefficient = upsampled_size as f64 / size as f64;
                Estimate {
                    shift: pixel + offset / coefficient,
                    stage: EstimateStage::Iterative { ratio, iterations },
                }
            }
            Refinement::Diverged => {
                debug!("Centroid refinement diverged, using one-shot subpixel estimate");
                one_shot_estimate(surface, peak, pixel, size)
            }
        }
    }
}

fn one_shot_estimate<F: Precision>(surface: ArrayView2<'_, F>, peak: Peak, pixel: Shift, size: usize) -> Estimate {
    match subpixel_offset(surface, peak, size) {
        Some(offset) => Estimate {
            shift: pixel + offset,
            stage: EstimateStage::Subpixel,
        },
        None => Estimate {
            shift: pixel,
            stage: EstimateStage::Pixel,
        },
    }
}
