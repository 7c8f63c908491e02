use ndarray::Array2;

use crate::config::RegistrationConfig;
use crate::consts::CENTROID_RATIO_STEP;
use crate::precision::Precision;
use crate::refine::centroid_window_size;

/// Read-only view of a configuration's cached masks and derived sizes.
#[derive(Clone, Copy, Debug)]
pub struct Diagnostics<'a, F: Precision = f64> {
    config: &'a RegistrationConfig<F>,
}

impl<'a, F: Precision> Diagnostics<'a, F> {
    pub(crate) fn new(config: &'a RegistrationConfig<F>) -> Self {
        Self { config }
    }

    /// Spatial window, `rows x cols`.
    pub fn window_mask(&self) -> &'a Array2<F> {
        self.config.window()
    }

    /// Bandpass filter in DFT layout, `rows x cols`.
    pub fn bandpass_mask(&self) -> &'a Array2<F> {
        self.config.bandpass()
    }

    /// Centroid weighting for the configured ratio.
    pub fn centroid_mask(&self) -> &'a Array2<F> {
        self.config.centroid()
    }

    /// L2U / L2 for a neighborhood of `neighborhood_size`.
    pub fn upsample_coefficient(&self, neighborhood_size: usize) -> f64 {
        self.config.upsampled_size() as f64 / neighborhood_size as f64
    }

    /// L1 window size at `ratio`; non-positive when nothing fits.
    pub fn centroid_window_size(&self, ratio: f64) -> isize {
        centroid_window_size(self.config.upsampled_size(), ratio)
    }

    /// Ratios tried by refinement, in order, with their window sizes.
    pub fn ratio_schedule(&self) -> Vec<(f64, usize)> {
        let mut schedule = Vec::new();
        let mut ratio = self.config.centroid_ratio();
        loop {
            let size = self.centroid_window_size(ratio);
            if size <= 0 {
                break;
            }
            schedule.push((ratio, size as usize));
            ratio -= CENTROID_RATIO_STEP;
        }
        schedule
    }
}
