//! Observer that dumps intermediate arrays as PNG files.

use std::path::PathBuf;

use anyhow::Result;
use ndarray::ArrayView2;
use num_complex::Complex;
use phasereg_core::correlation::Peak;
use phasereg_core::spectral::fftshift;
use phasereg_core::{DebugInfo, Estimate, RegistrationObserver};
use serde::Serialize;
use tracing::{debug, warn};

use crate::io::save_png_normalized;

/// Writes every stage of a registration into `DebugInfo::output_dir`.
///
/// Files are named `<name>_<index>_<stage>.png`. Registrations without an
/// output directory are ignored.
#[derive(Default)]
pub struct PngDumpObserver;

#[derive(Serialize)]
struct DebugReport {
    name: String,
    index: usize,
    dx: f64,
    dy: f64,
    stage: String,
    true_dx: Option<f64>,
    true_dy: Option<f64>,
    error: Option<f64>,
}

impl PngDumpObserver {
    fn path(info: &DebugInfo, stage: &str, extension: &str) -> Option<PathBuf> {
        let dir = info.output_dir.as_ref()?;
        Some(dir.join(format!("{}_{}_{}.{}", info.name, info.index, stage, extension)))
    }

    fn dump(info: &DebugInfo, stage: &str, data: ArrayView2<f64>) {
        let Some(path) = Self::path(info, stage, "png") else {
            return;
        };
        if let Err(err) = save_png_normalized(data, &path) {
            warn!("Debug dump of {stage} failed: {err:#}");
        } else {
            debug!(path = %path.display(), "Wrote debug image");
        }
    }

    fn write_report(info: &DebugInfo, estimate: &Estimate) -> Result<()> {
        let Some(path) = Self::path(info, "estimate", "toml") else {
            return Ok(());
        };
        let report = DebugReport {
            name: info.name.clone(),
            index: info.index,
            dx: estimate.shift.dx,
            dy: estimate.shift.dy,
            stage: estimate.stage.to_string(),
            true_dx: info.true_shift.map(|s| s.dx),
            true_dy: info.true_shift.map(|s| s.dy),
            error: info.true_shift.map(|s| (estimate.shift - s).magnitude()),
        };
        std::fs::write(&path, toml::to_string_pretty(&report)?)?;
        Ok(())
    }
}

impl RegistrationObserver for PngDumpObserver {
    fn input_images(&self, info: &DebugInfo, image1: ArrayView2<f64>, image2: ArrayView2<f64>) {
        Self::dump(info, "image1", image1);
        Self::dump(info, "image2", image2);
    }

    fn windowed_images(&self, info: &DebugInfo, image1: ArrayView2<f64>, image2: ArrayView2<f64>) {
        Self::dump(info, "windowed1", image1);
        Self::dump(info, "windowed2", image2);
    }

    fn cross_power(&self, info: &DebugInfo, spectrum: ArrayView2<Complex<f64>>) {
        let phase = fftshift(&spectrum.mapv(|v| v.arg()));
        Self::dump(info, "cross_power_phase", phase.view());
    }

    fn correlation_surface(&self, info: &DebugInfo, surface: ArrayView2<f64>, peak: Peak) {
        debug!(row = peak.row, col = peak.col, "Dumping correlation surface");
        Self::dump(info, "l3", surface);
    }

    fn neighborhood(&self, info: &DebugInfo, l2: ArrayView2<f64>) {
        Self::dump(info, "l2", l2);
    }

    fn upsampled_neighborhood(&self, info: &DebugInfo, l2u: ArrayView2<f64>) {
        Self::dump(info, "l2u", l2u);
    }

    fn centroid_window(&self, info: &DebugInfo, l1: ArrayView2<f64>, ratio: f64, iteration: usize) {
        Self::dump(info, &format!("l1_r{ratio:.3}_i{iteration}"), l1);
    }

    fn finished(&self, info: &DebugInfo, estimate: &Estimate) {
        if let Err(err) = Self::write_report(info, estimate) {
            warn!("Debug report failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use phasereg_core::{CalculateOptions, DebugContext, RegistrationConfig, Shift};

    fn spot(rows: usize, cols: usize, row: f64, col: f64) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| {
            let dr = r as f64 - row;
            let dc = c as f64 - col;
            (-(dr * dr + dc * dc) / 8.0).exp()
        })
    }

    #[test]
    fn test_dump_writes_stage_images() {
        let dir = tempfile::tempdir().unwrap();
        let image1 = spot(32, 32, 14.0, 15.0) + spot(32, 32, 20.0, 9.0);
        let image2 = spot(32, 32, 15.0, 17.0) + spot(32, 32, 21.0, 11.0);
        let config = RegistrationConfig::<f64>::new(32, 32).unwrap();

        let ctx = DebugContext::<f64>::new(&PngDumpObserver)
            .with_name("pair")
            .with_true_shift(Shift::new(2.0, 1.0))
            .with_output_dir(dir.path());
        config
            .calculate_with(
                image1.view(),
                image2.view(),
                &CalculateOptions::default().with_debug(&ctx),
            )
            .unwrap();

        for stage in ["image1", "windowed2", "cross_power_phase", "l3", "l2", "l2u"] {
            let path = dir.path().join(format!("pair_0_{stage}.png"));
            assert!(path.exists(), "missing {}", path.display());
        }
        let report = std::fs::read_to_string(dir.path().join("pair_0_estimate.toml")).unwrap();
        assert!(report.contains("true_dx = 2.0"));
    }

    #[test]
    fn test_without_output_dir_nothing_is_written() {
        let info = DebugInfo::default();
        assert!(PngDumpObserver::path(&info, "l3", "png").is_none());
    }
}
