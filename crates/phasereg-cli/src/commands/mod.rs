pub mod batch;
pub mod config;
pub mod shift;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use phasereg_core::{Accuracy, CorrelationMode, RegistrationConfig, RegistrationParams};

use crate::io::load_params;

#[derive(Clone, Copy, ValueEnum)]
pub enum AccuracyArg {
    Pixel,
    Subpixel,
    Iterative,
}

impl From<AccuracyArg> for Accuracy {
    fn from(arg: AccuracyArg) -> Self {
        match arg {
            AccuracyArg::Pixel => Accuracy::Pixel,
            AccuracyArg::Subpixel => Accuracy::Subpixel,
            AccuracyArg::Iterative => Accuracy::SubpixelIterative,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Phase,
    Cross,
}

impl From<ModeArg> for CorrelationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Phase => CorrelationMode::Phase,
            ModeArg::Cross => CorrelationMode::Cross,
        }
    }
}

/// Options shared by every command that registers images.
#[derive(Args)]
pub struct RegistrationArgs {
    /// TOML file with registration parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Refinement level
    #[arg(long, value_enum, default_value = "iterative")]
    pub accuracy: AccuracyArg,

    /// Spectrum normalization
    #[arg(long, value_enum, default_value = "phase")]
    pub mode: ModeArg,

    /// Convert color images to luminance instead of rejecting them
    #[arg(long)]
    pub luma: bool,
}

impl RegistrationArgs {
    /// Build a config for `rows x cols` images.
    ///
    /// The image size always wins over any size stored in the config file.
    pub fn build_config(&self, rows: usize, cols: usize) -> Result<RegistrationConfig> {
        let params = match &self.config {
            Some(path) => RegistrationParams {
                rows,
                cols,
                ..load_params(path)?
            },
            None => RegistrationParams::with_size(rows, cols),
        };
        Ok(RegistrationConfig::from_params(params)?)
    }
}
