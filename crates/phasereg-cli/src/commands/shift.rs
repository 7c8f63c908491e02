use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use phasereg_core::{CalculateOptions, DebugContext, Estimate, Shift};
use tracing::info;

use super::RegistrationArgs;
use crate::debug::PngDumpObserver;
use crate::io::{load_image, parse_shift};
use crate::summary::print_shift_summary;

#[derive(Args)]
pub struct ShiftArgs {
    /// Reference image
    pub reference: PathBuf,

    /// Image whose shift relative to the reference is measured
    pub target: PathBuf,

    #[command(flatten)]
    pub registration: RegistrationArgs,

    /// Known shift as dx,dy, reported next to the estimate
    #[arg(long, value_parser = parse_shift, allow_hyphen_values = true)]
    pub truth: Option<Shift>,

    /// Dump every intermediate stage as PNG into this directory
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,
}

pub fn run(args: &ShiftArgs) -> Result<()> {
    let reference = load_image(&args.reference, args.registration.luma)?;
    let target = load_image(&args.target, args.registration.luma)?;
    let (rows, cols, _) = reference.dim();

    let config = args.registration.build_config(rows, cols)?;
    info!("{}", config);

    let observer = PngDumpObserver;
    let debug_ctx = match &args.debug_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let name = args
                .target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "phasereg".into());
            let mut ctx = DebugContext::<f64>::new(&observer)
                .with_name(name)
                .with_output_dir(dir);
            if let Some(truth) = args.truth {
                ctx = ctx.with_true_shift(truth);
            }
            Some(ctx)
        }
        None => None,
    };

    let mut options = CalculateOptions::<f64>::default()
        .with_accuracy(args.registration.accuracy.into())
        .with_mode(args.registration.mode.into());
    if let Some(ctx) = &debug_ctx {
        options = options.with_debug(ctx);
    }

    let estimate: Estimate = config
        .estimate_channels(reference.view(), target.view(), &options)
        .with_context(|| {
            format!(
                "Failed to register {} against {}",
                args.target.display(),
                args.reference.display()
            )
        })?;

    print_shift_summary(&args.reference, &args.target, &config, &estimate, args.truth);
    Ok(())
}
