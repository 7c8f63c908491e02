use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array3;
use phasereg_core::{CalculateOptions, Estimate, RegistrationConfig};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use super::RegistrationArgs;
use crate::io::load_image;
use crate::summary::print_batch_summary;

#[derive(Args)]
pub struct BatchArgs {
    /// Reference image every target is registered against
    pub reference: PathBuf,

    /// Target images
    #[arg(required = true)]
    pub targets: Vec<PathBuf>,

    #[command(flatten)]
    pub registration: RegistrationArgs,

    /// Write the measured shifts to a TOML report
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One registered target, as written to the report.
#[derive(Serialize)]
pub struct BatchEntry {
    pub file: PathBuf,
    pub dx: f64,
    pub dy: f64,
    pub stage: String,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    reference: &'a Path,
    entries: &'a [BatchEntry],
}

pub fn run(args: &BatchArgs) -> Result<()> {
    let reference = load_image(&args.reference, args.registration.luma)?;
    let (rows, cols, _) = reference.dim();
    let config = args.registration.build_config(rows, cols)?;
    let options = CalculateOptions::<f64>::default()
        .with_accuracy(args.registration.accuracy.into())
        .with_mode(args.registration.mode.into());

    let pb = ProgressBar::new(args.targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Registering [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let results: Vec<(PathBuf, Result<Estimate>)> = args
        .targets
        .par_iter()
        .map(|path| {
            let result = register_one(&config, &options, &reference, path, args.registration.luma);
            pb.inc(1);
            (path.clone(), result)
        })
        .collect();
    pb.finish();

    let mut entries = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (file, result) in results {
        match result {
            Ok(estimate) => entries.push(BatchEntry {
                dx: estimate.shift.dx,
                dy: estimate.shift.dy,
                stage: estimate.stage.to_string(),
                file,
            }),
            Err(err) => {
                warn!("Skipping {}: {err:#}", file.display());
                failures.push((file, format!("{err:#}")));
            }
        }
    }

    print_batch_summary(&args.reference, &entries, &failures);

    if let Some(ref path) = args.output {
        let report = BatchReport {
            reference: &args.reference,
            entries: &entries,
        };
        std::fs::write(path, toml::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

fn register_one(
    config: &RegistrationConfig,
    options: &CalculateOptions<'_, f64>,
    reference: &Array3<f64>,
    path: &Path,
    luma: bool,
) -> Result<Estimate> {
    let target = load_image(path, luma)?;
    config
        .estimate_channels(reference.view(), target.view(), options)
        .with_context(|| format!("Failed to register {}", path.display()))
}
