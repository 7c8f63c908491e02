use std::path::{Path, PathBuf};

use console::Style;
use phasereg_core::{Estimate, EstimateStage, RegistrationConfig, Shift};

use crate::commands::batch::BatchEntry;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    fn stage(&self, stage: &EstimateStage) -> &Style {
        match stage {
            EstimateStage::Iterative { .. } => &self.method,
            _ => &self.disabled,
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_shift_summary(
    reference: &Path,
    target: &Path,
    config: &RegistrationConfig,
    estimate: &Estimate,
    truth: Option<Shift>,
) {
    let s = Styles::new();
    print_title(&s, "Phase Correlation");

    println!(
        "    {:<12}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(reference.display())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Target"),
        s.path.apply_to(target.display())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{} x {}", config.cols(), config.rows()))
    );
    println!();

    println!("  {}", s.header.apply_to("Parameters"));
    println!(
        "    {:<12}{} ({} .. {})",
        s.label.apply_to("Bandpass"),
        s.method.apply_to(config.bandpass_kind()),
        config.bandpass_low(),
        config.bandpass_high()
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.method.apply_to(config.window_kind())
    );
    println!(
        "    {:<12}{} -> {} ({})",
        s.label.apply_to("Upsampling"),
        s.value.apply_to(config.neighborhood_size()),
        s.value.apply_to(config.upsampled_size()),
        s.method.apply_to(config.interpolation_kind())
    );
    println!(
        "    {:<12}{} ({})",
        s.label.apply_to("L1 ratio"),
        s.value.apply_to(config.centroid_ratio()),
        s.method.apply_to(config.centroid_window_kind())
    );
    println!();

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Shift"),
        s.value.apply_to(estimate.shift)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Stage"),
        s.stage(&estimate.stage).apply_to(estimate.stage)
    );
    if let Some(truth) = truth {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Expected"),
            s.value.apply_to(truth)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Error"),
            s.value.apply_to(format!("{:.4} px", (estimate.shift - truth).magnitude()))
        );
    }
    println!();
}

pub fn print_batch_summary(reference: &Path, entries: &[BatchEntry], failures: &[(PathBuf, String)]) {
    let s = Styles::new();
    print_title(&s, "Batch Registration");

    println!(
        "    {:<12}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(reference.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Shifts"));
    for entry in entries {
        println!(
            "    {:>10.4} {:>10.4}  {}  {}",
            s.value.apply_to(entry.dx),
            s.value.apply_to(entry.dy),
            s.label.apply_to(&entry.stage),
            s.path.apply_to(entry.file.display())
        );
    }
    println!();

    if failures.is_empty() {
        return;
    }
    println!("  {}", s.header.apply_to("Failed"));
    for (file, reason) in failures {
        println!(
            "    {}  {}",
            s.path.apply_to(file.display()),
            s.disabled.apply_to(reason)
        );
    }
    println!();
}
