use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use phasereg_core::RegistrationParams;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image height stored in the config
    #[arg(long, default_value = "256")]
    pub rows: usize,

    /// Image width stored in the config
    #[arg(long, default_value = "256")]
    pub cols: usize,
}

/// Print or save the default registration parameters as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let params = RegistrationParams::with_size(args.rows, args.cols);
    let toml_str = toml::to_string_pretty(&params)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_params;

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phasereg.toml");
        let args = ConfigArgs {
            output: Some(path.clone()),
            rows: 64,
            cols: 80,
        };
        run(&args).unwrap();

        let params = load_params(&path).unwrap();
        assert_eq!(params, RegistrationParams::with_size(64, 80));
    }
}
