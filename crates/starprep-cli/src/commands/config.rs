use std::path::Path;

use anyhow::{Context, Result};
use starprep_core::config::RunOptions;

/// Print or save the effective run options as TOML, ready to be reused
/// with `--config`.
pub fn run(options: &RunOptions, output: Option<&Path>) -> Result<()> {
    let toml_str = toml::to_string_pretty(options)?;

    if let Some(path) = output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Run options saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
