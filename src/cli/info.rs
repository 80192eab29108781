//! Info subcommand: show the runtime's own configuration.

use crate::runtime_config::{RuntimeConfigPaths, load};
use anyhow::{Context, Result};

/// Run the info command.
pub fn run_info(paths: &RuntimeConfigPaths) -> Result<()> {
    let config_file = paths.config_file();
    let config = load(paths)
        .with_context(|| format!("failed to load runtime config {}", config_file.display()))?;

    println!("# {}", config_file.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
