//! gpu-runtime-config
//!
//! Registers a GPU-aware OCI runtime in containerd and Docker configs.

use anyhow::Result;
use clap::Parser;
use gpu_runtime_config::cli::add::run_add;
use gpu_runtime_config::cli::info::run_info;
use gpu_runtime_config::cli::remove::run_remove;
use gpu_runtime_config::cli::{Cli, Command};
use gpu_runtime_config::logging;
use gpu_runtime_config::runtime_config::RuntimeConfigPaths;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    logging::init(&cli.log, cli.verbose)?;

    match &cli.command {
        Command::Add(args) => run_add(args)?,
        Command::Remove(args) => run_remove(args)?,
        Command::Info => {
            // The environment is only consulted here, at the process boundary
            run_info(&RuntimeConfigPaths::discover())?;
        }
    }

    Ok(())
}
