//! Remove subcommand: unregister a runtime from an engine config.

use super::{load_document, write_document};
use crate::engine::Engine;
use crate::merge::remove_runtime;
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the remove subcommand
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Engine and config version: containerd, containerd-v1, containerd-v2 or docker
    #[arg(short, long)]
    pub engine: Engine,

    /// Engine config file to update
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Write the result here instead of back to --config
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Runtime name
    #[arg(short, long, default_value = "nvidia")]
    pub name: String,
}

impl RemoveArgs {
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.config)
    }
}

/// Run the remove command. Nothing is written when the runtime is absent.
pub fn run_remove(args: &RemoveArgs) -> Result<()> {
    let adapter = args.engine.adapter(None);
    let mut document = load_document(&args.config, adapter.format())?;

    let removed = remove_runtime(&mut document, adapter.as_ref(), &args.name).with_context(|| {
        format!("failed to remove runtime {} from {}", args.name, args.config.display())
    })?;

    if removed || args.output.is_some() {
        write_document(args.output_path(), &document)?;
    } else {
        println!("Runtime {} is not configured in {}", args.name, args.config.display());
    }
    Ok(())
}
