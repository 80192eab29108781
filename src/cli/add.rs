//! Add subcommand: register a runtime in an engine config.

use super::{load_document, write_document};
use crate::engine::Engine;
use crate::merge::{OverrideSet, add_runtime};
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Arguments for the add subcommand
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Engine and config version: containerd, containerd-v1, containerd-v2 or docker
    #[arg(short, long)]
    pub engine: Engine,

    /// Engine config file to update (a missing file starts empty)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Write the result here instead of back to --config
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Runtime name
    #[arg(short, long, default_value = "nvidia")]
    pub name: String,

    /// Absolute path of the runtime binary
    #[arg(short, long, value_name = "PATH")]
    pub binary: String,

    /// Make this runtime the engine's default
    #[arg(long)]
    pub set_as_default: bool,

    /// JSON map merged into the runtime entry; repeatable, later ones win
    #[arg(long = "override", value_name = "JSON", value_parser = parse_override)]
    pub overrides: Vec<Value>,

    /// containerd runtime_type used when no template provides one
    #[arg(long, value_name = "TYPE")]
    pub runtime_type: Option<String>,
}

impl AddArgs {
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.config)
    }
}

fn parse_override(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|err| format!("invalid JSON: {}", err))
}

/// Run the add command.
pub fn run_add(args: &AddArgs) -> Result<()> {
    let adapter = args.engine.adapter(args.runtime_type.as_deref());
    let overrides = OverrideSet::from_json(&args.overrides)?;

    let mut document = load_document(&args.config, adapter.format())?;
    add_runtime(
        &mut document,
        adapter.as_ref(),
        &args.name,
        &args.binary,
        args.set_as_default,
        &overrides,
    )
    .with_context(|| format!("failed to add runtime {} to {}", args.name, args.config.display()))?;

    write_document(args.output_path(), &document)
}
