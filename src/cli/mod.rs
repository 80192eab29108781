//! CLI command definitions for gpu-runtime-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod add;
pub mod info;
pub mod remove;

use crate::document::{ConfigDocument, Format};
use crate::logging::LogTarget;
use add::AddArgs;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use remove::RemoveArgs;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Register a GPU container runtime in container engine configs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add (or update) a runtime entry in an engine config
    Add(AddArgs),

    /// Remove a runtime entry from an engine config
    Remove(RemoveArgs),

    /// Show the runtime's own configuration
    Info,
}

/// Read an engine config. A missing file is an empty document.
pub fn load_document(path: &Path, format: Format) -> Result<ConfigDocument> {
    match fs::read(path) {
        Ok(bytes) => ConfigDocument::load(format, &bytes)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file does not exist, starting empty");
            Ok(ConfigDocument::new(format))
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Write an engine config, creating its parent directory if needed.
pub fn write_document(path: &Path, document: &ConfigDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, document.serialize())
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "Wrote config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::try_parse_from([
            "gpu-runtime-config",
            "add",
            "--engine",
            "docker",
            "--config",
            "/etc/docker/daemon.json",
            "--name",
            "nvidia",
            "--binary",
            "/usr/bin/nvidia-container-runtime",
            "--set-as-default",
            "--override",
            r#"{"args": ["--debug"]}"#,
        ])
        .unwrap();

        assert_eq!(cli.log, LogTarget::Stderr);
        let Command::Add(args) = cli.command else {
            panic!("expected add command");
        };
        assert!(args.set_as_default);
        assert_eq!(args.overrides.len(), 1);
        assert_eq!(args.output_path(), Path::new("/etc/docker/daemon.json"));
    }

    #[test]
    fn test_parse_rejects_bad_override() {
        let result = Cli::try_parse_from([
            "gpu-runtime-config",
            "add",
            "--engine",
            "containerd",
            "--config",
            "config.toml",
            "--name",
            "nvidia",
            "--binary",
            "/usr/bin/nvidia-container-runtime",
            "--override",
            "{not json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_log_after_subcommand() {
        let cli = Cli::try_parse_from(["gpu-runtime-config", "info", "--log", "off", "-v"]).unwrap();
        assert_eq!(cli.log, LogTarget::Off);
        assert!(cli.verbose);
    }

    #[test]
    fn test_load_missing_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let doc = load_document(&dir.path().join("absent.toml"), Format::Toml).unwrap();
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn test_write_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etc/docker/daemon.json");
        let doc = ConfigDocument::parse(Format::Json, "{\"a\": 1}").unwrap();
        write_document(&path, &doc).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\": 1}");
    }
}
