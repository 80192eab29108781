//! Runtime config discovery and loading.
//!
//! The config lives at `<dir>/nvidia-container-runtime/config.toml`, where
//! `<dir>` is `$XDG_CONFIG_HOME` when set and `/etc` otherwise.

use super::types::{ConfigFile, RuntimeConfig};
use crate::document::Format;
use crate::error::ParseError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the config directory.
pub const CONFIG_OVERRIDE_ENV: &str = "XDG_CONFIG_HOME";

/// Config directory used when no override is set.
pub const DEFAULT_CONFIG_DIR: &str = "/etc";

/// Config file path relative to the config directory.
pub const CONFIG_FILE_PATH: &str = "nvidia-container-runtime/config.toml";

/// Errors raised while loading the runtime config.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Location of the runtime config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfigPaths {
    pub config_dir: PathBuf,
}

impl Default for RuntimeConfigPaths {
    fn default() -> Self {
        Self::with_dir(DEFAULT_CONFIG_DIR)
    }
}

impl RuntimeConfigPaths {
    /// Discover the config directory from the environment.
    pub fn discover() -> Self {
        Self::from_override(std::env::var(CONFIG_OVERRIDE_ENV).ok())
    }

    /// Use `dir_override` when it is non-empty, else the default directory.
    pub fn from_override(dir_override: Option<String>) -> Self {
        match dir_override {
            Some(dir) if !dir.is_empty() => Self::with_dir(dir),
            _ => Self::default(),
        }
    }

    /// Create paths with an explicit config directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_PATH)
    }
}

/// Parse runtime config text.
pub fn parse_str(input: &str) -> Result<RuntimeConfig, ParseError> {
    toml::from_str::<ConfigFile>(input)
        .map(|file| file.runtime)
        .map_err(|err| {
            let error = ParseError::new(Format::Toml, err.message().trim());
            match err.span() {
                Some(span) => error.at_offset(input, span.start),
                None => error,
            }
        })
}

/// Parse a runtime config from a reader.
pub fn parse(mut reader: impl Read) -> Result<RuntimeConfig, RuntimeConfigError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| RuntimeConfigError::Io {
            path: PathBuf::from("<reader>"),
            source,
        })?;
    let input = std::str::from_utf8(&bytes).map_err(|err| {
        ParseError::new(Format::Toml, format!("invalid UTF-8: {}", err))
            .at_offset(&String::from_utf8_lossy(&bytes), err.valid_up_to())
    })?;
    Ok(parse_str(input)?)
}

/// Load the runtime config. A missing file yields the defaults.
pub fn load(paths: &RuntimeConfigPaths) -> Result<RuntimeConfig, RuntimeConfigError> {
    load_file(&paths.config_file())
}

fn load_file(path: &Path) -> Result<RuntimeConfig, RuntimeConfigError> {
    match std::fs::File::open(path) {
        Ok(file) => {
            debug!(path = %path.display(), "Loading runtime config");
            parse(file).map_err(|err| match err {
                RuntimeConfigError::Io { source, .. } => RuntimeConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No runtime config, using defaults");
            Ok(RuntimeConfig::default())
        }
        Err(source) => Err(RuntimeConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
