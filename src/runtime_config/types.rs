//! Runtime configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default debug log destination (debug logging disabled).
pub const DEFAULT_DEBUG_FILE_PATH: &str = "/dev/null";

/// Default runtime log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// How the runtime decides to inject devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Pick a mode from the host (default)
    #[default]
    Auto,
    /// Use the prestart hook
    Legacy,
    /// Use CSV mount specs
    Csv,
    /// Use CDI specs
    Cdi,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Auto => write!(f, "auto"),
            RuntimeMode::Legacy => write!(f, "legacy"),
            RuntimeMode::Csv => write!(f, "csv"),
            RuntimeMode::Cdi => write!(f, "cdi"),
        }
    }
}

/// Settings from the `[nvidia-container-runtime]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// File the runtime writes debug logs to.
    #[serde(rename = "debug", default = "default_debug_file_path")]
    pub debug_file_path: String,

    #[serde(rename = "log-level", default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub mode: RuntimeMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debug_file_path: default_debug_file_path(),
            log_level: default_log_level(),
            mode: RuntimeMode::default(),
        }
    }
}

fn default_debug_file_path() -> String {
    DEFAULT_DEBUG_FILE_PATH.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// The whole config file. Sections other than the runtime's are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(rename = "nvidia-container-runtime", default)]
    pub runtime: RuntimeConfig,
}

impl RuntimeConfig {
    /// Render as a config file holding only the runtime section.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&ConfigFile {
            runtime: self.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.debug_file_path, "/dev/null");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.mode, RuntimeMode::Auto);
    }

    #[test]
    fn test_to_toml_has_section() {
        let rendered = RuntimeConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[nvidia-container-runtime]"));
        assert!(rendered.contains("debug = \"/dev/null\""));
        assert!(rendered.contains("mode = \"auto\""));
    }
}
