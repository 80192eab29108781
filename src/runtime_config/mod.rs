//! Read-only access to the GPU runtime's own config file.

pub mod loader;
pub mod types;

pub use loader::{
    CONFIG_FILE_PATH, CONFIG_OVERRIDE_ENV, RuntimeConfigError, RuntimeConfigPaths, load, parse,
    parse_str,
};
pub use types::{RuntimeConfig, RuntimeMode};
