//! GPU runtime registration for container engine configs.
//!
//! Loads an engine's config document, builds a runtime entry that inherits
//! from an existing reference runtime, applies caller overrides and writes it
//! back, leaving everything else in the document as it was.

pub mod cli;
pub mod document;
pub mod engine;
pub mod error;
pub mod logging;
pub mod merge;
pub mod runtime_config;

pub use document::{ConfigDocument, Format, KeyPath, Node, Scalar, Table};
pub use engine::{Containerd, Docker, Engine, EngineAdapter, RuntimeEntrySchema};
pub use error::{ErrorKind, MergeError, MergeResult, ParseError};
pub use merge::{OverrideSet, add_runtime, build_entry, default_runtime, remove_runtime};
