//! Engine adapters.
//!
//! An adapter pairs a [`RuntimeEntrySchema`] with the document format of the
//! engine's config file and a `normalize` hook run before every merge.

pub mod containerd;
pub mod docker;
pub mod schema;

pub use containerd::Containerd;
pub use docker::Docker;
pub use schema::RuntimeEntrySchema;

use crate::document::{ConfigDocument, Format};
use crate::error::MergeResult;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Engine-specific behavior used by the merge engine.
pub trait EngineAdapter {
    /// Engine name used in logs and error messages.
    fn name(&self) -> &'static str;

    fn format(&self) -> Format;

    fn schema(&self) -> &RuntimeEntrySchema;

    /// Reject a document this adapter cannot edit. Read-only.
    fn validate(&self, _document: &ConfigDocument) -> MergeResult<()> {
        Ok(())
    }

    /// Bring the document into the shape the schema expects.
    fn normalize(&self, document: &mut ConfigDocument) -> MergeResult<()>;
}

/// Supported engine and config version combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    ContainerdV1,
    ContainerdV2,
    Docker,
}

impl Engine {
    /// containerd with a caller-supplied config version.
    pub fn containerd(version: i64) -> MergeResult<Self> {
        Containerd::new(version).map(|adapter| match adapter.version() {
            1 => Engine::ContainerdV1,
            _ => Engine::ContainerdV2,
        })
    }

    /// Build the adapter. `runtime_type` only applies to containerd.
    pub fn adapter(&self, runtime_type: Option<&str>) -> Box<dyn EngineAdapter> {
        let containerd = |adapter: Containerd| -> Box<dyn EngineAdapter> {
            match runtime_type {
                Some(runtime_type) => Box::new(adapter.with_runtime_type(runtime_type)),
                None => Box::new(adapter),
            }
        };
        match self {
            Engine::ContainerdV1 => containerd(Containerd::v1()),
            Engine::ContainerdV2 => containerd(Containerd::v2()),
            Engine::Docker => {
                if runtime_type.is_some() {
                    warn!("Ignoring runtime type: docker entries have no runtime_type field");
                }
                Box::new(Docker::new())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::ContainerdV1 => "containerd-v1",
            Engine::ContainerdV2 => "containerd-v2",
            Engine::Docker => "docker",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an engine name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown engine {0:?}; expected containerd, containerd-v1, containerd-v2 or docker")]
pub struct UnknownEngine(pub String);

impl FromStr for Engine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "containerd" | "containerd-v2" => Ok(Engine::ContainerdV2),
            "containerd-v1" => Ok(Engine::ContainerdV1),
            "docker" => Ok(Engine::Docker),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_engine_from_str() {
        assert_eq!("containerd".parse::<Engine>(), Ok(Engine::ContainerdV2));
        assert_eq!("containerd-v1".parse::<Engine>(), Ok(Engine::ContainerdV1));
        assert_eq!("Docker".parse::<Engine>(), Ok(Engine::Docker));
        assert!("podman".parse::<Engine>().is_err());
    }

    #[test]
    fn test_engine_containerd_version() {
        assert_eq!(Engine::containerd(1), Ok(Engine::ContainerdV1));
        assert_eq!(Engine::containerd(2), Ok(Engine::ContainerdV2));
        assert_eq!(
            Engine::containerd(0).unwrap_err().kind,
            ErrorKind::UnsupportedVersion
        );
    }

    #[test]
    fn test_adapter_formats() {
        assert_eq!(Engine::Docker.adapter(None).format(), Format::Json);
        assert_eq!(Engine::ContainerdV1.adapter(None).format(), Format::Toml);
        assert_eq!(Engine::ContainerdV2.adapter(None).name(), "containerd");
    }

    #[test]
    fn test_adapter_runtime_type() {
        let adapter = Engine::ContainerdV2.adapter(Some("io.containerd.runc.v2"));
        let skeleton = adapter.schema().skeleton();
        assert_eq!(
            skeleton.get("runtime_type").and_then(|n| n.as_str()),
            Some("io.containerd.runc.v2")
        );
    }
}
