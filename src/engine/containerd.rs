//! containerd adapters for config versions 1 and 2.

use super::EngineAdapter;
use super::schema::RuntimeEntrySchema;
use crate::document::{ConfigDocument, Format, KeyPath, Node};
use crate::error::{MergeError, MergeResult};
use tracing::debug;

/// CRI plugin id in version 1 configs.
pub const CRI_PLUGIN_V1: &str = "cri";

/// CRI plugin id in version 2 configs.
pub const CRI_PLUGIN_V2: &str = "io.containerd.grpc.v1.cri";

/// Top-level key holding the config version.
pub const VERSION_KEY: &str = "version";

/// Adapter for a containerd `config.toml`.
#[derive(Debug, Clone)]
pub struct Containerd {
    version: i64,
    schema: RuntimeEntrySchema,
}

impl Containerd {
    /// Adapter for the given config version (1 or 2).
    pub fn new(version: i64) -> MergeResult<Self> {
        match version {
            1 | 2 => Ok(Self {
                version,
                schema: build_schema(version, ""),
            }),
            other => Err(MergeError::unsupported_version("containerd", other)),
        }
    }

    pub fn v1() -> Self {
        Self {
            version: 1,
            schema: build_schema(1, ""),
        }
    }

    pub fn v2() -> Self {
        Self {
            version: 2,
            schema: build_schema(2, ""),
        }
    }

    /// Use `runtime_type` as the zero value of the `runtime_type` field,
    /// e.g. `io.containerd.runc.v2`.
    pub fn with_runtime_type(mut self, runtime_type: impl Into<String>) -> Self {
        self.schema = build_schema(self.version, &runtime_type.into());
        self
    }

    pub fn version(&self) -> i64 {
        self.version
    }
}

fn build_schema(version: i64, runtime_type: &str) -> RuntimeEntrySchema {
    let plugin = if version == 1 { CRI_PLUGIN_V1 } else { CRI_PLUGIN_V2 };
    let containerd = KeyPath::key("plugins").join(plugin).join("containerd");

    let mut schema = RuntimeEntrySchema::new(containerd.join("runtimes"))
        .with_default_runtime_path(containerd.join("default_runtime_name"))
        .with_binary_path_field(KeyPath::key("options").join("BinaryName"));
    if version == 1 {
        schema = schema.with_binary_path_field(KeyPath::key("options").join("Runtime"));
    }

    schema
        .with_scalar_field("privileged_without_host_devices", false)
        .with_scalar_field("runtime_engine", "")
        .with_scalar_field("runtime_root", "")
        .with_scalar_field("runtime_type", runtime_type)
        .with_options_key("options")
}

impl EngineAdapter for Containerd {
    fn name(&self) -> &'static str {
        "containerd"
    }

    fn format(&self) -> Format {
        Format::Toml
    }

    fn schema(&self) -> &RuntimeEntrySchema {
        &self.schema
    }

    /// A `version` key, when present, must be the adapter's version.
    fn validate(&self, document: &ConfigDocument) -> MergeResult<()> {
        let Some(node) = document.get(&KeyPath::key(VERSION_KEY)) else {
            return Ok(());
        };
        match node.as_integer() {
            Some(found) if found == self.version => Ok(()),
            Some(found) => Err(MergeError::version_mismatch("containerd", self.version, found)),
            None => Err(MergeError::malformed(
                VERSION_KEY,
                &format!("expected an integer, found {}", node.kind()),
            )),
        }
    }

    /// Validate or set the `version` key, then make sure the runtimes table exists.
    fn normalize(&self, document: &mut ConfigDocument) -> MergeResult<()> {
        self.validate(document)?;

        let version_path = KeyPath::key(VERSION_KEY);
        if document.get(&version_path).is_none() {
            debug!(version = self.version, "Setting containerd config version");
            document.set(&version_path, Node::from(self.version))?;
        }

        document.ensure_table(self.schema.runtimes_path())?;
        Ok(())
    }
}
