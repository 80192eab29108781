//! Docker `daemon.json` adapter.

use super::EngineAdapter;
use super::schema::RuntimeEntrySchema;
use crate::document::{ConfigDocument, Format, KeyPath, Node};
use crate::error::MergeResult;

/// Adapter for the Docker daemon config.
///
/// Docker entries carry no inherited fields: a new entry is always
/// `{"args": [], "path": <binary>}`.
#[derive(Debug, Clone)]
pub struct Docker {
    schema: RuntimeEntrySchema,
}

impl Docker {
    pub fn new() -> Self {
        let schema = RuntimeEntrySchema::new(KeyPath::key("runtimes"))
            .with_default_runtime_path(KeyPath::key("default-runtime"))
            .with_binary_path_field(KeyPath::key("path"))
            .with_skeleton_default("args", Node::Array(Vec::new()));
        Self { schema }
    }
}

impl Default for Docker {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Docker {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn format(&self) -> Format {
        Format::Json
    }

    fn schema(&self) -> &RuntimeEntrySchema {
        &self.schema
    }

    fn normalize(&self, _document: &mut ConfigDocument) -> MergeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_is_args_only() {
        let skeleton = Docker::new().schema().skeleton();
        let keys: Vec<&str> = skeleton.keys().collect();
        assert_eq!(keys, vec!["args"]);
    }

    #[test]
    fn test_normalize_leaves_document_untouched() {
        let source = "{\"log-driver\": \"json-file\"}";
        let mut doc = ConfigDocument::parse(Format::Json, source).unwrap();
        Docker::new().normalize(&mut doc).unwrap();
        assert_eq!(doc.to_string(), source);
    }
}
