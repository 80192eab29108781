//! Document model: an ordered configuration tree over a parsed file.
//!
//! A [`ConfigDocument`] wraps either a TOML or a JSON document and exposes it
//! through the format-independent [`Node`] tree. Reads return owned nodes;
//! writes go straight into the format backend, so regions that are never
//! written keep their original text:
//! - TOML: comments, whitespace and table layout survive any edit elsewhere.
//! - JSON: an unmodified document serializes to its exact source bytes; a
//!   modified one is rendered with 4-space indentation in key order.

mod json_backend;
pub mod node;
pub mod path;
mod toml_backend;

pub use node::{Node, Scalar, Table};
pub use path::{KeyPath, KeyPathError};

use crate::error::{MergeError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) use json_backend::value_to_node as json_to_node;

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Toml => write!(f, "TOML"),
            Format::Json => write!(f, "JSON"),
        }
    }
}

/// Errors raised by path operations on a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("{path}: expected a table, found {found}")]
    NotATable { path: String, found: &'static str },

    #[error("{path}: {reason}")]
    Unrepresentable { path: String, reason: String },
}

impl From<DocumentError> for MergeError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotATable { path, found } => {
                MergeError::malformed(path, &format!("expected a table, found {}", found))
            }
            DocumentError::Unrepresentable { path, reason } => {
                MergeError::invalid_override(format!("{}: {}", path, reason)).with_path(path)
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Toml(toml_edit::DocumentMut),
    Json {
        value: serde_json::Value,
        /// Source text, kept until the first mutation.
        source: Option<String>,
    },
}

/// A parsed configuration file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    backend: Backend,
}

impl ConfigDocument {
    /// Empty document of the given format.
    pub fn new(format: Format) -> Self {
        let backend = match format {
            Format::Toml => Backend::Toml(toml_edit::DocumentMut::new()),
            Format::Json => Backend::Json {
                value: serde_json::Value::Object(serde_json::Map::new()),
                source: None,
            },
        };
        Self { backend }
    }

    /// Parse raw bytes. No partial document is returned on failure.
    pub fn load(format: Format, bytes: &[u8]) -> Result<Self, ParseError> {
        let input = std::str::from_utf8(bytes).map_err(|err| {
            ParseError::new(format, format!("invalid UTF-8: {}", err))
                .at_offset(&String::from_utf8_lossy(bytes), err.valid_up_to())
        })?;
        Self::parse(format, input)
    }

    /// Parse text.
    pub fn parse(format: Format, input: &str) -> Result<Self, ParseError> {
        let backend = match format {
            Format::Toml => Backend::Toml(toml_backend::parse(input)?),
            Format::Json => Backend::Json {
                value: json_backend::parse(input)?,
                source: Some(input.to_string()),
            },
        };
        Ok(Self { backend })
    }

    pub fn format(&self) -> Format {
        match self.backend {
            Backend::Toml(_) => Format::Toml,
            Backend::Json { .. } => Format::Json,
        }
    }

    /// The whole document as a node tree.
    pub fn root(&self) -> Table {
        match &self.backend {
            Backend::Toml(doc) => toml_backend::root(doc),
            Backend::Json { value, .. } => json_backend::root(value),
        }
    }

    /// Node at `path`, or `None` when any segment is missing or an
    /// intermediate node is not a table.
    pub fn get(&self, path: &KeyPath) -> Option<Node> {
        self.lookup(path).ok().flatten()
    }

    /// Like [`get`](Self::get), but reports a non-table intermediate node.
    pub fn lookup(&self, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
        match &self.backend {
            Backend::Toml(doc) => toml_backend::lookup(doc, path),
            Backend::Json { value, .. } => json_backend::lookup(value, path),
        }
    }

    /// Write `node` at `path`, creating intermediate tables.
    ///
    /// An existing key is replaced in place; a new key is appended after its
    /// siblings. On error the document is unchanged.
    pub fn set(&mut self, path: &KeyPath, node: Node) -> Result<(), DocumentError> {
        match &mut self.backend {
            Backend::Toml(doc) => toml_backend::set(doc, path, node),
            Backend::Json { value, source } => {
                json_backend::set(value, path, node)?;
                *source = None;
                Ok(())
            }
        }
    }

    /// Remove the node at `path`, returning it. Sibling order is kept.
    pub fn delete(&mut self, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
        match &mut self.backend {
            Backend::Toml(doc) => toml_backend::delete(doc, path),
            Backend::Json { value, source } => {
                let removed = json_backend::delete(value, path)?;
                if removed.is_some() {
                    *source = None;
                }
                Ok(removed)
            }
        }
    }

    /// Make sure a table exists at `path`, creating it and its parents.
    pub fn ensure_table(&mut self, path: &KeyPath) -> Result<(), DocumentError> {
        match self.lookup(path)? {
            Some(Node::Table(_)) => Ok(()),
            Some(other) => Err(DocumentError::NotATable {
                path: path.to_string(),
                found: other.kind(),
            }),
            None => match &mut self.backend {
                Backend::Toml(doc) => toml_backend::set_implicit_table(doc, path),
                Backend::Json { value, source } => {
                    json_backend::set(value, path, Node::Table(Table::new()))?;
                    *source = None;
                    Ok(())
                }
            },
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Backend::Toml(doc) => write!(f, "{}", doc),
            Backend::Json {
                source: Some(source),
                ..
            } => f.write_str(source),
            Backend::Json {
                value,
                source: None,
            } => f.write_str(&json_backend::render(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINERD: &str = r#"# containerd config
version = 2

[plugins]
  [plugins."io.containerd.grpc.v1.cri"]
    sandbox_image = "registry.k8s.io/pause:3.9"  # pinned
    [plugins."io.containerd.grpc.v1.cri".containerd]
      default_runtime_name = "runc"
      [plugins."io.containerd.grpc.v1.cri".containerd.runtimes.runc]
        runtime_type = "io.containerd.runc.v2"

[metrics]
  address = "127.0.0.1:1338"
"#;

    const DAEMON: &str = "{\n  \"log-driver\": \"json-file\",\n  \"data-root\": \"/var/lib/docker\"\n}\n";

    fn path(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    #[test]
    fn test_toml_round_trip_is_byte_identical() {
        let doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        assert_eq!(doc.to_string(), CONTAINERD);
    }

    #[test]
    fn test_json_round_trip_is_byte_identical() {
        let doc = ConfigDocument::load(Format::Json, DAEMON.as_bytes()).unwrap();
        assert_eq!(doc.serialize(), DAEMON.as_bytes());
    }

    #[test]
    fn test_get_nested() {
        let doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        let node = doc.get(&path(
            r#"plugins."io.containerd.grpc.v1.cri".containerd.default_runtime_name"#,
        ));
        assert_eq!(node, Some(Node::from("runc")));
        assert_eq!(doc.get(&path("plugins.missing.key")), None);
    }

    #[test]
    fn test_lookup_reports_non_table() {
        let doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        let err = doc.lookup(&path("version.major")).unwrap_err();
        assert_eq!(
            err,
            DocumentError::NotATable {
                path: "version".to_string(),
                found: "an integer",
            }
        );
        assert_eq!(doc.get(&path("version.major")), None);
    }

    #[test]
    fn test_set_keeps_comments_and_unrelated_sections() {
        let mut doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        doc.set(
            &path(r#"plugins."io.containerd.grpc.v1.cri".containerd.runtimes.nvidia.runtime_type"#),
            Node::from("io.containerd.runc.v2"),
        )
        .unwrap();

        let rendered = doc.to_string();
        assert!(rendered.starts_with("# containerd config\nversion = 2\n"));
        assert!(rendered.contains("sandbox_image = \"registry.k8s.io/pause:3.9\"  # pinned"));
        assert!(rendered.contains("[metrics]\n  address = \"127.0.0.1:1338\"\n"));
        assert!(rendered.contains(
            "[plugins.\"io.containerd.grpc.v1.cri\".containerd.runtimes.nvidia]"
        ));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut doc = ConfigDocument::parse(Format::Json, r#"{"a": 1, "b": 2, "c": 3}"#).unwrap();
        doc.set(&path("b"), Node::from("two")).unwrap();
        let keys: Vec<String> = doc.root().keys().map(String::from).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(doc.get(&path("b")), Some(Node::from("two")));
    }

    #[test]
    fn test_failed_set_leaves_document_unchanged() {
        let mut doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        let err = doc.set(&path("metrics.address.port"), Node::from(1i64)).unwrap_err();
        assert!(matches!(err, DocumentError::NotATable { .. }));
        assert_eq!(doc.to_string(), CONTAINERD);
    }

    #[test]
    fn test_json_mutation_renders_pretty() {
        let mut doc = ConfigDocument::parse(Format::Json, DAEMON).unwrap();
        doc.set(&path("runtimes.nvidia.path"), Node::from("/usr/bin/nvidia"))
            .unwrap();
        assert_eq!(
            doc.to_string(),
            "{\n    \"log-driver\": \"json-file\",\n    \"data-root\": \"/var/lib/docker\",\n    \"runtimes\": {\n        \"nvidia\": {\n            \"path\": \"/usr/bin/nvidia\"\n        }\n    }\n}"
        );
    }

    #[test]
    fn test_delete() {
        let mut doc = ConfigDocument::parse(Format::Toml, CONTAINERD).unwrap();
        let removed = doc
            .delete(&path(r#"plugins."io.containerd.grpc.v1.cri".containerd.runtimes.runc"#))
            .unwrap();
        assert!(matches!(removed, Some(Node::Table(_))));
        assert!(!doc.to_string().contains("runtimes.runc"));
        assert_eq!(doc.delete(&path("nothing.here")).unwrap(), None);
    }

    #[test]
    fn test_ensure_table() {
        let mut doc = ConfigDocument::new(Format::Toml);
        doc.ensure_table(&path("plugins.cri.containerd.runtimes")).unwrap();
        assert!(matches!(
            doc.get(&path("plugins.cri.containerd.runtimes")),
            Some(Node::Table(_))
        ));

        let mut doc = ConfigDocument::parse(Format::Json, r#"{"runtimes": []}"#).unwrap();
        let err = doc.ensure_table(&path("runtimes")).unwrap_err();
        assert!(matches!(err, DocumentError::NotATable { found: "an array", .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = ConfigDocument::load(Format::Toml, b"a = \"\xff\"").unwrap_err();
        assert!(err.message.contains("invalid UTF-8"));
        assert_eq!(err.line, Some(1));
    }
}
