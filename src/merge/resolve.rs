//! Template resolution: the existing entry a new runtime inherits from.

use crate::document::{ConfigDocument, Node, Scalar, Table};
use crate::engine::RuntimeEntrySchema;
use crate::error::{MergeError, MergeResult};
use std::fmt;

/// Name of the reference runtime preferred as a template.
pub const RUNC: &str = "runc";

/// Where a template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The `runc` entry.
    Runc,
    /// The entry named by the default-runtime scalar.
    DefaultRuntime(String),
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Runc => f.write_str(RUNC),
            TemplateSource::DefaultRuntime(name) => write!(f, "default runtime {}", name),
        }
    }
}

/// A resolved template entry. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub source: TemplateSource,
    pub entry: Table,
}

/// Find the template for a new entry: `runc`, then the default runtime,
/// then none.
pub fn resolve_template(
    document: &ConfigDocument,
    schema: &RuntimeEntrySchema,
) -> MergeResult<Option<Template>> {
    let Some(runtimes) = runtimes_table(document, schema)? else {
        return Ok(None);
    };

    if let Some(entry) = runtimes.get(RUNC) {
        return template_entry(schema, RUNC, entry).map(|entry| {
            Some(Template {
                name: RUNC.to_string(),
                source: TemplateSource::Runc,
                entry,
            })
        });
    }

    let Some(default_name) = default_runtime_name(document, schema)? else {
        return Ok(None);
    };
    match runtimes.get(&default_name) {
        Some(entry) => template_entry(schema, &default_name, entry).map(|entry| {
            Some(Template {
                name: default_name.clone(),
                source: TemplateSource::DefaultRuntime(default_name.clone()),
                entry,
            })
        }),
        None => Ok(None),
    }
}

/// The runtimes table, or `None` when the document has none yet.
pub(crate) fn runtimes_table(
    document: &ConfigDocument,
    schema: &RuntimeEntrySchema,
) -> MergeResult<Option<Table>> {
    let path = schema.runtimes_path();
    match document.lookup(path)? {
        None => Ok(None),
        Some(Node::Table(table)) => Ok(Some(table)),
        Some(other) => Err(MergeError::malformed(
            path,
            &format!("expected a table, found {}", other.kind()),
        )),
    }
}

/// The non-empty default-runtime name, if the schema has one and it is set.
pub(crate) fn default_runtime_name(
    document: &ConfigDocument,
    schema: &RuntimeEntrySchema,
) -> MergeResult<Option<String>> {
    let Some(path) = schema.default_runtime_path() else {
        return Ok(None);
    };
    match document.lookup(path)? {
        None => Ok(None),
        Some(Node::Scalar(Scalar::String(name))) if name.is_empty() => Ok(None),
        Some(Node::Scalar(Scalar::String(name))) => Ok(Some(name)),
        Some(other) => Err(MergeError::malformed(
            path,
            &format!("expected a string, found {}", other.kind()),
        )),
    }
}

fn template_entry(schema: &RuntimeEntrySchema, name: &str, entry: &Node) -> MergeResult<Table> {
    match entry {
        Node::Table(table) => Ok(table.clone()),
        other => Err(MergeError::malformed(
            schema.entry_path(name),
            &format!("expected a table, found {}", other.kind()),
        )),
    }
}
