//! Runtime registration: the structured merge engine.
//!
//! [`add_runtime`] builds a runtime entry from the adapter's schema, the
//! resolved template and the caller's overrides, then writes it into the
//! document. Precedence, lowest first: skeleton, template, overrides, then
//! the binary path which always wins.
//!
//! Every operation works on a copy of the document and only replaces the
//! caller's document once the whole operation has succeeded.

pub mod deep;
pub mod resolve;

pub use deep::{deep_merge, merge_tables};
pub use resolve::{RUNC, Template, TemplateSource, resolve_template};

use crate::document::{ConfigDocument, Node, Table, json_to_node};
use crate::engine::{EngineAdapter, RuntimeEntrySchema};
use crate::error::{MergeError, MergeResult};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Ordered override fragments. Later fragments win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    fragments: Vec<Table>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment.
    pub fn with(mut self, fragment: Table) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn push(&mut self, fragment: Table) {
        self.fragments.push(fragment);
    }

    /// Append a JSON fragment. Anything but an object is an invalid override.
    pub fn push_json(&mut self, fragment: &Value) -> MergeResult<()> {
        match json_to_node(fragment) {
            Node::Table(table) => {
                self.fragments.push(table);
                Ok(())
            }
            other => Err(MergeError::invalid_override(format!(
                "override must be a map, found {}",
                other.kind()
            ))),
        }
    }

    /// Build a set from JSON fragments, in order.
    pub fn from_json<'a>(fragments: impl IntoIterator<Item = &'a Value>) -> MergeResult<Self> {
        let mut set = Self::new();
        for fragment in fragments {
            set.push_json(fragment)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.fragments.iter()
    }
}

/// Register runtime `name` with binary `binary_path` in `document`.
///
/// An existing entry with the same name is rebuilt in place; other entries
/// are neither removed nor reordered. On error `document` is unchanged.
pub fn add_runtime(
    document: &mut ConfigDocument,
    adapter: &dyn EngineAdapter,
    name: &str,
    binary_path: &str,
    set_as_default: bool,
    overrides: &OverrideSet,
) -> MergeResult<()> {
    let schema = adapter.schema();
    let mut working = document.clone();
    adapter.normalize(&mut working)?;

    let entry = assemble(&working, adapter, name, binary_path, overrides)?;
    working.set(&schema.entry_path(name), Node::Table(entry))?;

    if set_as_default {
        match schema.default_runtime_path() {
            Some(path) => {
                working.set(path, Node::from(name))?;
                info!(engine = adapter.name(), runtime = name, "Set default runtime");
            }
            None => {
                warn!(
                    engine = adapter.name(),
                    runtime = name,
                    "Engine has no default runtime setting, ignoring set-as-default"
                );
            }
        }
    }

    *document = working;
    info!(
        engine = adapter.name(),
        runtime = name,
        binary = binary_path,
        "Added runtime"
    );
    Ok(())
}

/// Assemble the entry `add_runtime` would write, without writing it.
pub fn build_entry(
    document: &ConfigDocument,
    adapter: &dyn EngineAdapter,
    name: &str,
    binary_path: &str,
    overrides: &OverrideSet,
) -> MergeResult<Table> {
    let mut working = document.clone();
    adapter.normalize(&mut working)?;
    assemble(&working, adapter, name, binary_path, overrides)
}

/// Remove runtime `name`, and the default-runtime setting if it names it.
///
/// Returns whether an entry was removed. On error `document` is unchanged.
pub fn remove_runtime(
    document: &mut ConfigDocument,
    adapter: &dyn EngineAdapter,
    name: &str,
) -> MergeResult<bool> {
    let schema = adapter.schema();
    adapter.validate(document)?;
    let mut working = document.clone();

    resolve::runtimes_table(&working, schema)?;
    let removed = working.delete(&schema.entry_path(name))?.is_some();

    if resolve::default_runtime_name(&working, schema)?.as_deref() == Some(name) {
        if let Some(path) = schema.default_runtime_path() {
            working.delete(path)?;
            info!(engine = adapter.name(), runtime = name, "Cleared default runtime");
        }
    }

    *document = working;
    if removed {
        info!(engine = adapter.name(), runtime = name, "Removed runtime");
    } else {
        debug!(engine = adapter.name(), runtime = name, "Runtime not present");
    }
    Ok(removed)
}

/// The configured default runtime, if any.
pub fn default_runtime(
    document: &ConfigDocument,
    adapter: &dyn EngineAdapter,
) -> MergeResult<Option<String>> {
    resolve::default_runtime_name(document, adapter.schema())
}

fn assemble(
    document: &ConfigDocument,
    adapter: &dyn EngineAdapter,
    name: &str,
    binary_path: &str,
    overrides: &OverrideSet,
) -> MergeResult<Table> {
    let schema = adapter.schema();
    let mut entry = schema.skeleton();

    match resolve_template(document, schema)? {
        Some(template) => {
            debug!(
                engine = adapter.name(),
                runtime = name,
                template = %template.source,
                "Inheriting settings from template"
            );
            copy_template(schema, &template, &mut entry)?;
        }
        None => {
            debug!(engine = adapter.name(), runtime = name, "No template, using defaults");
        }
    }

    set_binary_path(schema, &mut entry, binary_path)?;

    for fragment in overrides.iter() {
        let fragment = strip_binary_path(schema, fragment.clone(), name)?;
        merge_tables(&mut entry, fragment);
    }

    if !overrides.is_empty() {
        set_binary_path(schema, &mut entry, binary_path)?;
    }
    Ok(entry)
}

/// Copy schema scalar fields and the options table from the template.
fn copy_template(
    schema: &RuntimeEntrySchema,
    template: &Template,
    entry: &mut Table,
) -> MergeResult<()> {
    let template_path = schema.entry_path(&template.name);

    for (key, _) in schema.scalar_fields() {
        match template.entry.get(key) {
            None => {}
            Some(value @ (Node::Table(_) | Node::Array(_))) => {
                return Err(MergeError::malformed(
                    template_path.join(key),
                    &format!("expected a scalar, found {}", value.kind()),
                ));
            }
            Some(value) => {
                entry.insert(key, value.clone());
            }
        }
    }

    if let Some(options) = schema.options_key() {
        match template.entry.get(options) {
            None => {}
            Some(Node::Table(table)) => {
                entry.insert(options, table.clone());
            }
            Some(other) => {
                return Err(MergeError::malformed(
                    template_path.join(options),
                    &format!("expected a table, found {}", other.kind()),
                ));
            }
        }
    }
    Ok(())
}

fn set_binary_path(
    schema: &RuntimeEntrySchema,
    entry: &mut Table,
    binary_path: &str,
) -> MergeResult<()> {
    for field in schema.binary_path_fields() {
        let (leaf, parents) = field
            .segments()
            .split_last()
            .ok_or_else(|| MergeError::invalid_override("empty binary path field"))?;

        let mut current = &mut *entry;
        for (depth, segment) in parents.iter().enumerate() {
            if !current.contains_key(segment) {
                current.insert(segment.as_str(), Table::new());
            }
            current = match current.get_mut(segment) {
                Some(Node::Table(table)) => table,
                other => {
                    let prefix = field.prefix_display(depth + 1);
                    return Err(MergeError::invalid_override(format!(
                        "{} holds the runtime binary path but is {}",
                        prefix,
                        other.map(|node| node.kind()).unwrap_or("missing")
                    ))
                    .with_path(prefix));
                }
            };
        }
        current.insert(leaf.as_str(), binary_path);
    }
    Ok(())
}

/// Drop override keys that target a binary-path field.
///
/// Replacing a table that holds a binary-path field with a non-table is
/// rejected, since the binary path could no longer be written.
fn strip_binary_path(
    schema: &RuntimeEntrySchema,
    mut fragment: Table,
    name: &str,
) -> MergeResult<Table> {
    'fields: for field in schema.binary_path_fields() {
        let Some((leaf, parents)) = field.segments().split_last() else {
            continue;
        };

        let mut current = &mut fragment;
        for (depth, segment) in parents.iter().enumerate() {
            current = match current.get_mut(segment) {
                None => continue 'fields,
                Some(node) if node.is_null() => continue 'fields,
                Some(Node::Table(table)) => table,
                Some(other) => {
                    let prefix = field.prefix_display(depth + 1);
                    return Err(MergeError::invalid_override(format!(
                        "override replaces {} of runtime {} with {}",
                        prefix,
                        name,
                        other.kind()
                    ))
                    .with_path(prefix));
                }
            };
        }

        if let Some(ignored) = current.remove(leaf) {
            if !ignored.is_null() {
                warn!(
                    runtime = name,
                    field = %field,
                    "Ignoring override of the runtime binary path"
                );
            }
        }
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Format;
    use crate::engine::{Containerd, Docker};
    use crate::error::ErrorKind;
    use serde_json::json;

    fn overrides(values: &[Value]) -> OverrideSet {
        OverrideSet::from_json(values).unwrap()
    }

    #[test]
    fn test_override_set_rejects_non_map() {
        let err = OverrideSet::from_json(&[json!([1, 2])]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOverride);
    }

    #[test]
    fn test_binary_path_override_is_ignored() {
        let doc = ConfigDocument::new(Format::Toml);
        let entry = build_entry(
            &doc,
            &Containerd::v2(),
            "nvidia",
            "/usr/bin/nvidia-container-runtime",
            &overrides(&[json!({"options": {"BinaryName": "/tmp/evil", "SystemdCgroup": true}})]),
        )
        .unwrap();
        let options = entry.get("options").and_then(Node::as_table).unwrap();
        assert_eq!(
            options.get("BinaryName").and_then(Node::as_str),
            Some("/usr/bin/nvidia-container-runtime")
        );
        assert_eq!(options.get("SystemdCgroup").and_then(Node::as_bool), Some(true));
    }

    #[test]
    fn test_replacing_options_with_scalar_is_rejected() {
        let mut doc = ConfigDocument::new(Format::Toml);
        let err = add_runtime(
            &mut doc,
            &Containerd::v2(),
            "nvidia",
            "/usr/bin/nvidia-container-runtime",
            false,
            &overrides(&[json!({"options": "none"})]),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOverride);
        assert_eq!(err.path.as_deref(), Some("options"));
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn test_later_overrides_win() {
        let doc = ConfigDocument::new(Format::Json);
        let entry = build_entry(
            &doc,
            &Docker::new(),
            "nvidia",
            "/usr/bin/nvidia-container-runtime",
            &overrides(&[json!({"args": ["a"]}), json!({"args": ["b", "c"]}), json!({"args": null})]),
        )
        .unwrap();
        assert_eq!(
            entry.get("args"),
            Some(&Node::Array(vec![Node::from("b"), Node::from("c")]))
        );
    }

    #[test]
    fn test_docker_path_override_is_ignored() {
        let doc = ConfigDocument::new(Format::Json);
        let entry = build_entry(
            &doc,
            &Docker::new(),
            "nvidia",
            "/usr/bin/nvidia-container-runtime",
            &overrides(&[json!({"path": "/tmp/other"})]),
        )
        .unwrap();
        assert_eq!(
            entry.get("path").and_then(Node::as_str),
            Some("/usr/bin/nvidia-container-runtime")
        );
    }

    #[test]
    fn test_template_scalar_field_holding_table() {
        let doc = ConfigDocument::parse(
            Format::Toml,
            "version = 2\n[plugins.\"io.containerd.grpc.v1.cri\".containerd.runtimes.runc.runtime_root]\nx = 1\n",
        )
        .unwrap();
        let err = build_entry(&doc, &Containerd::v2(), "nvidia", "/bin/nvidia", &OverrideSet::new())
            .unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(
            err.path.as_deref(),
            Some(r#"plugins."io.containerd.grpc.v1.cri".containerd.runtimes.runc.runtime_root"#)
        );
    }

    struct NoDefault(RuntimeEntrySchema);

    impl EngineAdapter for NoDefault {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn format(&self) -> Format {
            Format::Json
        }

        fn schema(&self) -> &RuntimeEntrySchema {
            &self.0
        }

        fn normalize(&self, _document: &mut ConfigDocument) -> MergeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_set_as_default_without_default_path() {
        let adapter = NoDefault(
            RuntimeEntrySchema::new(crate::document::KeyPath::key("runtimes"))
                .with_binary_path_field(crate::document::KeyPath::key("path")),
        );
        let mut doc = ConfigDocument::new(Format::Json);
        add_runtime(&mut doc, &adapter, "nvidia", "/bin/nvidia", true, &OverrideSet::new()).unwrap();
        assert_eq!(default_runtime(&doc, &adapter).unwrap(), None);
        assert_eq!(
            json_to_node(&serde_json::from_str(&doc.to_string()).unwrap()),
            json_to_node(&json!({"runtimes": {"nvidia": {"path": "/bin/nvidia"}}}))
        );
    }

    #[test]
    fn test_set_as_default_docker() {
        let mut doc = ConfigDocument::new(Format::Json);
        add_runtime(&mut doc, &Docker::new(), "nvidia", "/bin/nvidia", true, &OverrideSet::new())
            .unwrap();
        assert_eq!(
            default_runtime(&doc, &Docker::new()).unwrap().as_deref(),
            Some("nvidia")
        );
    }

    #[test]
    fn test_remove_missing_runtime() {
        let mut doc = ConfigDocument::parse(Format::Json, "{\"a\": 1}").unwrap();
        assert!(!remove_runtime(&mut doc, &Docker::new(), "nvidia").unwrap());
        assert_eq!(doc.to_string(), "{\"a\": 1}");
    }
}
