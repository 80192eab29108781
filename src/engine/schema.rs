//! Runtime entry schemas.
//!
//! A schema describes, for one engine and config version, where runtime
//! entries live in the document and which fields an entry is made of.

use crate::document::{KeyPath, Node, Table};

/// Layout of a runtime entry for one engine and config version.
///
/// Schemas are built once per adapter and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEntrySchema {
    runtimes_path: KeyPath,
    default_runtime_path: Option<KeyPath>,
    binary_path_fields: Vec<KeyPath>,
    scalar_fields: Vec<(String, Node)>,
    options_key: Option<String>,
    skeleton_defaults: Vec<(String, Node)>,
}

impl RuntimeEntrySchema {
    /// Schema whose entries live in the table at `runtimes_path`.
    pub fn new(runtimes_path: KeyPath) -> Self {
        Self {
            runtimes_path,
            default_runtime_path: None,
            binary_path_fields: Vec::new(),
            scalar_fields: Vec::new(),
            options_key: None,
            skeleton_defaults: Vec::new(),
        }
    }

    /// Path of the scalar naming the engine's default runtime.
    pub fn with_default_runtime_path(mut self, path: KeyPath) -> Self {
        self.default_runtime_path = Some(path);
        self
    }

    /// A field, relative to the entry, that receives the runtime binary path.
    pub fn with_binary_path_field(mut self, field: KeyPath) -> Self {
        self.binary_path_fields.push(field);
        self
    }

    /// A scalar field inherited from the template, with its zero value.
    ///
    /// Declaring an existing field again replaces its zero value in place.
    pub fn with_scalar_field(mut self, key: impl Into<String>, zero: impl Into<Node>) -> Self {
        let key = key.into();
        let zero = zero.into();
        match self.scalar_fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = zero,
            None => self.scalar_fields.push((key, zero)),
        }
        self
    }

    /// Sub-table copied whole from the template.
    pub fn with_options_key(mut self, key: impl Into<String>) -> Self {
        self.options_key = Some(key.into());
        self
    }

    /// A field present in every new entry but never inherited.
    pub fn with_skeleton_default(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.skeleton_defaults.push((key.into(), value.into()));
        self
    }

    pub fn runtimes_path(&self) -> &KeyPath {
        &self.runtimes_path
    }

    pub fn default_runtime_path(&self) -> Option<&KeyPath> {
        self.default_runtime_path.as_ref()
    }

    pub fn binary_path_fields(&self) -> &[KeyPath] {
        &self.binary_path_fields
    }

    pub fn scalar_fields(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.scalar_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn options_key(&self) -> Option<&str> {
        self.options_key.as_deref()
    }

    /// Absolute path of the entry named `name`.
    pub fn entry_path(&self, name: &str) -> KeyPath {
        self.runtimes_path.join(name)
    }

    /// A fresh entry: scalar fields at their zero values, an empty options
    /// table, then the skeleton-only defaults.
    pub fn skeleton(&self) -> Table {
        let mut entry = Table::new();
        for (key, zero) in &self.scalar_fields {
            entry.insert(key.as_str(), zero.clone());
        }
        if let Some(options) = &self.options_key {
            entry.insert(options.as_str(), Table::new());
        }
        for (key, value) in &self.skeleton_defaults {
            entry.insert(key.as_str(), value.clone());
        }
        entry
    }
}
