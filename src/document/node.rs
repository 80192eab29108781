//! Format-independent tree nodes.
//!
//! Every parsed document is exposed as a closed [`Node`] tree, so traversal
//! sites match exhaustively instead of probing untyped maps.

use std::fmt;

/// A node in a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Table(Table),
    Array(Vec<Node>),
    Scalar(Scalar),
}

/// Leaf values.
///
/// `Datetime` only appears in TOML documents and `Null` only in JSON ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Datetime(String),
    Null,
}

impl Node {
    /// Short description of the node's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Table(_) => "a table",
            Node::Array(_) => "an array",
            Node::Scalar(Scalar::String(_)) => "a string",
            Node::Scalar(Scalar::Integer(_)) => "an integer",
            Node::Scalar(Scalar::Float(_)) => "a float",
            Node::Scalar(Scalar::Bool(_)) => "a boolean",
            Node::Scalar(Scalar::Datetime(_)) => "a datetime",
            Node::Scalar(Scalar::Null) => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_table(self) -> Option<Table> {
        match self {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Node::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<Table> for Node {
    fn from(table: Table) -> Self {
        Node::Table(table)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Integer(i))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

/// Ordered string-keyed map with unique keys.
///
/// Replacing an existing key keeps its position; new keys are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: Vec<(String, Node)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.position(key).map(move |i| &mut self.entries[i].1)
    }

    /// Insert or replace `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl IntoIterator for Table {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut table = Table::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Datetime(d) => write!(f, "{}", d),
            Scalar::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut table = Table::new();
        table.insert("b", 1i64);
        table.insert("a", 2i64);
        table.insert("c", 3i64);
        table.insert("a", 20i64);

        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(table.get("a"), Some(&Node::from(20i64)));
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut table: Table = [
            ("x", Node::from(1i64)),
            ("y", Node::from(2i64)),
            ("z", Node::from(3i64)),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.remove("y"), Some(Node::from(2i64)));
        assert_eq!(table.remove("missing"), None);

        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["x", "z"]);
    }

    #[test]
    fn test_kind() {
        assert_eq!(Node::from("x").kind(), "a string");
        assert_eq!(Node::Table(Table::new()).kind(), "a table");
        assert_eq!(Node::Scalar(Scalar::Null).kind(), "null");
        assert!(Node::Scalar(Scalar::Null).is_null());
    }
}
