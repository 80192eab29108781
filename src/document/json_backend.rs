//! JSON documents backed by `serde_json` with insertion-ordered objects.

use super::node::{Node, Scalar, Table};
use super::path::KeyPath;
use super::{DocumentError, Format};
use crate::error::ParseError;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Indentation used when a modified document is rendered.
const INDENT: &[u8] = b"    ";

pub(super) fn parse(input: &str) -> Result<Value, ParseError> {
    let value: Value = if input.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(input).map_err(|err| {
            let message = err.to_string();
            // serde_json appends " at line L column C"; keep the bare message
            let message = match message.rfind(" at line ") {
                Some(i) => message[..i].to_string(),
                None => message,
            };
            ParseError::new(Format::Json, message).at(err.line(), err.column())
        })?
    };

    if !value.is_object() {
        return Err(ParseError::new(
            Format::Json,
            format!("expected a top-level object, found {}", value_kind(&value)),
        ));
    }
    Ok(value)
}

pub(super) fn render(value: &Value) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    // Serializing a Value into a Vec cannot fail
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}

pub(super) fn root(value: &Value) -> Table {
    match value {
        Value::Object(map) => object_to_table(map),
        _ => Table::new(),
    }
}

pub(super) fn lookup(value: &Value, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
    let segments = path.segments();
    let mut current = value;

    for (depth, segment) in segments.iter().enumerate() {
        let Value::Object(map) = current else {
            return Err(DocumentError::NotATable {
                path: path.prefix_display(depth),
                found: value_kind(current),
            });
        };
        match map.get(segment.as_str()) {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }

    Ok(Some(value_to_node(current)))
}

pub(super) fn set(value: &mut Value, path: &KeyPath, node: Node) -> Result<(), DocumentError> {
    let new_value = node_to_value(node).map_err(|reason| DocumentError::Unrepresentable {
        path: path.to_string(),
        reason,
    })?;

    let segments = path.segments();
    let mut current = value;

    for (depth, segment) in segments[..segments.len() - 1].iter().enumerate() {
        let found = value_kind(current);
        let Value::Object(map) = current else {
            return Err(DocumentError::NotATable {
                path: path.prefix_display(depth),
                found,
            });
        };
        current = map
            .entry(segment.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let found = value_kind(current);
    let Value::Object(map) = current else {
        return Err(DocumentError::NotATable {
            path: path.prefix_display(segments.len() - 1),
            found,
        });
    };
    // Map::insert keeps the position of an existing key
    map.insert(path.leaf().to_string(), new_value);
    Ok(())
}

pub(super) fn delete(value: &mut Value, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
    let segments = path.segments();
    let mut current = value;

    for (depth, segment) in segments[..segments.len() - 1].iter().enumerate() {
        let found = value_kind(current);
        let Value::Object(map) = current else {
            return Err(DocumentError::NotATable {
                path: path.prefix_display(depth),
                found,
            });
        };
        match map.get_mut(segment.as_str()) {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }

    let found = value_kind(current);
    let Value::Object(map) = current else {
        return Err(DocumentError::NotATable {
            path: path.prefix_display(segments.len() - 1),
            found,
        });
    };

    let leaf = path.leaf();
    let Some(removed) = map.get(leaf).map(value_to_node) else {
        return Ok(None);
    };
    // Rebuild rather than swap-remove so sibling order is kept
    *map = std::mem::take(map)
        .into_iter()
        .filter(|(key, _)| key != leaf)
        .collect();
    Ok(Some(removed))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn object_to_table(map: &Map<String, Value>) -> Table {
    map.iter()
        .map(|(key, value)| (key.as_str(), value_to_node(value)))
        .collect()
}

/// Convert a JSON value into a tree node.
pub(crate) fn value_to_node(value: &Value) -> Node {
    match value {
        Value::Null => Node::Scalar(Scalar::Null),
        Value::Bool(b) => Node::Scalar(Scalar::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Node::Scalar(Scalar::Integer(i)),
            None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => Node::Scalar(Scalar::String(s.clone())),
        Value::Array(items) => Node::Array(items.iter().map(value_to_node).collect()),
        Value::Object(map) => Node::Table(object_to_table(map)),
    }
}

/// Convert a tree node into a JSON value.
fn node_to_value(node: Node) -> Result<Value, String> {
    match node {
        Node::Scalar(Scalar::String(s)) | Node::Scalar(Scalar::Datetime(s)) => Ok(Value::String(s)),
        Node::Scalar(Scalar::Integer(i)) => Ok(Value::Number(i.into())),
        Node::Scalar(Scalar::Float(f)) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("{} cannot be represented in JSON", f)),
        Node::Scalar(Scalar::Bool(b)) => Ok(Value::Bool(b)),
        Node::Scalar(Scalar::Null) => Ok(Value::Null),
        Node::Array(items) => items
            .into_iter()
            .map(node_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Node::Table(table) => {
            let mut map = Map::new();
            for (key, child) in table {
                map.insert(key, node_to_value(child)?);
            }
            Ok(Value::Object(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_empty_object() {
        assert_eq!(parse("").unwrap(), json!({}));
        assert_eq!(parse("  \n").unwrap(), json!({}));
    }

    #[test]
    fn test_parse_error_location() {
        let err = parse("{\n  \"a\": 1,\n}").unwrap_err();
        assert_eq!(err.format, Format::Json);
        assert_eq!(err.line, Some(3));
        assert!(!err.message.contains(" at line "));
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = parse("[1, 2]").unwrap_err();
        assert!(err.message.contains("top-level object"));
    }

    #[test]
    fn test_render_uses_four_space_indent() {
        let rendered = render(&json!({"runtimes": {"nvidia": {"path": "/usr/bin/nvidia"}}}));
        assert_eq!(
            rendered,
            "{\n    \"runtimes\": {\n        \"nvidia\": {\n            \"path\": \"/usr/bin/nvidia\"\n        }\n    }\n}"
        );
    }

    #[test]
    fn test_delete_preserves_order() {
        let mut value = json!({"a": 1, "b": 2, "c": 3});
        let removed = delete(&mut value, &KeyPath::key("b")).unwrap();
        assert_eq!(removed, Some(Node::from(2i64)));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut value = json!({"runtimes": "oops"});
        let err = set(
            &mut value,
            &KeyPath::parse("runtimes.nvidia").unwrap(),
            Node::from("x"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DocumentError::NotATable {
                path: "runtimes".to_string(),
                found: "a string",
            }
        );
        assert_eq!(value, json!({"runtimes": "oops"}));
    }

    #[test]
    fn test_float_nan_is_unrepresentable() {
        assert!(node_to_value(Node::Scalar(Scalar::Float(f64::NAN))).is_err());
    }
}
