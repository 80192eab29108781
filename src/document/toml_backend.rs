//! TOML documents backed by `toml_edit`, which keeps comments, whitespace
//! and table layout of every region that is not rewritten.

use super::node::{Node, Scalar, Table};
use super::path::KeyPath;
use super::{DocumentError, Format};
use crate::error::ParseError;
use toml_edit::{Array, DocumentMut, InlineTable, Item, TableLike, Value};

pub(super) fn parse(input: &str) -> Result<DocumentMut, ParseError> {
    input.parse::<DocumentMut>().map_err(|err| {
        let error = ParseError::new(Format::Toml, err.message().trim());
        match err.span() {
            Some(span) => error.at_offset(input, span.start),
            None => error,
        }
    })
}

pub(super) fn root(doc: &DocumentMut) -> Table {
    table_like_to_table(doc.as_table())
}

pub(super) fn lookup(doc: &DocumentMut, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
    let segments = path.segments();
    let mut current: &dyn TableLike = doc.as_table();

    for (depth, segment) in segments.iter().enumerate() {
        let Some(item) = current.get(segment) else {
            return Ok(None);
        };
        if depth + 1 == segments.len() {
            return Ok(item_to_node(item));
        }
        current = item.as_table_like().ok_or_else(|| DocumentError::NotATable {
            path: path.prefix_display(depth + 1),
            found: item_kind(item),
        })?;
    }

    Ok(None)
}

pub(super) fn set(doc: &mut DocumentMut, path: &KeyPath, node: Node) -> Result<(), DocumentError> {
    // Convert first: a node that cannot be represented must not leave
    // freshly created parent tables behind.
    let item = node_to_item(node).map_err(|reason| DocumentError::Unrepresentable {
        path: path.to_string(),
        reason,
    })?;
    insert_item(doc, path, item)
}

/// Create an implicit table at `path`: it prints no header until it holds values.
pub(super) fn set_implicit_table(doc: &mut DocumentMut, path: &KeyPath) -> Result<(), DocumentError> {
    insert_item(doc, path, implicit_table())
}

fn implicit_table() -> Item {
    let mut table = toml_edit::Table::new();
    table.set_implicit(true);
    Item::Table(table)
}

fn insert_item(doc: &mut DocumentMut, path: &KeyPath, item: Item) -> Result<(), DocumentError> {
    let segments = path.segments();
    let mut current: &mut dyn TableLike = doc.as_table_mut();

    for (depth, segment) in segments[..segments.len() - 1].iter().enumerate() {
        if !current.contains_key(segment) {
            current.insert(segment, implicit_table());
        }
        let child = current
            .get_mut(segment)
            .ok_or_else(|| DocumentError::NotATable {
                path: path.prefix_display(depth + 1),
                found: "nothing",
            })?;
        let found = item_kind(child);
        current = child
            .as_table_like_mut()
            .ok_or_else(|| DocumentError::NotATable {
                path: path.prefix_display(depth + 1),
                found,
            })?;
    }

    current.insert(path.leaf(), item);
    Ok(())
}

pub(super) fn delete(doc: &mut DocumentMut, path: &KeyPath) -> Result<Option<Node>, DocumentError> {
    let segments = path.segments();
    let mut current: &mut dyn TableLike = doc.as_table_mut();

    for (depth, segment) in segments[..segments.len() - 1].iter().enumerate() {
        let Some(child) = current.get_mut(segment) else {
            return Ok(None);
        };
        let found = item_kind(child);
        current = child
            .as_table_like_mut()
            .ok_or_else(|| DocumentError::NotATable {
                path: path.prefix_display(depth + 1),
                found,
            })?;
    }

    Ok(current.remove(path.leaf()).and_then(|item| item_to_node(&item)))
}

fn item_kind(item: &Item) -> &'static str {
    match item {
        Item::None => "nothing",
        Item::Table(_) => "a table",
        Item::ArrayOfTables(_) => "an array of tables",
        Item::Value(value) => match value {
            Value::String(_) => "a string",
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Boolean(_) => "a boolean",
            Value::Datetime(_) => "a datetime",
            Value::Array(_) => "an array",
            Value::InlineTable(_) => "an inline table",
        },
    }
}

fn table_like_to_table(table: &dyn TableLike) -> Table {
    table
        .iter()
        .filter_map(|(key, item)| item_to_node(item).map(|node| (key, node)))
        .collect()
}

fn item_to_node(item: &Item) -> Option<Node> {
    match item {
        Item::None => None,
        Item::Value(value) => Some(value_to_node(value)),
        Item::Table(table) => Some(Node::Table(table_like_to_table(table))),
        Item::ArrayOfTables(tables) => Some(Node::Array(
            tables
                .iter()
                .map(|table| Node::Table(table_like_to_table(table)))
                .collect(),
        )),
    }
}

fn value_to_node(value: &Value) -> Node {
    match value {
        Value::String(s) => Node::Scalar(Scalar::String(s.value().clone())),
        Value::Integer(i) => Node::Scalar(Scalar::Integer(*i.value())),
        Value::Float(f) => Node::Scalar(Scalar::Float(*f.value())),
        Value::Boolean(b) => Node::Scalar(Scalar::Bool(*b.value())),
        Value::Datetime(d) => Node::Scalar(Scalar::Datetime(d.value().to_string())),
        Value::Array(array) => Node::Array(array.iter().map(value_to_node).collect()),
        Value::InlineTable(table) => Node::Table(
            table
                .iter()
                .map(|(key, value)| (key, value_to_node(value)))
                .collect(),
        ),
    }
}

/// Tables become standard `[a.b]` tables; everything else becomes a value.
fn node_to_item(node: Node) -> Result<Item, String> {
    match node {
        Node::Table(table) => {
            let mut out = toml_edit::Table::new();
            for (key, child) in table {
                out.insert(&key, node_to_item(child)?);
            }
            Ok(Item::Table(out))
        }
        other => node_to_value(other).map(Item::Value),
    }
}

fn node_to_value(node: Node) -> Result<Value, String> {
    match node {
        Node::Scalar(Scalar::String(s)) => Ok(Value::from(s)),
        Node::Scalar(Scalar::Integer(i)) => Ok(Value::from(i)),
        Node::Scalar(Scalar::Float(f)) => Ok(Value::from(f)),
        Node::Scalar(Scalar::Bool(b)) => Ok(Value::from(b)),
        Node::Scalar(Scalar::Datetime(d)) => d
            .parse::<toml_edit::Datetime>()
            .map(Value::from)
            .map_err(|err| format!("invalid datetime {:?}: {}", d, err)),
        Node::Scalar(Scalar::Null) => Err("TOML has no null value".to_string()),
        Node::Array(items) => {
            let mut array = Array::new();
            for item in items {
                array.push(node_to_value(item)?);
            }
            Ok(Value::Array(array))
        }
        Node::Table(table) => {
            let mut inline = InlineTable::new();
            for (key, child) in table {
                inline.insert(key.as_str(), node_to_value(child)?);
            }
            Ok(Value::InlineTable(inline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_has_location() {
        let err = parse("a = 1\nb = \n").unwrap_err();
        assert_eq!(err.format, Format::Toml);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_dotted_keys_read_as_tables() {
        let dotted = parse("nvidia-container-runtime.debug = \"/foo/bar\"").unwrap();
        let section = parse("[nvidia-container-runtime]\ndebug = \"/foo/bar\"").unwrap();
        assert_eq!(root(&dotted), root(&section));
    }

    #[test]
    fn test_inline_table_is_traversed() {
        let mut doc = parse("runtimes = { runc = { path = \"/usr/bin/runc\" } }\n").unwrap();
        let path = KeyPath::parse("runtimes.runc.path").unwrap();
        assert_eq!(
            lookup(&doc, &path).unwrap().and_then(|n| n.as_str().map(String::from)),
            Some("/usr/bin/runc".to_string())
        );

        set(&mut doc, &KeyPath::parse("runtimes.nvidia.path").unwrap(), Node::from("/usr/bin/nvidia"))
            .unwrap();
        let rendered = doc.to_string();
        assert!(rendered.starts_with("runtimes = {"));
        assert!(rendered.contains("nvidia"));
    }

    #[test]
    fn test_set_rejects_null() {
        let mut doc = parse("").unwrap();
        let err = set(&mut doc, &KeyPath::parse("a.b").unwrap(), Node::Scalar(Scalar::Null))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Unrepresentable { .. }));
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn test_datetime_round_trip() {
        let mut doc = parse("when = 1979-05-27T07:32:00Z\n").unwrap();
        let node = lookup(&doc, &KeyPath::key("when")).unwrap().unwrap();
        assert_eq!(node, Node::Scalar(Scalar::Datetime("1979-05-27T07:32:00Z".into())));

        set(&mut doc, &KeyPath::key("again"), node).unwrap();
        assert!(doc.to_string().contains("again = 1979-05-27T07:32:00Z"));
    }
}
