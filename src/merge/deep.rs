//! Deep merge of configuration trees.
//!
//! Tables merge field by field with the overlay winning. Arrays are replaced
//! entirely, not concatenated. A null overlay means "not specified".

use crate::document::{Node, Table};

/// Deep merge two nodes, with `overlay` taking precedence over `base`.
///
/// - Tables are merged recursively: keys in overlay override keys in base
/// - Arrays and scalars are replaced entirely
/// - If overlay is null, the base value is preserved
pub fn deep_merge(base: Node, overlay: Node) -> Node {
    match (base, overlay) {
        (Node::Table(mut base_table), Node::Table(overlay_table)) => {
            merge_tables(&mut base_table, overlay_table);
            Node::Table(base_table)
        }
        (base, overlay) if overlay.is_null() => base,
        (_, Node::Table(overlay_table)) => {
            let mut fresh = Table::new();
            merge_tables(&mut fresh, overlay_table);
            Node::Table(fresh)
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into `base` in place.
///
/// Existing keys keep their position; new keys are appended. Nulls never
/// create a key, including nulls nested in a new sub-table.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match base.get_mut(&key) {
            Some(slot) => {
                let current = std::mem::replace(slot, Node::Table(Table::new()));
                *slot = deep_merge(current, overlay_value);
            }
            None if overlay_value.is_null() => {}
            None => {
                base.insert(key, deep_merge(Node::Table(Table::new()), overlay_value));
            }
        }
    }
}
