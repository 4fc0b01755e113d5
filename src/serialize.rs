//! Live tree → canonical filter object.
//!
//! Only nodes with a `serialize` projection contribute. Projections read the
//! named property of a Line expression, searching nested groups, so
//! `#value`, `#from`, `#to` and `#in-operand` are found inside `#operand`.
//! An expression that exists contributes its property even when it is null;
//! an expression that does not exist contributes nothing.

use serde_json::{Map, Value};

use crate::schema::SerializeEntry;
use crate::tree::{NodeId, Tree};

/// Serialize the whole tree from its root.
pub fn serialize(tree: &Tree) -> Option<Value> {
    serialize_node(tree, tree.root())
}

/// Serialize the subtree rooted at `id`.
pub fn serialize_node(tree: &Tree, id: NodeId) -> Option<Value> {
    let node = tree.node(id).ok()?;
    let spec = node.schema().serialize.as_ref()?;

    let mut out = Map::new();
    for entry in spec.entries() {
        match entry {
            SerializeEntry::Constant { key, value } => {
                out.insert(key.clone(), value.clone());
            }
            SerializeEntry::Project {
                source,
                property,
                key,
            } => {
                if let Some(value) = node
                    .line()
                    .find(source)
                    .and_then(|expr| expr.project(*property))
                {
                    out.insert(key.clone(), value);
                }
            }
        }
    }

    if !node.schema().nodes.is_empty() || !node.children().is_empty() {
        let children: Vec<Value> = node
            .children()
            .iter()
            .filter_map(|&child| serialize_node(tree, child))
            .collect();
        out.insert("children".to_owned(), Value::Array(children));
    }

    Some(Value::Object(out))
}
