use std::rc::Rc;

use serde_json::Value;

use crate::catalog::{Field, FieldCatalog, FieldType};
use crate::schema::where_schema::{CONDITION, WhereSchema};
use crate::tree::{NodeId, Tree};
use crate::validator::{Validator, ValueRules};

/// Catalog used by most cascade tests.
pub fn catalog() -> FieldCatalog {
    FieldCatalog::new(vec![
        Field::new("name", "Name", FieldType::Text),
        Field::new("age", "Age", FieldType::Number),
        Field::new("born", "Born", FieldType::Date),
        Field::new("active", "Active", FieldType::Boolean),
    ])
}

pub fn where_tree(catalog: FieldCatalog) -> Tree {
    let catalog = Rc::new(catalog);
    let validator = Validator::new(Rc::clone(&catalog)).with_rules(
        "age",
        ValueRules {
            min: Some(0.0),
            max: Some(150.0),
            ..ValueRules::default()
        },
    );
    let schema = WhereSchema::new(catalog, Rc::new(validator))
        .factory()
        .unwrap();
    Tree::build(schema)
}

pub fn first_condition(tree: &Tree) -> NodeId {
    tree.nodes_with_id(CONDITION)[0]
}

/// Ids of the expressions inside a condition's operand group.
pub fn operand_ids(tree: &Tree, condition: NodeId) -> Vec<String> {
    tree.expression(condition, "#operand")
        .unwrap()
        .line()
        .map(|line| line.ids().map(str::to_owned).collect())
        .unwrap_or_default()
}

pub fn value_of(tree: &Tree, node: NodeId, id: &str) -> Value {
    tree.expression(node, id)
        .unwrap()
        .value()
        .cloned()
        .unwrap_or(Value::Null)
}
