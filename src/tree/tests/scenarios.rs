use std::rc::Rc;

use super::super::*;
use super::common::*;
use crate::ast::{LogicalExpression, Operand};
use crate::catalog::{Field, FieldCatalog, FieldType};
use crate::convert::convert;
use crate::markup::MarkupVisitor;
use crate::schema::where_schema::{self, CONDITION, LOGICAL};
use crate::serialize::serialize;
use crate::validator::Validator;
use serde_json::json;

fn age_catalog() -> FieldCatalog {
    FieldCatalog::new(vec![Field::new("age", "Age", FieldType::Number)])
        .with_operators(
            FieldType::Number,
            vec!["equals".to_owned(), "between".to_owned()],
        )
        .unwrap()
}

#[test]
fn test_age_between_pipeline() {
    let catalog = Rc::new(age_catalog());
    let validator = Rc::new(Validator::new(Rc::clone(&catalog)));
    let schema = where_schema::WhereSchema::new(Rc::clone(&catalog), Rc::clone(&validator))
        .factory()
        .unwrap();
    let mut tree = Tree::build(schema);
    let condition = first_condition(&tree);

    assert_eq!(value_of(&tree, condition, "#field"), json!("age"));
    assert_eq!(value_of(&tree, condition, "#operator"), json!("equals"));
    assert_eq!(
        where_schema::operand(&tree, condition).unwrap(),
        Operand::value(Value::Null)
    );

    tree.change(condition, "#operator", json!("between")).unwrap();
    assert_eq!(
        where_schema::operand(&tree, condition).unwrap(),
        Operand::range(Value::Null, Value::Null)
    );

    tree.change(condition, "#from", json!(18)).unwrap();
    tree.change(condition, "#to", json!(65)).unwrap();

    let filter = serialize(&tree).unwrap();
    assert_eq!(
        filter,
        json!({
            "type": "logical",
            "operator": "AND",
            "children": [{"field": "age", "operator": "between", "from": 18, "to": 65}]
        })
    );

    let ast = convert(&filter).unwrap();
    assert_eq!(
        ast,
        LogicalExpression::and(vec![LogicalExpression::compare(
            "age",
            "between",
            Operand::range(18, 65)
        )])
    );

    let visitor = MarkupVisitor::for_catalog(catalog, validator);
    assert_eq!(visitor.visit(&ast), "Age between 18 and 65");
}

#[test]
fn test_nested_groups_round_trip() {
    let mut tree = where_tree(catalog());
    let root = tree.root();
    tree.change(root, "#logical-op", json!("OR")).unwrap();
    let first = first_condition(&tree);
    tree.change(first, "#operator", json!("in")).unwrap();
    tree.add_value(first, "#in-operand", json!("x")).unwrap();
    tree.add_value(first, "#in-operand", json!("y")).unwrap();

    let nested = tree.add_child(root, LOGICAL).unwrap();
    let inner = tree.children(nested).unwrap()[0];
    tree.change(inner, "#field", json!("active")).unwrap();
    tree.change(inner, "#value", json!(true)).unwrap();
    let empty = tree.add_child(nested, CONDITION).unwrap();
    tree.change(empty, "#operator", json!("is not empty")).unwrap();

    let filter = serialize(&tree).unwrap();
    assert_eq!(
        filter,
        json!({
            "type": "logical",
            "operator": "OR",
            "children": [
                {"field": "name", "operator": "in", "values": ["x", "y"]},
                {
                    "type": "logical",
                    "operator": "AND",
                    "children": [
                        {"field": "active", "operator": "equals", "value": true},
                        {"field": "name", "operator": "is not empty"}
                    ]
                }
            ]
        })
    );

    let ast = convert(&filter).unwrap();
    assert_eq!(
        ast,
        LogicalExpression::or(vec![
            LogicalExpression::compare(
                "name",
                "in",
                Operand::in_list(vec![json!("x"), json!("y")])
            ),
            LogicalExpression::and(vec![
                LogicalExpression::compare("active", "equals", Operand::value(true)),
                LogicalExpression::compare("name", "is not empty", Operand::None),
            ]),
        ])
    );
}

#[test]
fn test_comparisons_match_condition_nodes() {
    let mut tree = where_tree(catalog());
    let root = tree.root();
    for _ in 0..3 {
        tree.add_child(root, CONDITION).unwrap();
    }
    let conditions = tree.nodes_with_id(CONDITION);
    tree.change(conditions[1], "#field", json!("age")).unwrap();
    tree.change(conditions[1], "#operator", json!("between")).unwrap();
    tree.change(conditions[2], "#operator", json!("is empty")).unwrap();
    tree.change(conditions[3], "#operator", json!("in")).unwrap();

    let ast = convert(&serialize(&tree).unwrap()).unwrap();
    let comparisons = ast.comparisons();
    assert_eq!(comparisons.len(), conditions.len());
    for (node, comparison) in conditions.iter().zip(comparisons) {
        let LogicalExpression::Compare {
            field,
            operator,
            operand,
        } = comparison
        else {
            panic!("expected a comparison");
        };
        assert_eq!(&value_of(&tree, *node, "#field"), field);
        assert_eq!(&value_of(&tree, *node, "#operator"), operator);
        assert_eq!(&where_schema::operand(&tree, *node).unwrap(), operand);
    }
}

#[test]
fn test_empty_logical_group_converts_to_nothing() {
    let mut tree = where_tree(catalog());
    let root = tree.root();
    let condition = first_condition(&tree);
    tree.remove_child(root, condition).unwrap();
    let filter = serialize(&tree).unwrap();
    assert_eq!(
        filter,
        json!({"type": "logical", "operator": "AND", "children": []})
    );
    assert_eq!(convert(&filter), None);
}
