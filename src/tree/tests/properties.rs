use super::super::*;
use super::common::*;
use crate::ast::LogicalExpression;
use crate::catalog::{Field, FieldCatalog, FieldType, OperandShape, Operator, operand_shape};
use crate::convert::convert;
use crate::schema::where_schema::{self, CONDITION};
use crate::serialize::serialize;
use proptest::prelude::*;
use serde_json::json;

fn field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Text),
        Just(FieldType::Number),
        Just(FieldType::Date),
        Just(FieldType::Boolean),
        "[a-z]{1,8}".prop_map(|name: String| FieldType::from(name)),
    ]
}

fn list_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!("")),
        Just(json!(0)),
        Just(json!(false)),
        "[a-c]".prop_map(|s: String| Value::from(s)),
        (1..4i64).prop_map(|n: i64| Value::from(n)),
    ]
}

fn is_falsy(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
        || value.as_str() == Some("")
        || value.as_i64() == Some(0)
}

proptest! {
    #[test]
    fn prop_operators_nonempty_and_recognized(ty in field_type()) {
        let catalog = FieldCatalog::new(vec![Field::new("f", "F", ty)]);
        let operators = catalog.operators_for_key("f").unwrap();
        prop_assert!(!operators.is_empty());
        for name in &operators {
            prop_assert!(Operator::parse(name).is_some());
            prop_assert!(operand_shape(name).is_some());
        }
    }

    #[test]
    fn prop_list_add_dedups_and_keeps_order(values in prop::collection::vec(list_value(), 0..12)) {
        let mut tree = where_tree(catalog());
        let condition = first_condition(&tree);
        tree.change(condition, "#operator", json!("in")).unwrap();
        for value in &values {
            tree.add_value(condition, "#in-operand", value.clone()).unwrap();
        }

        let mut expected: Vec<Value> = Vec::new();
        for value in values {
            if !is_falsy(&value) && !expected.contains(&value) {
                expected.push(value);
            }
        }
        let actual = tree.expression(condition, "#in-operand").unwrap().values().unwrap().to_vec();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_operand_shape_matches_operator(index in 0..Operator::ALL.len()) {
        let op = Operator::ALL[index];
        let mut tree = where_tree(catalog());
        let condition = first_condition(&tree);
        tree.change(condition, "#operator", json!(op.as_str())).unwrap();
        let ids = operand_ids(&tree, condition);
        let expected: &[&str] = match op.shape() {
            OperandShape::Single => &["#value"],
            OperandShape::Range => &["#from", "#and", "#to"],
            OperandShape::List => &["#in-open", "#in-operand", "#in-close"],
            OperandShape::None => &[],
        };
        prop_assert_eq!(ids, expected.to_vec());
    }

    #[test]
    fn prop_round_trip_enumerates_conditions(
        edits in prop::collection::vec((0..4usize, 0..Operator::ALL.len(), -5..200i64), 1..6)
    ) {
        let keys = ["name", "age", "born", "active"];
        let mut tree = where_tree(catalog());
        let root = tree.root();
        for _ in 1..edits.len() {
            tree.add_child(root, CONDITION).unwrap();
        }
        let conditions = tree.nodes_with_id(CONDITION);
        for (&node, &(field, op, n)) in conditions.iter().zip(&edits) {
            tree.change(node, "#field", json!(keys[field])).unwrap();
            let operator = Operator::ALL[op].as_str();
            let legal = tree.options(node, "#operator").unwrap();
            if legal.contains(&json!(operator)) {
                tree.change(node, "#operator", json!(operator)).unwrap();
            }
            match operand_ids(&tree, node).first().map(String::as_str) {
                Some("#value") => tree.change(node, "#value", json!(n)).unwrap(),
                Some("#from") => tree.change(node, "#from", json!(n)).unwrap(),
                Some("#in-open") => tree.add_value(node, "#in-operand", json!(n)).unwrap(),
                _ => {}
            }
        }

        let ast = convert(&serialize(&tree).unwrap()).unwrap();
        let comparisons = ast.comparisons();
        prop_assert_eq!(comparisons.len(), conditions.len());
        for (&node, comparison) in conditions.iter().zip(comparisons) {
            let LogicalExpression::Compare { field, operator, operand } = comparison else {
                return Err(TestCaseError::fail("expected a comparison"));
            };
            prop_assert_eq!(&value_of(&tree, node, "#field"), field);
            prop_assert_eq!(&value_of(&tree, node, "#operator"), operator);
            prop_assert_eq!(&where_schema::operand(&tree, node).unwrap(), operand);
        }
    }
}

