//! Canonical filter object → [`LogicalExpression`].
//!
//! Conversion never fails. Groups without convertible children disappear,
//! unrecognized nodes are skipped, and a leaf with missing parts still
//! becomes a comparison.

use serde_json::{Map, Value};
use tracing::trace;

use crate::ast::{LogicalExpression, LogicalOperator, Operand};

/// Convert a serialized filter. `None` when nothing convertible remains.
pub fn convert(filter: &Value) -> Option<LogicalExpression> {
    let object = filter.as_object()?;
    if object.contains_key("field") {
        return Some(convert_leaf(object));
    }
    if is_group(object) {
        return convert_group(object);
    }
    trace!(?filter, "skipping unrecognized filter node");
    None
}

fn is_group(object: &Map<String, Value>) -> bool {
    object.get("type").and_then(Value::as_str) == Some("logical") || object.contains_key("children")
}

fn convert_group(object: &Map<String, Value>) -> Option<LogicalExpression> {
    let children: Vec<LogicalExpression> = object
        .get("children")
        .and_then(Value::as_array)
        .map(|children| children.iter().filter_map(convert).collect())
        .unwrap_or_default();
    if children.is_empty() {
        return None;
    }
    let op = object
        .get("operator")
        .and_then(Value::as_str)
        .map_or(LogicalOperator::And, LogicalOperator::parse);
    Some(LogicalExpression::group(op, children))
}

fn convert_leaf(object: &Map<String, Value>) -> LogicalExpression {
    let field = match object.get("field") {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let operator = object
        .get("operator")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    LogicalExpression::compare(field, operator, convert_operand(object))
}

fn convert_operand(object: &Map<String, Value>) -> Operand {
    let from = object.get("from");
    let to = object.get("to");
    if from.is_some() || to.is_some() {
        return Operand::Range {
            from: from.cloned().unwrap_or(Value::Null),
            to: to.cloned().unwrap_or(Value::Null),
        };
    }
    if let Some(values) = object.get("values") {
        let values = match values {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        };
        return Operand::InList { values };
    }
    match object.get("value") {
        Some(value) => Operand::Value {
            value: value.clone(),
        },
        None => Operand::None,
    }
}
