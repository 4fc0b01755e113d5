//! Logical-expression AST produced from a canonical filter.
//!
//! The AST mirrors the filter one to one: no flattening, no reordering, no
//! simplification. A one-child `And` stays a one-child `And`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Group combinator of a logical node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Case-insensitive; anything other than `OR` is `And`.
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("or") {
            LogicalOperator::Or
        } else {
            LogicalOperator::And
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    /// One value; may be null when nothing was entered.
    Value { value: Value },
    /// Inclusive range; a missing bound is null.
    Range { from: Value, to: Value },
    InList { values: Vec<Value> },
    /// Operators such as `is empty` take no operand.
    None,
}

impl Operand {
    pub fn value(value: impl Into<Value>) -> Self {
        Operand::Value {
            value: value.into(),
        }
    }

    pub fn range(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Operand::Range {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn in_list(values: Vec<Value>) -> Self {
        Operand::InList { values }
    }
}

/// Normalized logical expression.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum LogicalExpression {
    /// All children must hold.
    And { children: Vec<LogicalExpression> },
    /// At least one child must hold.
    Or { children: Vec<LogicalExpression> },
    /// `field operator operand`.
    Compare {
        field: String,
        operator: String,
        operand: Operand,
    },
}

impl LogicalExpression {
    pub fn and(children: Vec<LogicalExpression>) -> Self {
        LogicalExpression::And { children }
    }

    pub fn or(children: Vec<LogicalExpression>) -> Self {
        LogicalExpression::Or { children }
    }

    pub fn group(op: LogicalOperator, children: Vec<LogicalExpression>) -> Self {
        match op {
            LogicalOperator::And => LogicalExpression::And { children },
            LogicalOperator::Or => LogicalExpression::Or { children },
        }
    }

    pub fn compare(
        field: impl Into<String>,
        operator: impl Into<String>,
        operand: Operand,
    ) -> Self {
        LogicalExpression::Compare {
            field: field.into(),
            operator: operator.into(),
            operand,
        }
    }

    /// Combinator of a group, `None` for a comparison.
    pub fn operator(&self) -> Option<LogicalOperator> {
        match self {
            LogicalExpression::And { .. } => Some(LogicalOperator::And),
            LogicalExpression::Or { .. } => Some(LogicalOperator::Or),
            LogicalExpression::Compare { .. } => None,
        }
    }

    pub fn children(&self) -> &[LogicalExpression] {
        match self {
            LogicalExpression::And { children } | LogicalExpression::Or { children } => children,
            LogicalExpression::Compare { .. } => &[],
        }
    }

    /// Every comparison in the expression, depth-first.
    pub fn comparisons(&self) -> Vec<&LogicalExpression> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                LogicalExpression::Compare { .. } => out.push(expr),
                _ => stack.extend(expr.children().iter().rev()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logical_operator_parse() {
        assert_eq!(LogicalOperator::parse("OR"), LogicalOperator::Or);
        assert_eq!(LogicalOperator::parse("or"), LogicalOperator::Or);
        assert_eq!(LogicalOperator::parse("AND"), LogicalOperator::And);
        assert_eq!(LogicalOperator::parse("XOR"), LogicalOperator::And);
    }

    #[test]
    fn test_ast_json_shape() {
        let ast = LogicalExpression::and(vec![LogicalExpression::compare(
            "age",
            "between",
            Operand::range(18, 65),
        )]);
        let value = serde_json::to_value(&ast).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "And",
                "children": [{
                    "type": "Compare",
                    "field": "age",
                    "operator": "between",
                    "operand": {"kind": "range", "from": 18, "to": 65}
                }]
            })
        );
        let parsed: LogicalExpression = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, ast);
    }

    #[test]
    fn test_operand_none_json() {
        let value = serde_json::to_value(Operand::None).unwrap();
        assert_eq!(value, json!({"kind": "none"}));
    }

    #[test]
    fn test_comparisons_in_order() {
        let ast = LogicalExpression::or(vec![
            LogicalExpression::compare("a", "equals", Operand::value(1)),
            LogicalExpression::and(vec![
                LogicalExpression::compare("b", "in", Operand::in_list(vec![json!(2)])),
                LogicalExpression::compare("c", "is empty", Operand::None),
            ]),
        ]);
        let fields: Vec<&str> = ast
            .comparisons()
            .into_iter()
            .filter_map(|c| match c {
                LogicalExpression::Compare { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, ["a", "b", "c"]);
        assert_eq!(ast.operator(), Some(LogicalOperator::Or));
    }
}
