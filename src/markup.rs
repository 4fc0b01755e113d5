//! AST → human-readable display string.
//!
//! The visitor knows nothing about the catalog; it is handed three
//! capabilities: a title lookup, a type lookup and a value check.

use std::rc::Rc;

use serde_json::Value;

use crate::ast::{LogicalExpression, Operand};
use crate::catalog::{FieldCatalog, FieldType};
use crate::validator::Validator;

/// Appended to comparisons that fail validation.
pub const INVALID_MARKER: &str = " [invalid]";

type TitleOf = Box<dyn Fn(&str) -> Option<String>>;
type TypeOf = Box<dyn Fn(&str) -> Option<FieldType>>;
type IsValid = Box<dyn Fn(&str, &Value) -> bool>;

pub struct MarkupVisitor {
    title_of: TitleOf,
    type_of: TypeOf,
    is_valid: IsValid,
}

impl MarkupVisitor {
    pub fn new(
        title_of: impl Fn(&str) -> Option<String> + 'static,
        type_of: impl Fn(&str) -> Option<FieldType> + 'static,
        is_valid: impl Fn(&str, &Value) -> bool + 'static,
    ) -> Self {
        Self {
            title_of: Box::new(title_of),
            type_of: Box::new(type_of),
            is_valid: Box::new(is_valid),
        }
    }

    /// Capabilities backed by a catalog and its validator.
    pub fn for_catalog(catalog: Rc<FieldCatalog>, validator: Rc<Validator>) -> Self {
        let titles = Rc::clone(&catalog);
        Self::new(
            move |key| titles.title_of(key).map(str::to_owned),
            move |key| catalog.type_of(key).cloned(),
            move |key, value| validator.is_valid(key, value),
        )
    }

    /// Render an expression. Pure: the same AST always renders the same way.
    pub fn visit(&self, expression: &LogicalExpression) -> String {
        self.render(expression, false)
    }

    fn render(&self, expression: &LogicalExpression, nested: bool) -> String {
        match expression {
            LogicalExpression::And { children } => self.group(children, "and", nested),
            LogicalExpression::Or { children } => self.group(children, "or", nested),
            LogicalExpression::Compare {
                field,
                operator,
                operand,
            } => self.compare(field, operator, operand),
        }
    }

    fn group(&self, children: &[LogicalExpression], joiner: &str, nested: bool) -> String {
        let parts: Vec<String> = children.iter().map(|c| self.render(c, true)).collect();
        let joined = parts.join(&format!(" {joiner} "));
        if nested && parts.len() > 1 {
            format!("({joined})")
        } else {
            joined
        }
    }

    fn compare(&self, field: &str, operator: &str, operand: &Operand) -> String {
        let title = (self.title_of)(field);
        let known = title.is_some();
        let field_type = (self.type_of)(field);
        let check = |value: &Value| (self.is_valid)(field, value);

        let (text, valid) = match operand {
            Operand::Value { value } => (format_value(value, field_type.as_ref()), check(value)),
            Operand::Range { from, to } => (
                format!(
                    "{} and {}",
                    format_value(from, field_type.as_ref()),
                    format_value(to, field_type.as_ref())
                ),
                check(from) && check(to),
            ),
            Operand::InList { values } => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| format_value(v, field_type.as_ref()))
                    .collect();
                (
                    format!("({})", items.join(", ")),
                    check(&Value::Array(values.clone())),
                )
            }
            Operand::None => (String::new(), true),
        };

        let title = title.unwrap_or_else(|| field.to_owned());
        let mut out = [title.as_str(), operator, text.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !(known && valid) {
            out.push_str(INVALID_MARKER);
        }
        out
    }
}

fn format_value(value: &Value, field_type: Option<&FieldType>) -> String {
    match value {
        Value::Null => "?".to_owned(),
        Value::String(text) if field_type == Some(&FieldType::Text) => format!("\"{text}\""),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
