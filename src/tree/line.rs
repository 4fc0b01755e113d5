//! Lines and the expressions they hold.

use std::rc::Rc;

use serde_json::Value;

use crate::schema::{NodeKind, Projection, SchemaNode};
use crate::validator::is_blank;

/// Current state of one instantiated expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprState {
    /// Select or input.
    Value(Value),
    /// Multiselect.
    Values(Vec<Value>),
    /// Label text.
    Text(String),
    /// Nested group.
    Branch(Line),
}

/// A schema descriptor instantiated inside a Line.
#[derive(Clone, Debug)]
pub struct Expression {
    schema: Rc<SchemaNode>,
    state: ExprState,
    /// Options supplied by a refresh hook; override the declared ones.
    options: Option<Vec<Value>>,
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.schema, &other.schema)
            && self.state == other.state
            && self.options == other.options
    }
}

impl Expression {
    pub(crate) fn instantiate(schema: Rc<SchemaNode>) -> Self {
        let state = match schema.kind {
            NodeKind::Select | NodeKind::Input => ExprState::Value(schema.spec.value.clone()),
            NodeKind::MultiSelect => ExprState::Values(schema.spec.values.clone()),
            NodeKind::Label => ExprState::Text(schema.spec.text.clone().unwrap_or_default()),
            NodeKind::Group | NodeKind::Node => ExprState::Branch(Line::instantiate(&schema.line)),
        };
        Self {
            schema,
            state,
            options: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn kind(&self) -> NodeKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &Rc<SchemaNode> {
        &self.schema
    }

    pub fn state(&self) -> &ExprState {
        &self.state
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.state {
            ExprState::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[Value]> {
        match &self.state {
            ExprState::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.state {
            ExprState::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Nested Line of a group.
    pub fn line(&self) -> Option<&Line> {
        match &self.state {
            ExprState::Branch(line) => Some(line),
            _ => None,
        }
    }

    pub(crate) fn line_mut(&mut self) -> Option<&mut Line> {
        match &mut self.state {
            ExprState::Branch(line) => Some(line),
            _ => None,
        }
    }

    /// Options set by a refresh hook, if any.
    pub fn refreshed_options(&self) -> Option<&[Value]> {
        self.options.as_deref()
    }

    /// True when the user has entered something.
    pub fn has_value(&self) -> bool {
        match &self.state {
            ExprState::Value(value) => !is_blank(value),
            ExprState::Values(values) => !values.is_empty(),
            ExprState::Text(_) | ExprState::Branch(_) => false,
        }
    }

    /// True for the kinds a user edits.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.schema.kind,
            NodeKind::Select | NodeKind::Input | NodeKind::MultiSelect
        )
    }

    /// Read a property for serialization; `None` if this kind lacks it.
    pub fn project(&self, property: Projection) -> Option<Value> {
        match (property, &self.state) {
            (Projection::Value, ExprState::Value(value)) => Some(value.clone()),
            (Projection::Values, ExprState::Values(values)) => Some(Value::Array(values.clone())),
            _ => None,
        }
    }

    /// Assign a value. Lists are accepted by multiselects; a scalar becomes a
    /// one-element list. Returns false if this kind holds no value.
    pub(crate) fn assign(&mut self, value: Value) -> bool {
        match &mut self.state {
            ExprState::Value(current) => {
                *current = value;
                true
            }
            ExprState::Values(current) => {
                *current = match value {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                true
            }
            ExprState::Text(_) | ExprState::Branch(_) => false,
        }
    }

    pub(crate) fn push(&mut self, value: Value) -> bool {
        match &mut self.state {
            ExprState::Values(values) => {
                values.push(value);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove(&mut self, value: &Value) -> bool {
        match &mut self.state {
            ExprState::Values(values) => {
                let before = values.len();
                values.retain(|v| v != value);
                values.len() != before
            }
            _ => false,
        }
    }

    /// Reset to "no value".
    pub(crate) fn clear(&mut self) {
        match &mut self.state {
            ExprState::Value(value) => *value = Value::Null,
            ExprState::Values(values) => values.clear(),
            ExprState::Text(_) | ExprState::Branch(_) => {}
        }
    }

    pub(crate) fn set_options(&mut self, options: Vec<Value>) {
        self.options = Some(options);
    }
}

/// Ordered, id-keyed collection of expressions owned by a node or group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    entries: Vec<Expression>,
}

impl Line {
    pub(crate) fn instantiate(schemas: &[Rc<SchemaNode>]) -> Self {
        Self {
            entries: schemas
                .iter()
                .map(|schema| Expression::instantiate(Rc::clone(schema)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Expression::id)
    }

    /// Direct entry by id.
    pub fn get(&self, id: &str) -> Option<&Expression> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Expression> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Entry by id, searching nested groups depth-first.
    pub fn find(&self, id: &str) -> Option<&Expression> {
        for entry in &self.entries {
            if entry.id() == id {
                return Some(entry);
            }
            if let Some(found) = entry.line().and_then(|line| line.find(id)) {
                return Some(found);
            }
        }
        None
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Expression> {
        for entry in &mut self.entries {
            if entry.id() == id {
                return Some(entry);
            }
            if let Some(found) = entry.line_mut().and_then(|line| line.find_mut(id)) {
                return Some(found);
            }
        }
        None
    }

    /// Replace the entry with the same id in place, or append.
    pub(crate) fn put(&mut self, expression: Expression) {
        match self.entries.iter().position(|e| e.id() == expression.id()) {
            Some(index) => self.entries[index] = expression,
            None => self.entries.push(expression),
        }
    }
}

impl<'a> IntoIterator for &'a Line {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ExprSpec, build};
    use serde_json::json;

    fn schema() -> Rc<SchemaNode> {
        let mut schema = build();
        schema.node("#root", |root| {
            root.select("#op", ExprSpec::new().value("AND"))
                .group("#operand", |operand| {
                    operand
                        .input("#from", ExprSpec::new())
                        .label("#and", ExprSpec::new().text("AND"))
                        .input("#to", ExprSpec::new().value(5));
                })
                .multiselect("#tags", ExprSpec::new().values(vec![json!("a")]));
        });
        schema.factory().unwrap()
    }

    #[test]
    fn test_instantiate_uses_declared_defaults() {
        let line = Line::instantiate(&schema().line);
        assert_eq!(line.ids().collect::<Vec<_>>(), ["#op", "#operand", "#tags"]);
        assert_eq!(line.get("#op").and_then(Expression::value), Some(&json!("AND")));
        assert_eq!(line.find("#and").and_then(Expression::text), Some("AND"));
        assert_eq!(line.find("#from").and_then(Expression::value), Some(&Value::Null));
        assert_eq!(
            line.get("#tags").and_then(Expression::values),
            Some(&[json!("a")][..])
        );
    }

    #[test]
    fn test_get_is_shallow_find_is_deep() {
        let line = Line::instantiate(&schema().line);
        assert!(line.get("#to").is_none());
        assert_eq!(line.find("#to").and_then(Expression::value), Some(&json!(5)));
    }

    #[test]
    fn test_put_replaces_in_place() {
        let schema = schema();
        let mut line = Line::instantiate(&schema.line);
        let mut replacement = Expression::instantiate(Rc::clone(&schema.line[0]));
        replacement.assign(json!("OR"));
        line.put(replacement);
        assert_eq!(line.ids().collect::<Vec<_>>(), ["#op", "#operand", "#tags"]);
        assert_eq!(line.get("#op").and_then(Expression::value), Some(&json!("OR")));
    }

    #[test]
    fn test_assign_and_clear() {
        let schema = schema();
        let mut line = Line::instantiate(&schema.line);
        let tags = line.get_mut("#tags").unwrap();
        assert!(tags.assign(json!("solo")));
        assert_eq!(tags.values(), Some(&[json!("solo")][..]));
        assert!(tags.has_value());
        tags.clear();
        assert!(!tags.has_value());

        let label = line.find_mut("#and").unwrap();
        assert!(!label.assign(json!("x")));
    }

    #[test]
    fn test_has_value_treats_empty_string_as_blank() {
        let schema = schema();
        let mut line = Line::instantiate(&schema.line);
        let from = line.find_mut("#from").unwrap();
        from.assign(json!(""));
        assert!(!from.has_value());
        from.assign(json!(0));
        assert!(from.has_value());
    }

    #[test]
    fn test_projection() {
        let line = Line::instantiate(&schema().line);
        let op = line.get("#op").unwrap();
        assert_eq!(op.project(Projection::Value), Some(json!("AND")));
        assert_eq!(op.project(Projection::Values), None);
        let tags = line.get("#tags").unwrap();
        assert_eq!(tags.project(Projection::Values), Some(json!(["a"])));
    }
}
