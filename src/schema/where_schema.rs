//! The condition-builder schema: a logical group of conditions, each a
//! field, an operator and an operand whose shape follows the operator.
//!
//! ```text
//! #logical            serialize {type: "logical", operator, children}
//! ├── #logical-op     select AND | OR
//! └── #condition      serialize {field, operator, value, from, to, values}
//!     ├── #field      select over catalog keys
//!     ├── #operator   select over operators_for(field)
//!     └── #operand    group, replaced wholesale on operator change
//! ```

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use super::{Attr, ExprSpec, NodeAttr, Projection, SchemaBuilder, SchemaNode, SerializeSpec, build};
use crate::ast::Operand;
use crate::catalog::{Field, FieldCatalog, OperandShape, operand_shape};
use crate::error::Result;
use crate::suggest::{Suggest, SuggestContext};
use crate::tree::{Cascade, Expression, Line, NodeId, Tree};
use crate::validator::Validator;

pub const LOGICAL: &str = "#logical";
pub const LOGICAL_OP: &str = "#logical-op";
pub const CONDITION: &str = "#condition";
pub const FIELD: &str = "#field";
pub const OPERATOR: &str = "#operator";
pub const OPERAND: &str = "#operand";
pub const VALUE: &str = "#value";
pub const FROM: &str = "#from";
pub const TO: &str = "#to";
pub const AND_LABEL: &str = "#and";
pub const IN_OPEN: &str = "#in-open";
pub const IN_OPERAND: &str = "#in-operand";
pub const IN_CLOSE: &str = "#in-close";

pub const PLACEHOLDER: &str = "Select value";

/// Factory for the condition-builder schema over one catalog.
#[derive(Clone)]
pub struct WhereSchema {
    catalog: Rc<FieldCatalog>,
    validator: Rc<Validator>,
    suggest: Option<Rc<dyn Suggest>>,
}

impl WhereSchema {
    pub fn new(catalog: Rc<FieldCatalog>, validator: Rc<Validator>) -> Self {
        Self {
            catalog,
            validator,
            suggest: None,
        }
    }

    pub fn with_suggest(mut self, suggest: Rc<dyn Suggest>) -> Self {
        self.suggest = Some(suggest);
        self
    }

    pub fn catalog(&self) -> &Rc<FieldCatalog> {
        &self.catalog
    }

    pub fn validator(&self) -> &Rc<Validator> {
        &self.validator
    }

    /// Declare the schema. The root descriptor is `#logical`.
    pub fn factory(&self) -> Result<Rc<SchemaNode>> {
        let default_field = self.catalog.default_field();
        let default_operator = default_field
            .and_then(|field| self.catalog.operators_for(field).into_iter().next());
        let shape = default_operator
            .as_deref()
            .and_then(operand_shape)
            .unwrap_or(OperandShape::Single);

        let mut schema = build();
        schema.node(LOGICAL, |logical| {
            logical
                .attr(NodeAttr::Serialize(
                    SerializeSpec::new()
                        .constant("type", "logical")
                        .project(LOGICAL_OP, Projection::Value, "operator"),
                ))
                .attr(NodeAttr::class("qb-logical", true))
                .attr(NodeAttr::class(
                    "qb-and",
                    Attr::computed(|scope| logical_op_is(scope.value_of(LOGICAL_OP), "AND")),
                ))
                .attr(NodeAttr::class(
                    "qb-or",
                    Attr::computed(|scope| logical_op_is(scope.value_of(LOGICAL_OP), "OR")),
                ))
                .select(
                    LOGICAL_OP,
                    ExprSpec::new()
                        .classes(["qb-operation"])
                        .options(vec![Value::from("AND"), Value::from("OR")])
                        .value("AND"),
                )
                .node(CONDITION, |condition| {
                    condition
                        .attr(NodeAttr::Serialize(
                            SerializeSpec::new()
                                .project(FIELD, Projection::Value, "field")
                                .project(OPERATOR, Projection::Value, "operator")
                                .project(VALUE, Projection::Value, "value")
                                .project(FROM, Projection::Value, "from")
                                .project(TO, Projection::Value, "to")
                                .project(IN_OPERAND, Projection::Values, "values"),
                        ))
                        .select(FIELD, self.field_spec(default_field))
                        .select(OPERATOR, self.operator_spec(default_operator))
                        .group(OPERAND, |operand| {
                            self.fill_operand(operand, shape, Value::Null)
                        });
                });
        });
        schema.factory()
    }

    fn field_spec(&self, default: Option<&Field>) -> ExprSpec {
        let titles = Rc::clone(&self.catalog);
        let types = Rc::clone(&self.catalog);
        let schema = self.clone();
        ExprSpec::new()
            .classes(["qb-field"])
            .options(
                self.catalog
                    .fields()
                    .iter()
                    .map(|field| Value::from(field.key.as_str()))
                    .collect::<Vec<_>>(),
            )
            .value(default.map_or(Value::Null, |field| Value::from(field.key.as_str())))
            .label(move |_, key| titles.title_of(key).map(str::to_owned))
            .type_of(move |_, key| types.type_of(key).map(|ty| ty.to_string()))
            .on_change(move |cx| schema.field_changed(cx))
    }

    fn operator_spec(&self, default: Option<String>) -> ExprSpec {
        let catalog = Rc::clone(&self.catalog);
        let schema = self.clone();
        ExprSpec::new()
            .classes(["qb-operator"])
            .options(Attr::computed(move |scope| {
                field_key(scope.line())
                    .and_then(|key| catalog.operators_for_key(key).ok())
                    .unwrap_or_default()
                    .into_iter()
                    .map(Value::from)
                    .collect::<Vec<_>>()
            }))
            .value(default.map_or(Value::Null, Value::from))
            .on_change(move |cx| schema.operator_changed(cx))
    }

    /// Field change: reset an operator that is no longer legal, then keep
    /// only the operand values that still validate against the new field.
    fn field_changed(&self, cx: &mut Cascade<'_>) -> Result<()> {
        let key = field_key(cx.line()).unwrap_or_default().to_owned();
        let operators = self.catalog.operators_for_key(&key)?;
        let current = cx.value_of(OPERATOR).and_then(Value::as_str);

        if !current.is_some_and(|op| operators.iter().any(|legal| legal == op)) {
            let first = operators.first().cloned();
            debug!(field = %key, operator = ?first, "operator reset after field change");
            cx.set_value(OPERATOR, first.map_or(Value::Null, Value::from))?;
            cx.fire(OPERATOR)?;
        }
        clear_invalid_operands(cx, &key)
    }

    /// Operator change: rebuild `#operand` in the operator's shape.
    fn operator_changed(&self, cx: &mut Cascade<'_>) -> Result<()> {
        let name = cx.value().and_then(Value::as_str).unwrap_or_default().to_owned();
        let Some(shape) = operand_shape(&name) else {
            debug!(operator = %name, "operator has no operand shape, operand kept");
            return Ok(());
        };
        let prior = match shape {
            OperandShape::Single => prior_single_value(cx.line()),
            _ => Value::Null,
        };
        debug!(operator = %name, ?shape, "operand replaced");
        cx.put(OPERAND, |operand| self.fill_operand(operand, shape, prior))
    }

    fn fill_operand(&self, operand: &mut SchemaBuilder, shape: OperandShape, prior: Value) {
        match shape {
            OperandShape::Single => {
                operand.input(VALUE, self.single_input(prior));
            }
            OperandShape::Range => {
                operand
                    .input(FROM, self.single_input(Value::Null))
                    .label(
                        AND_LABEL,
                        ExprSpec::new()
                            .classes(["qb-operand", "qb-operand-and-label"])
                            .text("AND"),
                    )
                    .input(TO, self.single_input(Value::Null));
            }
            OperandShape::List => {
                operand
                    .label(IN_OPEN, ExprSpec::new().text("("))
                    .multiselect(IN_OPERAND, self.list_input())
                    .label(IN_CLOSE, ExprSpec::new().text(")"));
            }
            OperandShape::None => {}
        }
    }

    fn single_input(&self, value: Value) -> ExprSpec {
        let validator = Rc::clone(&self.validator);
        let schema = self.clone();
        operand_classes()
            .value(value)
            .placeholder(PLACEHOLDER)
            .validate(move |scope| {
                let key = field_key(scope.line()).unwrap_or_default();
                validator.validate(key, scope.value().unwrap_or(&Value::Null))
            })
            .on_refresh(move |cx| schema.refresh_options(cx, false))
    }

    fn list_input(&self) -> ExprSpec {
        let validator = Rc::clone(&self.validator);
        let schema = self.clone();
        operand_classes()
            .values(Vec::new())
            .placeholder(PLACEHOLDER)
            .validate(move |scope| {
                let key = field_key(scope.line()).unwrap_or_default();
                validator.validate(key, &Value::Array(scope.values().to_vec()))
            })
            .on_add(|cx, value| {
                if !is_truthy(&value) || cx.values().contains(&value) {
                    trace!(?value, "list add ignored");
                    return Ok(());
                }
                cx.push_value(value)
            })
            .on_refresh(move |cx| schema.refresh_options(cx, true))
    }

    fn refresh_options(&self, cx: &mut Cascade<'_>, list: bool) -> Result<()> {
        let field = field_key(cx.line()).and_then(|key| self.catalog.get(key));
        let options = match (&self.suggest, field) {
            (Some(suggest), Some(field)) => {
                let context = SuggestContext {
                    field,
                    operator: cx.value_of(OPERATOR).and_then(Value::as_str),
                    value: cx.value(),
                    selected: cx.values(),
                };
                if list {
                    suggest.suggests(&context)
                } else {
                    suggest.suggest(&context)
                }
            }
            _ => Vec::new(),
        };
        cx.set_options(options)
    }
}

/// Read the operand of a condition node as a typed view.
pub fn operand(tree: &Tree, condition: NodeId) -> Result<Operand> {
    let group = tree.expression(condition, OPERAND)?;
    let Some(line) = group.line() else {
        return Ok(Operand::None);
    };
    let value_of = |id: &str| line.find(id).and_then(Expression::value).cloned();

    if line.get(FROM).is_some() || line.get(TO).is_some() {
        return Ok(Operand::Range {
            from: value_of(FROM).unwrap_or(Value::Null),
            to: value_of(TO).unwrap_or(Value::Null),
        });
    }
    if let Some(values) = line.get(IN_OPERAND).and_then(Expression::values) {
        return Ok(Operand::InList {
            values: values.to_vec(),
        });
    }
    if let Some(value) = value_of(VALUE) {
        return Ok(Operand::Value { value });
    }
    Ok(Operand::None)
}

fn operand_classes() -> ExprSpec {
    ExprSpec::new()
        .class("qb-operand", true)
        .class("qb-has-value", Attr::computed(|scope| scope.has_value()))
        .class("qb-invalid", Attr::computed(|scope| !scope.is_valid()))
}

fn logical_op_is(value: Option<&Value>, op: &str) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|v| v.eq_ignore_ascii_case(op))
}

/// Catalog key currently selected in a condition's `#field`.
pub(crate) fn field_key(line: &Line) -> Option<&str> {
    line.find(FIELD)
        .and_then(Expression::value)
        .and_then(Value::as_str)
}

/// Reset every operand input that fails validation against `field`.
fn clear_invalid_operands(cx: &mut Cascade<'_>, field: &str) -> Result<()> {
    for id in operand_inputs(cx.line()) {
        let errors = cx.validate(&id)?;
        if !errors.is_empty() {
            debug!(%field, operand = %id, ?errors, "operand cleared after field change");
            cx.clear(&id)?;
        }
    }
    Ok(())
}

/// Editable expressions of the `#operand` group.
fn operand_inputs(line: &Line) -> Vec<String> {
    line.get(OPERAND)
        .and_then(Expression::line)
        .map(|group| {
            group
                .iter()
                .filter(|expr| expr.is_editable())
                .map(|expr| expr.id().to_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Value carried into a new single operand: the lone prior expression's
/// value, or the first of its values.
fn prior_single_value(line: &Line) -> Value {
    let Some(group) = line.get(OPERAND).and_then(Expression::line) else {
        return Value::Null;
    };
    if group.len() != 1 {
        return Value::Null;
    }
    let Some(expr) = group.iter().next() else {
        return Value::Null;
    };
    match (expr.value(), expr.values()) {
        (Some(value), _) => value.clone(),
        (None, Some(values)) => values.first().cloned().unwrap_or(Value::Null),
        (None, None) => Value::Null,
    }
}

/// Falsy values are ignored by list add: null, false, zero and "".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
