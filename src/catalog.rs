//! Field catalog: the filterable fields and the operators each field type
//! allows.
//!
//! The operator vocabulary is closed ([`Operator`]), but operator names are
//! carried through the tree as plain strings so that a catalog may list a
//! name this crate does not know yet. Such names simply have no operand
//! shape (see [`operand_shape`]).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, Error, Result};

// ── Field ────────────────────────────────────────────────────────────

/// Data type of a filterable field.
///
/// Serialized as its lowercase name; unrecognized names are preserved in
/// [`FieldType::Other`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Other(name) => name,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "text" | "string" => FieldType::Text,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "boolean" | "bool" => FieldType::Boolean,
            _ => FieldType::Other(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_owned())
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_owned()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column eligible for filtering.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(key: impl Into<String>, title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            field_type,
        }
    }
}

// ── Operators ────────────────────────────────────────────────────────

/// The recognized comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    Between,
    In,
    IsEmpty,
    IsNotEmpty,
}

/// What an operator needs on its right-hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    Single,
    Range,
    List,
    None,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Between,
        Operator::In,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
    ];

    /// Display name, as it appears in catalogs and serialized filters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not equals",
            Operator::GreaterThan => "greater than",
            Operator::LessThan => "less than",
            Operator::GreaterOrEqual => "greater or eq. to",
            Operator::LessOrEqual => "less or eq. to",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::IsEmpty => "is empty",
            Operator::IsNotEmpty => "is not empty",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    /// Operand shape table. Exhaustive over the vocabulary.
    pub const fn shape(self) -> OperandShape {
        match self {
            Operator::Equals
            | Operator::NotEquals
            | Operator::GreaterThan
            | Operator::LessThan
            | Operator::GreaterOrEqual
            | Operator::LessOrEqual
            | Operator::Like
            | Operator::NotLike
            | Operator::StartsWith
            | Operator::EndsWith => OperandShape::Single,
            Operator::Between => OperandShape::Range,
            Operator::In => OperandShape::List,
            Operator::IsEmpty | Operator::IsNotEmpty => OperandShape::None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand shape for an operator name, `None` if the name is not recognized.
pub fn operand_shape(name: &str) -> Option<OperandShape> {
    Operator::parse(name).map(Operator::shape)
}

/// Built-in operator policy per field type.
pub fn default_operators(field_type: &FieldType) -> &'static [Operator] {
    use Operator::*;
    match field_type {
        FieldType::Text => &[
            Equals, NotEquals, Like, NotLike, StartsWith, EndsWith, In, IsEmpty, IsNotEmpty,
        ],
        FieldType::Number | FieldType::Date => &[
            Equals,
            NotEquals,
            GreaterThan,
            LessThan,
            GreaterOrEqual,
            LessOrEqual,
            Between,
            In,
            IsEmpty,
            IsNotEmpty,
        ],
        FieldType::Boolean | FieldType::Other(_) => &[Equals, NotEquals, IsEmpty, IsNotEmpty],
    }
}

// ── Catalog ──────────────────────────────────────────────────────────

/// Ordered set of fields plus the per-type operator policy.
#[derive(Clone, Debug, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    operators: HashMap<FieldType, Vec<String>>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            operators: HashMap::new(),
        }
    }

    /// Override the operator list for one field type.
    ///
    /// An empty list is rejected: every catalog field must offer at least one
    /// operator.
    pub fn with_operators(
        mut self,
        field_type: FieldType,
        operators: Vec<String>,
    ) -> Result<Self> {
        if operators.is_empty() {
            return Err(Error::EmptyOperators(field_type.to_string()));
        }
        self.operators.insert(field_type, operators);
        Ok(self)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// First field of the catalog, used as the default selection.
    pub fn default_field(&self) -> Option<&Field> {
        self.fields.first()
    }

    pub fn title_of(&self, key: &str) -> Option<&str> {
        self.get(key).map(|f| f.title.as_str())
    }

    pub fn type_of(&self, key: &str) -> Option<&FieldType> {
        self.get(key).map(|f| &f.field_type)
    }

    /// Ordered operator names legal for `field`, decided by its type alone.
    pub fn operators_for(&self, field: &Field) -> Vec<String> {
        match self.operators.get(&field.field_type) {
            Some(ops) => ops.clone(),
            None => default_operators(&field.field_type)
                .iter()
                .map(|op| op.as_str().to_owned())
                .collect(),
        }
    }

    /// Like [`FieldCatalog::operators_for`], resolving the field by key.
    pub fn operators_for_key(&self, key: &str) -> Result<Vec<String>> {
        let field = self
            .get(key)
            .ok_or_else(|| BindingError::UnknownField(key.to_owned()))?;
        Ok(self.operators_for(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            Field::new("name", "Name", FieldType::Text),
            Field::new("age", "Age", FieldType::Number),
            Field::new("born", "Born", FieldType::Date),
        ])
    }

    #[test]
    fn test_operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_operator_parse_is_case_insensitive() {
        assert_eq!(Operator::parse("BETWEEN"), Some(Operator::Between));
        assert_eq!(Operator::parse("Is Not Empty"), Some(Operator::IsNotEmpty));
        assert_eq!(Operator::parse("Greater Or Eq. To"), Some(Operator::GreaterOrEqual));
        assert_eq!(Operator::parse("approximately"), None);
    }

    #[test]
    fn test_shape_table() {
        assert_eq!(operand_shape("equals"), Some(OperandShape::Single));
        assert_eq!(operand_shape("ends with"), Some(OperandShape::Single));
        assert_eq!(operand_shape("between"), Some(OperandShape::Range));
        assert_eq!(operand_shape("in"), Some(OperandShape::List));
        assert_eq!(operand_shape("is empty"), Some(OperandShape::None));
        assert_eq!(operand_shape("sounds like"), None);
    }

    #[test]
    fn test_field_type_from_string() {
        assert_eq!(FieldType::from("Number"), FieldType::Number);
        assert_eq!(FieldType::from("bool"), FieldType::Boolean);
        assert_eq!(
            FieldType::from("geo"),
            FieldType::Other("geo".to_owned())
        );
        let json = serde_json::to_value(FieldType::Date).unwrap();
        assert_eq!(json, serde_json::json!("date"));
    }

    #[test]
    fn test_field_json_uses_type_key() {
        let field: Field =
            serde_json::from_str(r#"{"key":"age","title":"Age","type":"number"}"#).unwrap();
        assert_eq!(field, Field::new("age", "Age", FieldType::Number));
    }

    #[test]
    fn test_default_operators_follow_type() {
        let catalog = catalog();
        let ops = catalog.operators_for_key("age").unwrap();
        assert_eq!(ops[0], "equals");
        assert!(ops.iter().any(|op| op == "between"));

        let ops = catalog.operators_for_key("name").unwrap();
        assert!(ops.iter().any(|op| op == "like"));
        assert!(!ops.iter().any(|op| op == "between"));
    }

    #[test]
    fn test_operator_override() {
        let catalog = catalog()
            .with_operators(
                FieldType::Number,
                vec!["equals".into(), "between".into()],
            )
            .unwrap();
        assert_eq!(
            catalog.operators_for_key("age").unwrap(),
            vec!["equals".to_owned(), "between".to_owned()]
        );
    }

    #[test]
    fn test_empty_override_rejected() {
        let err = catalog()
            .with_operators(FieldType::Number, vec![])
            .unwrap_err();
        assert!(matches!(err, Error::EmptyOperators(ref ty) if ty == "number"));
    }

    #[test]
    fn test_unknown_key_is_binding_error() {
        let err = catalog().operators_for_key("weight").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaBinding(BindingError::UnknownField(ref key)) if key == "weight"
        ));
    }

    #[test]
    fn test_lookup_helpers() {
        let catalog = catalog();
        assert_eq!(catalog.title_of("born"), Some("Born"));
        assert_eq!(catalog.type_of("born"), Some(&FieldType::Date));
        assert_eq!(catalog.default_field().map(|f| f.key.as_str()), Some("name"));
        assert!(catalog.get("missing").is_none());
    }
}
