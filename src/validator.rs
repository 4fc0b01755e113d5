//! Validator registry: field key → value validation.
//!
//! A validator never fails. It returns the list of problems with a value;
//! an empty list means the value is acceptable. Fields that cannot be
//! resolved to a rule set (unknown key, or a type without rules) get a
//! validator that always reports [`UNKNOWN_FIELD`].

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{FieldCatalog, FieldType};

/// Message returned for fields the registry cannot resolve.
pub const UNKNOWN_FIELD: &str = "unknown field";

/// Per-field value constraints layered on top of the type rules.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ValueRules {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Type-specific rule set a field resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TypeRule {
    Text,
    Number,
    Date,
    Boolean,
}

impl TypeRule {
    fn for_type(field_type: &FieldType) -> Option<Self> {
        match field_type {
            FieldType::Text => Some(TypeRule::Text),
            FieldType::Number => Some(TypeRule::Number),
            FieldType::Date => Some(TypeRule::Date),
            FieldType::Boolean => Some(TypeRule::Boolean),
            FieldType::Other(_) => None,
        }
    }
}

/// Maps field keys to validation functions through the catalog.
#[derive(Clone, Debug, Default)]
pub struct Validator {
    catalog: Rc<FieldCatalog>,
    rules: HashMap<String, ValueRules>,
}

impl Validator {
    pub fn new(catalog: Rc<FieldCatalog>) -> Self {
        Self {
            catalog,
            rules: HashMap::new(),
        }
    }

    /// Attach extra constraints to one field.
    pub fn with_rules(mut self, key: impl Into<String>, rules: ValueRules) -> Self {
        self.rules.insert(key.into(), rules);
        self
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn rules(&self, key: &str) -> Option<&ValueRules> {
        self.rules.get(key)
    }

    /// Resolve the validation function for `key`.
    pub fn for_field(&self, key: &str) -> FieldValidator {
        let rule = self
            .catalog
            .type_of(key)
            .and_then(TypeRule::for_type);
        FieldValidator {
            rule,
            rules: self.rules.get(key).cloned().unwrap_or_default(),
        }
    }

    /// Shorthand for `for_field(key).check(value)`.
    pub fn validate(&self, key: &str, value: &Value) -> Vec<String> {
        self.for_field(key).check(value)
    }

    pub fn is_valid(&self, key: &str, value: &Value) -> bool {
        self.validate(key, value).is_empty()
    }
}

/// Validation function for one field.
#[derive(Clone, Debug)]
pub struct FieldValidator {
    rule: Option<TypeRule>,
    rules: ValueRules,
}

impl FieldValidator {
    /// Validate a single value, or each element of a list value.
    pub fn check(&self, value: &Value) -> Vec<String> {
        let Some(rule) = self.rule else {
            return vec![UNKNOWN_FIELD.to_owned()];
        };

        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return self.check_blank();
                }
                let mut errors: Vec<String> = Vec::new();
                for item in items {
                    for error in self.check_scalar(rule, item) {
                        if !errors.contains(&error) {
                            errors.push(error);
                        }
                    }
                }
                errors
            }
            other => self.check_scalar(rule, other),
        }
    }

    fn check_blank(&self) -> Vec<String> {
        if self.rules.required {
            vec!["value is required".to_owned()]
        } else {
            vec![]
        }
    }

    fn check_scalar(&self, rule: TypeRule, value: &Value) -> Vec<String> {
        if is_blank(value) {
            return self.check_blank();
        }
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return vec!["value must be a single value".to_owned()];
        }

        match rule {
            TypeRule::Text => self.check_text(value),
            TypeRule::Number => self.check_number(value),
            TypeRule::Date => check_date(value),
            TypeRule::Boolean => check_boolean(value),
        }
    }

    fn check_text(&self, value: &Value) -> Vec<String> {
        let len = match value {
            Value::String(s) => s.chars().count(),
            other => other.to_string().chars().count(),
        };
        match self.rules.max_length {
            Some(max) if len > max => vec![format!("value must be at most {max} characters")],
            _ => vec![],
        }
    }

    fn check_number(&self, value: &Value) -> Vec<String> {
        let Some(n) = as_number(value) else {
            return vec!["value must be a number".to_owned()];
        };
        let mut errors = Vec::new();
        if let Some(min) = self.rules.min
            && n < min
        {
            errors.push(format!("value must be at least {min}"));
        }
        if let Some(max) = self.rules.max
            && n > max
        {
            errors.push(format!("value must be at most {max}"));
        }
        errors
    }
}

fn check_date(value: &Value) -> Vec<String> {
    let ok = match value {
        Value::String(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                || DateTime::parse_from_rfc3339(s).is_ok()
        }
        _ => false,
    };
    if ok {
        vec![]
    } else {
        vec!["value must be a date (YYYY-MM-DD)".to_owned()]
    }
}

fn check_boolean(value: &Value) -> Vec<String> {
    match value {
        Value::Bool(_) => vec![],
        Value::String(s) if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") => {
            vec![]
        }
        _ => vec!["value must be true or false".to_owned()],
    }
}

/// Null or the empty string: nothing entered yet.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
