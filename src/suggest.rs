//! Value suggestions for operand inputs.
//!
//! Operand expressions ask a [`Suggest`] implementation for candidate values
//! when their refresh hook runs. The crate ships [`StaticSuggest`], backed by
//! per-field value lists from the catalog configuration; hosts with a
//! data source implement the trait themselves.

use std::collections::HashMap;

use serde_json::Value;

use crate::catalog::Field;

/// What an operand input knows when it asks for suggestions.
#[derive(Clone, Copy, Debug)]
pub struct SuggestContext<'a> {
    pub field: &'a Field,
    pub operator: Option<&'a str>,
    /// Text or value currently entered in the input.
    pub value: Option<&'a Value>,
    /// Values already chosen in a list operand.
    pub selected: &'a [Value],
}

/// Source of candidate operand values.
pub trait Suggest {
    /// Candidates for a single-value input.
    fn suggest(&self, context: &SuggestContext<'_>) -> Vec<Value>;

    /// Candidates for a list input. Defaults to [`Suggest::suggest`] minus
    /// the values already selected.
    fn suggests(&self, context: &SuggestContext<'_>) -> Vec<Value> {
        self.suggest(context)
            .into_iter()
            .filter(|candidate| !context.selected.contains(candidate))
            .collect()
    }
}

/// Fixed candidate lists keyed by field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticSuggest {
    values: HashMap<String, Vec<Value>>,
}

impl StaticSuggest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.values.insert(key.into(), values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Suggest for StaticSuggest {
    /// Candidates whose text starts with the entered text, case-insensitively.
    /// Nothing entered returns every candidate.
    fn suggest(&self, context: &SuggestContext<'_>) -> Vec<Value> {
        let Some(candidates) = self.values.get(&context.field.key) else {
            return Vec::new();
        };
        let prefix = match context.value {
            Some(Value::String(text)) if !text.is_empty() => text.to_lowercase(),
            _ => return candidates.clone(),
        };
        candidates
            .iter()
            .filter(|candidate| display_text(candidate).to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
