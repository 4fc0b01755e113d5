//! Catalog configuration loaded from YAML or JSON.
//!
//! ```yaml
//! fields:
//!   - key: age
//!     title: Age
//!     type: number
//!     min: 0
//!     max: 150
//!     suggestions: [18, 21, 65]
//! operators:
//!   number: [equals, between]
//! ```
//!
//! Deserialization errors carry the path of the offending entry
//! (`fields[1].max: invalid type ...`).

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::catalog::{Field, FieldCatalog, FieldType, Operator};
use crate::error::{Error, Result};
use crate::suggest::StaticSuggest;
use crate::validator::{Validator, ValueRules};

/// One catalog entry with its validation rules and suggested values.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldConfig {
    pub key: String,
    /// Defaults to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(flatten)]
    pub rules: ValueRules,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Value>,
}

impl FieldConfig {
    pub fn field(&self) -> Field {
        Field::new(
            self.key.clone(),
            self.title.clone().unwrap_or_else(|| self.key.clone()),
            self.field_type.clone(),
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CatalogConfig {
    pub fields: Vec<FieldConfig>,
    /// Operator lists overriding the built-in policy, keyed by type name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operators: BTreeMap<String, Vec<String>>,
}

impl CatalogConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let deserializer = serde_yml::Deserializer::from_str(yaml);
        serde_path_to_error::deserialize(deserializer).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| Error::Config(err.to_string()))
    }

    /// Build the field catalog.
    ///
    /// Duplicate keys and empty operator lists are rejected. Operator names
    /// outside the known vocabulary are kept but logged.
    pub fn catalog(&self) -> Result<FieldCatalog> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.key.as_str()) {
                return Err(Error::DuplicateId {
                    parent: "fields".to_owned(),
                    id: field.key.clone(),
                });
            }
        }

        let mut catalog = FieldCatalog::new(self.fields.iter().map(FieldConfig::field).collect());
        for (type_name, operators) in &self.operators {
            for name in operators {
                if Operator::parse(name).is_none() {
                    warn!(field_type = %type_name, operator = %name, "operator has no operand shape");
                }
            }
            catalog = catalog.with_operators(FieldType::from(type_name.as_str()), operators.clone())?;
        }
        Ok(catalog)
    }

    /// Validator over `catalog` carrying each field's rules.
    pub fn validator(&self, catalog: Rc<FieldCatalog>) -> Validator {
        self.fields
            .iter()
            .filter(|field| field.rules != ValueRules::default())
            .fold(Validator::new(catalog), |validator, field| {
                validator.with_rules(field.key.clone(), field.rules.clone())
            })
    }

    /// Suggestion source from the `suggestions` lists.
    pub fn suggestions(&self) -> StaticSuggest {
        self.fields
            .iter()
            .filter(|field| !field.suggestions.is_empty())
            .fold(StaticSuggest::new(), |suggest, field| {
                suggest.with_values(field.key.clone(), field.suggestions.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::{Suggest, SuggestContext};
    use serde_json::json;

    const YAML: &str = r#"
fields:
  - key: name
    title: Name
    type: text
    required: true
    max_length: 20
  - key: age
    title: Age
    type: number
    min: 0
    max: 150
    suggestions: [18, 21, 65]
  - key: born
    type: date
operators:
  number: [equals, between]
"#;

    #[test]
    fn test_load_yaml() {
        let config = CatalogConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.fields.len(), 3);
        assert_eq!(config.fields[1].rules.max, Some(150.0));
        assert!(config.fields[0].rules.required);

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.title_of("born"), Some("born"));
        assert_eq!(
            catalog.operators_for_key("age").unwrap(),
            vec!["equals".to_owned(), "between".to_owned()]
        );
    }

    #[test]
    fn test_validator_carries_rules() {
        let config = CatalogConfig::from_yaml_str(YAML).unwrap();
        let catalog = Rc::new(config.catalog().unwrap());
        let validator = config.validator(catalog);
        assert_eq!(validator.validate("age", &json!(200)), vec!["value must be at most 150"]);
        assert_eq!(validator.validate("name", &json!("")), vec!["value is required"]);
        assert!(validator.is_valid("born", &Value::Null));
    }

    #[test]
    fn test_suggestions() {
        let config = CatalogConfig::from_yaml_str(YAML).unwrap();
        let suggest = config.suggestions();
        let field = config.fields[1].field();
        let context = SuggestContext {
            field: &field,
            operator: None,
            value: None,
            selected: &[],
        };
        assert_eq!(suggest.suggest(&context), vec![json!(18), json!(21), json!(65)]);
    }

    #[test]
    fn test_load_json() {
        let config = CatalogConfig::from_json_str(
            r#"{"fields": [{"key": "active", "title": "Active", "type": "boolean"}]}"#,
        )
        .unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.type_of("active"), Some(&FieldType::Boolean));
    }

    #[test]
    fn test_error_carries_path() {
        let yaml = r#"
fields:
  - key: age
    type: number
    max: lots
"#;
        let err = CatalogConfig::from_yaml_str(yaml).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid catalog configuration"), "{message}");
        assert!(message.contains("fields"), "{message}");
    }

    #[test]
    fn test_empty_operator_list_rejected() {
        let yaml = r#"
fields:
  - key: age
    type: number
operators:
  number: []
"#;
        let config = CatalogConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(config.catalog(), Err(Error::EmptyOperators(_))));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let yaml = r#"
fields:
  - key: age
    type: number
  - key: age
    type: text
"#;
        let config = CatalogConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.catalog(),
            Err(Error::DuplicateId { ref id, .. }) if id == "age"
        ));
    }
}
