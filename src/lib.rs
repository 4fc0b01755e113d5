//! Schema-driven condition builder.
//!
//! A host describes its filterable fields in a [`FieldCatalog`]; a user
//! composes nested AND/OR groups of field-operator-value conditions through a
//! reactive [`Tree`] instantiated from a declarative schema. The live tree
//! serializes to a canonical filter object, converts to a
//! [`LogicalExpression`] and renders to a display string.
//!
//! ```
//! use condition_builder::{Field, FieldCatalog, FieldType, Session};
//! use serde_json::json;
//!
//! let catalog = FieldCatalog::new(vec![Field::new("age", "Age", FieldType::Number)]);
//! let mut session = Session::new(catalog)?;
//! let condition = session.conditions()[0];
//! session.set_operator(condition, "between")?;
//! session.set_operand(condition, "#from", json!(18))?;
//! session.set_operand(condition, "#to", json!(65))?;
//! assert_eq!(session.markup().as_deref(), Some("Age between 18 and 65"));
//! # Ok::<(), condition_builder::Error>(())
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod markup;
pub mod schema;
pub mod serialize;
pub mod session;
pub mod suggest;
pub mod tree;
pub mod validator;

#[cfg(feature = "wasm-bindings")]
pub mod wasm;

pub use ast::{LogicalExpression, LogicalOperator, Operand};
pub use catalog::{Field, FieldCatalog, FieldType, OperandShape, Operator};
pub use config::CatalogConfig;
pub use convert::convert;
pub use error::{BindingError, Error, Result};
pub use markup::MarkupVisitor;
pub use schema::{Attr, ExprSpec, NodeAttr, NodeKind, SchemaBuilder, SchemaNode, build};
pub use serialize::serialize;
pub use session::Session;
pub use suggest::{StaticSuggest, Suggest, SuggestContext};
pub use tree::{Cascade, NodeId, Scope, Tree};
pub use validator::{UNKNOWN_FIELD, Validator, ValueRules};
