//! Error types for the condition builder.
//!
//! Only authoring and binding mistakes are errors. Bad user input is reported
//! as validation messages, and serialize/convert/markup never fail.

use thiserror::Error;

use crate::tree::NodeId;

/// Result type alias for condition-builder operations
pub type Result<T> = std::result::Result<T, Error>;

/// A schema value that could not be resolved against the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("field `{0}` is not declared in the catalog")]
    UnknownField(String),

    #[error("value {value} of `{id}` is not one of its options")]
    ValueOutOfRange { id: String, value: String },

    #[error("line has no entry `{0}`")]
    MissingEntry(String),

    #[error("node template `{0}` is not declared")]
    UnknownTemplate(String),

    #[error("`{0}` holds no editable value")]
    NotAValue(String),
}

/// Error types for schema authoring and tree mutation
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate id `{id}` under `{parent}`")]
    DuplicateId { parent: String, id: String },

    #[error("schema declares no root node")]
    MissingRoot,

    #[error("schema binding error: {0}")]
    SchemaBinding(#[from] BindingError),

    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("hook running on node {active} may not replace `{id}` on ancestor {target}")]
    ReentrantReplace {
        active: NodeId,
        target: NodeId,
        id: String,
    },

    #[error("no operators configured for field type `{0}`")]
    EmptyOperators(String),

    #[error("invalid catalog configuration: {0}")]
    Config(String),
}
