//! Error types for the document model

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("No value supplied for attribute '{attr}' of {type_name}")]
    MissingAttribute { type_name: String, attr: String },

    #[error("Invalid content for node {0}")]
    InvalidContent(String),

    #[error("Invalid content expression: '{0}'")]
    InvalidContentExpr(String),

    #[error("Position {pos} out of range (content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid step: {0}")]
    InvalidStep(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl ModelError {
    pub fn missing_attribute(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::MissingAttribute {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn invalid_step(message: impl Into<String>) -> Self {
        Self::InvalidStep(message.into())
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection(message.into())
    }
}
