//! Error types for the editor

use scribe_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Capability not found: {0}")]
    NotFound(String),

    #[error("Capability '{0}' is not applicable to the current selection")]
    NotApplicable(String),

    #[error("Capability '{name}' does not support '{operation}'")]
    UnsupportedOperation { name: String, operation: String },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Capability '{capability}' requires schema type '{type_name}'")]
    MissingSchemaType { capability: String, type_name: String },

    #[error("Editor is read-only")]
    ReadOnly,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;
