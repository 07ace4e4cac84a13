//! Error types for task and property operations

use medprompt_common::DateParseError;
use thiserror::Error;

/// Result type for task operations
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors that can occur in task and property operations
#[derive(Debug, Error)]
pub enum TaskError {
    /// Property not found by canonical name
    #[error("property not found: {name}")]
    PropertyNotFound { name: String },

    /// Value type disagrees with the property's declared type
    #[error("property '{name}' expects {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Serialized type name is not one of the closed set
    #[error("unknown property type: {name}")]
    UnknownPropertyType { name: String },

    /// Date value did not match the record format
    #[error(transparent)]
    InvalidDate(#[from] DateParseError),

    /// Record structure did not match the expected shape
    #[error("invalid record: {message}")]
    InvalidRecord { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
