//! Error types for repository persistence

use medprompt_tasks::TaskError;
use medprompt_templates::TemplateError;
use thiserror::Error;

/// Errors from the file-backed repository
#[derive(Debug, Error)]
pub enum StorageError {
    /// No stored record matches the requested identity
    #[error("no record named '{record}' on file")]
    RecordNotFound { record: String },

    /// A record believed to be on disk has no backing file
    #[error("missing source file for '{record}'")]
    MissingSourceFile { record: String },

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Task-level failure while materializing records
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Template-level failure while materializing records
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
