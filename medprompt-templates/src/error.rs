//! Error types for template validation and rendering

use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur in template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template text could not be parsed into literals and placeholders
    #[error("template parse error: {message}")]
    Parse { message: String },

    /// A required task input has no placeholder in the template text
    #[error("template missing required variables: {}", variables.join(", "))]
    MissingRequired { variables: Vec<String> },

    /// The template references placeholders no task property satisfies
    #[error("task misses the variables: {}", variables.join(", "))]
    UnknownPlaceholders { variables: Vec<String> },

    /// A placeholder had no value at substitution time
    #[error("no value to substitute for placeholder '{name}'")]
    UnresolvedPlaceholder { name: String },

    /// The template is bound to a different task
    #[error("template belongs to task '{expected}', got '{found}'")]
    TaskMismatch { expected: String, found: String },

    /// Score outside the 0-5 rating range
    #[error("invalid score {score}: ratings run 1-5 (0 when unrated)")]
    InvalidScore { score: u8 },

    /// Record structure did not match the expected shape
    #[error("invalid record: {message}")]
    InvalidRecord { message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
