//! # medprompt templates
//!
//! Template validation and rendering engine: versioned prompt text bound
//! to a task, checked for placeholder/property alignment, rendered by
//! substitution.
//!
//! The alignment contract guarantees a template can always be rendered
//! from its task or fail with a precise diagnostic:
//!
//! - a required task input with no placeholder is fatal
//! - an optional property the template ignores is a warning
//! - a placeholder naming no task property is fatal

mod alignment;
mod bulk;
mod error;
mod placeholder;
mod template;

pub use alignment::{AlignmentIssue, AlignmentKind, AlignmentLevel};
pub use bulk::parse_bulk;
pub use error::{Result, TemplateError};
pub use placeholder::{escape_stray_braces, placeholders, render};
pub use template::{select_best, Prompt, Template, TemplateRecord, MAX_SCORE};
