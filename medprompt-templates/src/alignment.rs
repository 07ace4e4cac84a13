//! Alignment issues between a template's placeholders and a task's
//! properties
//!
//! Alignment is the consistency relation that guarantees a template can be
//! rendered from its task. Violations come in two severities: errors block
//! rendering, warnings are informational only.

use std::fmt;

/// Severity of an alignment issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentLevel {
    /// Must be fixed before the template can be rendered
    Error,
    /// Reported but does not prevent rendering
    Warning,
}

impl AlignmentLevel {
    /// String form of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentLevel::Error => "error",
            AlignmentLevel::Warning => "warning",
        }
    }

    /// Whether this is an error level
    pub fn is_error(&self) -> bool {
        matches!(self, AlignmentLevel::Error)
    }

    /// Whether this is a warning level
    pub fn is_warning(&self) -> bool {
        matches!(self, AlignmentLevel::Warning)
    }
}

/// What went out of alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentKind {
    /// A required task input has no placeholder in the template text
    MissingRequired,
    /// A non-required task property is ignored by the template
    UnusedOptional,
    /// A placeholder names no task property at all
    UnknownPlaceholder,
}

/// One alignment finding, with the variables it concerns
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentIssue {
    /// Severity of the finding
    pub level: AlignmentLevel,
    /// Which consistency rule was violated
    pub kind: AlignmentKind,
    /// The canonical variable names involved, sorted
    pub variables: Vec<String>,
}

impl AlignmentIssue {
    /// A required input is missing from the template placeholders.
    pub fn missing_required(mut variables: Vec<String>) -> Self {
        variables.sort();
        Self {
            level: AlignmentLevel::Error,
            kind: AlignmentKind::MissingRequired,
            variables,
        }
    }

    /// An optional property is not consumed by the template.
    pub fn unused_optional(mut variables: Vec<String>) -> Self {
        variables.sort();
        Self {
            level: AlignmentLevel::Warning,
            kind: AlignmentKind::UnusedOptional,
            variables,
        }
    }

    /// A placeholder has no matching task property.
    pub fn unknown_placeholder(mut variables: Vec<String>) -> Self {
        variables.sort();
        Self {
            level: AlignmentLevel::Error,
            kind: AlignmentKind::UnknownPlaceholder,
            variables,
        }
    }
}

impl fmt::Display for AlignmentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            AlignmentKind::MissingRequired => "template missing required variables",
            AlignmentKind::UnusedOptional => "template ignores the variables",
            AlignmentKind::UnknownPlaceholder => "task misses the variables",
        };
        write!(
            f,
            "{}: {}: {}",
            self.level.as_str().to_uppercase(),
            what,
            self.variables.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert!(AlignmentLevel::Error.is_error());
        assert!(!AlignmentLevel::Error.is_warning());
        assert!(AlignmentLevel::Warning.is_warning());
    }

    #[test]
    fn test_issue_sorts_variables() {
        let issue = AlignmentIssue::missing_required(vec!["b".into(), "a".into()]);
        assert_eq!(issue.variables, vec!["a", "b"]);
        assert_eq!(
            issue.to_string(),
            "ERROR: template missing required variables: a, b"
        );
    }

    #[test]
    fn test_warning_display() {
        let issue = AlignmentIssue::unused_optional(vec!["notes".into()]);
        assert_eq!(issue.to_string(), "WARNING: template ignores the variables: notes");
    }
}
