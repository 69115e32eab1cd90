//! Error and violation kinds.
//!
//! Two distinct families:
//! - [`CoreError`] - construction-time failures (bad config, unknown
//!   dialect, registry misuse). These are the only fatal errors.
//! - [`Violation`] - per-file findings (lint results, unlexable runs,
//!   unparsable sections, templater failures, loop limits). Never fatal;
//!   they are data returned to the caller.
//!
//! Violation codes are stable: rule violations carry their rule code
//! (e.g. `LT01`), engine findings use `LXR` (lex), `PRS` (parse), `TMP`
//! (templater) and `LNT` (fix loop limit).

use thiserror::Error;

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// A lint finding or engine diagnostic.
    #[default]
    Warning,
    /// A hard failure for this file (unparsable, templater error).
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A single finding against a file.
///
/// Positions are in *source* coordinates (1-indexed line/column), so they
/// point at the file the user actually wrote, not the expanded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Stable code: a rule code or one of the engine codes.
    pub code: String,
    /// Machine name, e.g. `layout.spacing`.
    pub name: String,
    /// Human description of the finding.
    pub description: String,
    /// 1-indexed source line.
    pub source_line: usize,
    /// 1-indexed source column.
    pub source_col: usize,
    /// Character offset into the source string.
    pub source_char: usize,
    pub severity: Severity,
    /// True if fixes for this violation were applied.
    pub fixes_applied: bool,
}

impl Violation {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        position: (usize, usize, usize),
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: description.into(),
            source_line: position.0,
            source_col: position.1,
            source_char: position.2,
            severity: Severity::Warning,
            fixes_applied: false,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sort key for the output ordering guarantee.
    pub fn sort_key(&self) -> (usize, usize, &str) {
        (self.source_line, self.source_col, &self.code)
    }
}

/// An error raised by a rule's evaluation callback.
///
/// The engine catches these, surfaces an internal violation naming the
/// rule, and carries on with the remaining rules.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuleError {
    pub message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fatal, construction-time errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown dialect {0:?}")]
    UnknownDialect(String),

    #[error("unknown rule {0:?} in rule selector")]
    UnknownRule(String),

    #[error("invalid value for {rule}.{option}: {message}")]
    Config {
        rule: String,
        option: String,
        message: String,
    },

    #[error("grammar reference {0:?} not found during dialect expansion")]
    UnresolvedRef(String),

    #[error("registry entry {0:?} already exists; use replace instead of add")]
    DuplicateEntry(String),

    #[error("registry entry {0:?} not found; use add instead of replace")]
    MissingEntry(String),

    #[error("keyword {keyword:?} referenced by grammar is not in the {dialect} keyword sets")]
    UnknownKeyword { keyword: String, dialect: String },

    #[error("templated file inconsistent: {0}")]
    Templating(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_ordering_key() {
        let a = Violation::new("LT01", "layout.spacing", "spacing", (1, 4, 3));
        let b = Violation::new("LT12", "layout.end_of_file", "newline", (2, 1, 10));
        assert!(a.sort_key() < b.sort_key());
    }

    #[test]
    fn test_core_error_display() {
        let err = CoreError::Config {
            rule: "LT02".into(),
            option: "tab_space_size".into(),
            message: "expected an integer".into(),
        };
        assert!(err.to_string().contains("LT02.tab_space_size"));
    }
}
