//! Normalized audit findings.

use serde::{Deserialize, Serialize};

/// Severity level for a finding.
///
/// Ordered so that `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single normalized issue produced by canonicalizing scanner output.
///
/// Immutable once produced; downstream stages (scorer, autofix engine)
/// only ever read findings, never rewrite them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Severity level.
    pub severity: Severity,

    /// Human-readable message.
    pub message: String,

    /// Source file path (relative to the workspace root), when known.
    pub location: Option<String>,

    /// Suggested remediation, when the scanner provided one.
    pub suggestion: Option<String>,
}

impl Finding {
    /// Create a new finding with no location or suggestion.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    /// Set the source location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the suggested remediation.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
