//! Diagnostics collected while validating a network description.
//!
//! Validation never stops at the first problem: every issue is recorded
//! with a severity, a category and the entity it concerns, then the caller
//! decides what is fatal.
//!
//! # Example
//!
//! ```
//! use depot_core::diagnostics::{Diagnostics, IssueCategory};
//!
//! let mut diag = Diagnostics::new();
//! diag.warning(IssueCategory::Topology, "no truck type services this route", "route R7");
//! diag.error(IssueCategory::Schema, "ends at unknown point 'X'", "route R8");
//!
//! assert_eq!(diag.warnings().count(), 1);
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The model can still be built but may not behave as intended
    Warning,
    /// The model cannot be built
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// What part of the description an issue concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    /// Missing, dangling or malformed entries
    Schema,
    /// Warehouse tier lists that do not define a cost curve
    Config,
    /// Routes and stores the model can build but not use
    Topology,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Schema => "schema",
            IssueCategory::Config => "config",
            IssueCategory::Topology => "topology",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub message: String,
    /// e.g. "route R1", "warehouse W2"
    pub entity: String,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {} ({})",
            self.severity.as_str(),
            self.category,
            self.message,
            self.entity
        )
    }
}

/// Issues found in one validation pass, in discovery order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(
        &mut self,
        category: IssueCategory,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.record(Severity::Error, category, message.into(), entity.into());
    }

    pub fn warning(
        &mut self,
        category: IssueCategory,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.record(Severity::Warning, category, message.into(), entity.into());
    }

    fn record(&mut self, severity: Severity, category: IssueCategory, message: String, entity: String) {
        self.issues.push(DiagnosticIssue {
            severity,
            category,
            message,
            entity,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn in_category(&self, category: IssueCategory) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Counts such as "2 warnings, 1 error", or "No issues".
    pub fn summary(&self) -> String {
        let counted = [
            (self.warnings().count(), "warning"),
            (self.errors().count(), "error"),
        ];
        let parts: Vec<String> = counted
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, noun)| format!("{} {}{}", n, noun, if *n == 1 { "" } else { "s" }))
            .collect();
        if parts.is_empty() {
            "No issues".to_string()
        } else {
            parts.join(", ")
        }
    }
}
