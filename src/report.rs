//! Conversion diagnostics.
//!
//! No condition during conversion is fatal: every failure degrades to a
//! documented default and is recorded here. Callers must treat the report
//! as the authoritative error channel for a run.
//!
//! Diagnostic codes:
//! - `E001` input document failed to parse (document skipped)
//! - `E002` route-bound definition missing a verb-permission term (defaults to disallowed)
//! - `E003` route-bound definition missing the expected reference shape (routes skipped)
//! - `E004` malformed action block (all of the document's actions skipped)
//! - `E005` unresolvable external reference (treated as a plain value reference)
//! - `E006` URI template token does not end in `Id` (description skipped)
//! - `W001` base service document unreadable (run continues without a base)

use serde::Serialize;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// Source file the diagnostic refers to (empty for run-level issues).
    pub file: String,
    /// Location within the document (e.g., "/definitions/Chassis").
    pub path: String,
    pub message: String,
}

/// Aggregated result of a conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(
        &mut self,
        code: &str,
        file: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: code.to_string(),
            file: file.into(),
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn warning(
        &mut self,
        code: &str,
        file: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: code.to_string(),
            file: file.into(),
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Returns true if the run produced no error diagnostics.
    pub fn is_ok(&self) -> bool {
        self.errors() == 0
    }
}
