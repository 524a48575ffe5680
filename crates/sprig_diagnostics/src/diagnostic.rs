//! The diagnostic message type.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use sprig_source::Span;

/// A message about a location in a style sheet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Stable code.
    pub code: DiagnosticCode,
    /// Main message.
    pub message: String,
    /// Where the problem is.
    pub primary_span: Span,
    /// Extra annotated locations.
    pub labels: Vec<Label>,
    /// `= note:` lines.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Creates an error.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a warning.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn error_constructor() {
        let d = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 101),
            "expected ':'",
            Span::SYNTHETIC,
        );
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code.to_string(), "E101");
    }

    #[test]
    fn builders_accumulate() {
        let d = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 301),
            "image skipped",
            Span::SYNTHETIC,
        )
        .with_label(Label::secondary(Span::SYNTHETIC, "first used here"))
        .with_note("tokenized urls are never sprited");
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.notes.len(), 1);
    }
}
