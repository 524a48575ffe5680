//! Text rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use sprig_source::SourceMap;
use std::fmt::Write;

/// Turns a diagnostic into printable text.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic, sources: &SourceMap) -> String;
}

/// rustc-style plain-text output:
///
/// ```text
/// error[E201]: the property 'background-image' is repeated in the rule set '.logo'
///   --> css/site.css:4:5
///    |
///  4 |     background-image: url(b.png);
///    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Wrap the header in ANSI bold/red escapes.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let head = format!("{}[{}]", diag.severity, diag.code);
        if self.color {
            let colour = if diag.severity.is_error() { 31 } else { 33 };
            format!("\x1b[1;{colour}m{head}\x1b[0m: {}", diag.message)
        } else {
            format!("{head}: {}", diag.message)
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, sources: &SourceMap) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header(diag));

        if !diag.primary_span.is_synthetic() {
            let span = diag.primary_span;
            let source = sources.get(span.source);
            let location = sources.locate(span);
            let line_no = location.start_line.to_string();
            let gutter = " ".repeat(line_no.len());
            let line = source.line_at(span.start);

            // Underline at most to the end of the first line.
            let col = location.start_col as usize;
            let width = (span.len() as usize)
                .min(line.len().saturating_sub(col - 1))
                .max(1);
            let message = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();

            let _ = writeln!(out, "{gutter}--> {location}");
            let _ = writeln!(out, "{gutter} |");
            let _ = writeln!(out, "{line_no} | {line}");
            let _ = writeln!(
                out,
                "{gutter} | {}{}{message}",
                " ".repeat(col - 1),
                "^".repeat(width)
            );
        }

        for label in diag
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary && !l.span.is_synthetic())
        {
            let _ = writeln!(
                out,
                "   = {}: {}",
                sources.locate(label.span),
                label.message
            );
        }

        for note in &diag.notes {
            let _ = writeln!(out, "   = note: {note}");
        }
        out
    }
}
