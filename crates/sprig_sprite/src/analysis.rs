//! Per-declaration record of what the scan decided and why.

use serde::{Deserialize, Serialize};
use sprig_diagnostics::{Category, Diagnostic, DiagnosticCode};
use sprig_source::Span;
use std::fmt;
use std::path::PathBuf;

/// Code for an image that cannot be sprited.
pub const UNSUPPORTED_IMAGE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);
/// Code for a declaration with more than one image.
pub const MULTIPLE_IMAGES: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);

/// What happened to one image-bearing declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOutcome {
    /// Recorded for assembly.
    Included(PathBuf),
    /// On the ignore list.
    Ignored(PathBuf),
    /// A `%NAME%` placeholder.
    Token,
    /// Points outside the local file system.
    External,
    /// Cannot be sprited; the string says why.
    Unsupported(String),
    /// More than one url in the declaration.
    MultipleImages,
}

impl fmt::Display for ImageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageOutcome::Included(p) => write!(f, "included as {}", p.display()),
            ImageOutcome::Ignored(p) => write!(f, "ignored ({})", p.display()),
            ImageOutcome::Token => f.write_str("skipped: tokenized url"),
            ImageOutcome::External => f.write_str("skipped: external url"),
            ImageOutcome::Unsupported(why) => write!(f, "skipped: {why}"),
            ImageOutcome::MultipleImages => f.write_str("skipped: multiple images"),
        }
    }
}

/// One log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    /// Selector of the rule set.
    pub selector: String,
    /// The url as written (all urls, comma-separated, for multiple images).
    pub url: String,
    /// Decision.
    pub outcome: ImageOutcome,
    /// The image-bearing declaration.
    pub span: Span,
}

impl AnalysisEntry {
    /// A warning for images the author probably meant to sprite but that
    /// were left out. `None` for every other outcome.
    pub fn to_warning(&self) -> Option<Diagnostic> {
        let (code, message) = match &self.outcome {
            ImageOutcome::Unsupported(why) => (
                UNSUPPORTED_IMAGE,
                format!("the image '{}' in '{}' cannot be sprited: {why}", self.url, self.selector),
            ),
            ImageOutcome::MultipleImages => (
                MULTIPLE_IMAGES,
                format!(
                    "the rule set '{}' has more than one background image; none of them is sprited",
                    self.selector
                ),
            ),
            _ => return None,
        };
        Some(Diagnostic::warning(code, message, self.span))
    }
}

/// Every decision made during one scan, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisLog {
    /// Entries.
    pub entries: Vec<AnalysisEntry>,
}

impl AnalysisLog {
    /// Appends an entry.
    pub fn push(
        &mut self,
        selector: &str,
        span: Span,
        url: impl Into<String>,
        outcome: ImageOutcome,
    ) {
        self.entries.push(AnalysisEntry {
            selector: selector.to_string(),
            url: url.into(),
            outcome,
            span,
        });
    }

    /// Entries that were not included.
    pub fn skipped(&self) -> impl Iterator<Item = &AnalysisEntry> {
        self.entries
            .iter()
            .filter(|e| !matches!(e.outcome, ImageOutcome::Included(_)))
    }

    /// Warnings for skipped images, in document order.
    pub fn warnings(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.entries.iter().filter_map(AnalysisEntry::to_warning)
    }
}

impl fmt::Display for AnalysisLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {{ url({}) }} {}", entry.selector, entry.url, entry.outcome)?;
        }
        Ok(())
    }
}
