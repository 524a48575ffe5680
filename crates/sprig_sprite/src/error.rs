//! Validation errors raised by the scan.

use crate::output::{ImageFormat, RuleOrigin};
use sprig_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use sprig_source::Span;
use std::path::PathBuf;

/// Code for [`ScanError::RepeatedProperty`].
pub const REPEATED_PROPERTY: DiagnosticCode = DiagnosticCode::new(Category::Error, 201);
/// Code for [`ScanError::TooManyLengths`].
pub const TOO_MANY_LENGTHS: DiagnosticCode = DiagnosticCode::new(Category::Error, 202);
/// Code for [`ScanError::DuplicateFormat`].
pub const DUPLICATE_FORMAT: DiagnosticCode = DiagnosticCode::new(Category::Error, 203);
/// Code for [`ScanError::DuplicateRules`].
pub const DUPLICATE_RULES: DiagnosticCode = DiagnosticCode::new(Category::Error, 204);

/// A style sheet that cannot be sprited as written.
///
/// Every variant aborts the scan of the current style sheet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// A background property is declared more than once in one rule set.
    #[error("the property '{property}' is repeated in the rule set '{selector}'")]
    RepeatedProperty {
        /// The repeated property.
        property: String,
        /// Selector of the rule set.
        selector: String,
        /// The repeated declaration.
        span: Span,
    },

    /// A background position with more than two components.
    #[error("too many lengths in background position '{value}' of the rule set '{selector}'")]
    TooManyLengths {
        /// The declaration value as written.
        value: String,
        /// Selector of the rule set.
        selector: String,
        /// The offending declaration.
        span: Span,
    },

    /// One image referenced in two different compatibility classes.
    #[error(
        "the image '{}' is referenced with different background formats ({first} and {second})",
        .path.display()
    )]
    DuplicateFormat {
        /// The image.
        path: PathBuf,
        /// Format of the first reference.
        first: ImageFormat,
        /// Conflicting format.
        second: ImageFormat,
        /// Rule set of the first reference.
        first_origin: RuleOrigin,
        /// Rule set of the conflicting reference.
        second_origin: RuleOrigin,
    },

    /// One image referenced with different position or repeat rules.
    #[error(
        "the image '{}' is referenced with different background rules in '{}' and '{}'",
        .path.display(), .first.selector, .second.selector
    )]
    DuplicateRules {
        /// The image.
        path: PathBuf,
        /// Rule set of the first reference.
        first: RuleOrigin,
        /// Rule set of the conflicting reference.
        second: RuleOrigin,
    },
}

impl ScanError {
    /// Stable diagnostic code.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ScanError::RepeatedProperty { .. } => REPEATED_PROPERTY,
            ScanError::TooManyLengths { .. } => TOO_MANY_LENGTHS,
            ScanError::DuplicateFormat { .. } => DUPLICATE_FORMAT,
            ScanError::DuplicateRules { .. } => DUPLICATE_RULES,
        }
    }

    /// Converts the error into a diagnostic pointing at the offending rule.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            ScanError::RepeatedProperty { span, .. } => {
                Diagnostic::error(self.code(), message, *span)
                    .with_label(Label::primary(*span, "repeated here"))
            }
            ScanError::TooManyLengths { span, .. } => Diagnostic::error(self.code(), message, *span)
                .with_label(Label::primary(*span, "at most two components are allowed")),
            ScanError::DuplicateFormat {
                first_origin,
                second_origin,
                ..
            } => Diagnostic::error(self.code(), message, second_origin.span)
                .with_label(Label::secondary(first_origin.span, "first referenced here"))
                .with_note("an image can only be sprited in one format"),
            ScanError::DuplicateRules { first, second, .. } => {
                Diagnostic::error(self.code(), message, second.span)
                    .with_label(Label::secondary(first.span, "first referenced here"))
                    .with_note("every reference to a sprited image must use the same position and repeat")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_source::SourceId;

    fn origin(selector: &str, start: u32) -> RuleOrigin {
        RuleOrigin {
            selector: selector.to_string(),
            span: Span::new(SourceId::from_raw(0), start, start + 4),
        }
    }

    #[test]
    fn repeated_property_message() {
        let err = ScanError::RepeatedProperty {
            property: "background-image".into(),
            selector: ".logo".into(),
            span: Span::SYNTHETIC,
        };
        assert_eq!(
            err.to_string(),
            "the property 'background-image' is repeated in the rule set '.logo'"
        );
        assert_eq!(err.to_diagnostic().code.to_string(), "E201");
    }

    #[test]
    fn duplicate_rules_names_path_and_rules() {
        let err = ScanError::DuplicateRules {
            path: PathBuf::from("/site/i/foo.gif"),
            first: origin(".a", 0),
            second: origin(".b", 10),
        };
        let msg = err.to_string();
        assert!(msg.contains("/site/i/foo.gif"));
        assert!(msg.contains("'.a' and '.b'"));

        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DUPLICATE_RULES);
        assert_eq!(diag.primary_span.start, 10);
        assert_eq!(diag.labels[0].span.start, 0);
    }

    #[test]
    fn duplicate_format_message() {
        let err = ScanError::DuplicateFormat {
            path: PathBuf::from("/i/a.png"),
            first: ImageFormat::LiteralUrl,
            second: ImageFormat::VendorSpecific,
            first_origin: origin(".a", 0),
            second_origin: origin(".b", 10),
        };
        assert!(err
            .to_string()
            .contains("different background formats (literal url and vendor-specific)"));
        assert_eq!(err.code().to_string(), "E203");
    }
}
