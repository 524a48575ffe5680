//! The scan output model: image references slated for sprite assembly.

use crate::error::ScanError;
use crate::position::{BackgroundRepeat, ImagePosition};
use serde::{Deserialize, Serialize};
use sprig_source::Span;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of the rule set an image reference came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleOrigin {
    /// Selector list as written, e.g. `.logo, .brand`.
    pub selector: String,
    /// Span of the whole rule set.
    pub span: Span,
}

/// Compatibility class implied by how the image is referenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// A bare `url(...)`.
    LiteralUrl,
    /// A url inside a vendor-prefixed function such as `-webkit-image-set(...)`.
    VendorSpecific,
    /// Anything that cannot be sprited (other functions, non-raster files).
    Unsupported,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::LiteralUrl => "literal url",
            ImageFormat::VendorSpecific => "vendor-specific",
            ImageFormat::Unsupported => "unsupported",
        })
    }
}

/// One background image found in a rule set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Resolved, normalized path of the image file.
    pub absolute_image_path: PathBuf,
    /// The rule set that references the image.
    pub origin: RuleOrigin,
    /// How the image is referenced.
    pub format: ImageFormat,
    /// Effective `background-position`, if any was declared.
    pub position: Option<ImagePosition>,
    /// Effective `background-repeat`, if any was declared.
    pub repeat: Option<BackgroundRepeat>,
    /// The url was a `%NAME%` placeholder. The path is then the url as
    /// written and the layout is not examined.
    pub is_token: bool,
}

impl ImageReference {
    /// Returns `true` if both references would be placed the same way in a sprite.
    pub fn same_layout(&self, other: &ImageReference) -> bool {
        self.position == other.position && self.repeat == other.repeat
    }
}

/// Images to assemble for one style sheet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    /// One reference per distinct path, in first-occurrence order.
    pub images_to_assemble: Vec<ImageReference>,
    /// Every recorded occurrence, keyed by path.
    pub duplicate_groups: BTreeMap<PathBuf, Vec<ImageReference>>,
    /// Placeholder references, in document order. Never assembled.
    #[serde(default)]
    pub token_references: Vec<ImageReference>,
}

impl ScanOutput {
    /// Creates an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an occurrence. The first occurrence of a path is also the
    /// one that gets assembled. Placeholder references are kept apart and
    /// take no part in the consistency checks.
    pub fn record(&mut self, reference: ImageReference) {
        if reference.is_token {
            self.token_references.push(reference);
            return;
        }
        let group = self
            .duplicate_groups
            .entry(reference.absolute_image_path.clone())
            .or_default();
        if group.is_empty() {
            self.images_to_assemble.push(reference.clone());
        }
        group.push(reference);
    }

    /// Number of distinct images.
    pub fn len(&self) -> usize {
        self.images_to_assemble.len()
    }

    /// Returns `true` if nothing is to be assembled.
    pub fn is_empty(&self) -> bool {
        self.images_to_assemble.is_empty()
    }

    /// Paths to assemble, in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.images_to_assemble
            .iter()
            .map(|r| r.absolute_image_path.as_path())
    }

    /// All occurrences of `path`.
    pub fn occurrences(&self, path: &Path) -> &[ImageReference] {
        self.duplicate_groups
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Checks that every image referenced more than once is referenced
    /// consistently. Paths are checked in first-occurrence order and each
    /// later occurrence is compared with the first.
    pub fn check_consistency(&self) -> Result<(), ScanError> {
        for first in &self.images_to_assemble {
            for other in self.occurrences(&first.absolute_image_path).iter().skip(1) {
                if other.format != first.format {
                    return Err(ScanError::DuplicateFormat {
                        path: first.absolute_image_path.clone(),
                        first: first.format,
                        second: other.format,
                        first_origin: first.origin.clone(),
                        second_origin: other.origin.clone(),
                    });
                }
                if !first.same_layout(other) {
                    return Err(ScanError::DuplicateRules {
                        path: first.absolute_image_path.clone(),
                        first: first.origin.clone(),
                        second: other.origin.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionKeyword, PositionValue};

    fn reference(path: &str, selector: &str) -> ImageReference {
        ImageReference {
            absolute_image_path: PathBuf::from(path),
            origin: RuleOrigin {
                selector: selector.to_string(),
                span: Span::SYNTHETIC,
            },
            format: ImageFormat::LiteralUrl,
            position: None,
            repeat: Some(BackgroundRepeat::NoRepeat),
            is_token: false,
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let mut out = ScanOutput::new();
        out.record(reference("/i/a.gif", ".a"));
        out.record(reference("/i/b.gif", ".b"));
        out.record(reference("/i/a.gif", ".c"));
        assert_eq!(out.len(), 2);
        assert_eq!(out.images_to_assemble[0].origin.selector, ".a");
        assert_eq!(out.occurrences(Path::new("/i/a.gif")).len(), 2);
        assert!(out.check_consistency().is_ok());
    }

    #[test]
    fn position_mismatch_is_duplicate_rules() {
        let mut out = ScanOutput::new();
        out.record(reference("/i/a.gif", ".a"));
        let mut moved = reference("/i/a.gif", ".b");
        moved.position = Some(ImagePosition {
            x: PositionValue::Keyword(PositionKeyword::Left),
            y: PositionValue::Keyword(PositionKeyword::Center),
        });
        out.record(moved);
        match out.check_consistency() {
            Err(ScanError::DuplicateRules { path, first, second }) => {
                assert_eq!(path, PathBuf::from("/i/a.gif"));
                assert_eq!(first.selector, ".a");
                assert_eq!(second.selector, ".b");
            }
            other => panic!("expected duplicate rules, got {other:?}"),
        }
    }

    #[test]
    fn format_is_checked_before_layout() {
        let mut out = ScanOutput::new();
        out.record(reference("/i/a.gif", ".a"));
        let mut vendor = reference("/i/a.gif", ".b");
        vendor.format = ImageFormat::VendorSpecific;
        vendor.repeat = None;
        out.record(vendor);
        assert!(matches!(
            out.check_consistency(),
            Err(ScanError::DuplicateFormat {
                first: ImageFormat::LiteralUrl,
                second: ImageFormat::VendorSpecific,
                ..
            })
        ));
    }

    #[test]
    fn serializes_as_json() {
        let mut out = ScanOutput::new();
        out.record(reference("/i/a.gif", ".a"));
        let json = serde_json::to_string(&out).unwrap();
        let back: ScanOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(out, back);
    }

    #[test]
    fn tokens_are_kept_apart() {
        let mut out = ScanOutput::new();
        out.record(reference("/i/a.gif", ".a"));
        let mut token = reference("/i/a.gif", ".b");
        token.is_token = true;
        token.format = ImageFormat::VendorSpecific;
        token.repeat = None;
        out.record(token);
        assert_eq!(out.len(), 1);
        assert_eq!(out.occurrences(Path::new("/i/a.gif")).len(), 1);
        assert_eq!(out.token_references.len(), 1);
        assert!(out.check_consistency().is_ok());
    }
}
