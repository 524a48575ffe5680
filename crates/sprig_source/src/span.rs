//! Byte ranges inside a loaded style sheet.

use crate::source_id::SourceId;
use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` in one style sheet.
///
/// Every rule set and declaration in the tree carries one, which makes it
/// the identity a scan result or validation error uses to point at a rule.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The style sheet the range belongs to.
    pub source: SourceId,
    /// Inclusive start offset.
    pub start: u32,
    /// Exclusive end offset.
    pub end: u32,
}

impl Span {
    /// Span for nodes built outside of any loaded source (tests, generated rules).
    pub const SYNTHETIC: Span = Span {
        source: SourceId::SYNTHETIC,
        start: 0,
        end: 0,
    };

    /// Creates a span over `[start, end)` in `source`.
    pub fn new(source: SourceId, start: u32, end: u32) -> Self {
        Self { source, start, end }
    }

    /// Returns the smallest span covering both `self` and `other`.
    ///
    /// # Panics
    ///
    /// Panics if the spans belong to different sources.
    pub fn to(self, other: Span) -> Span {
        assert_eq!(
            self.source, other.source,
            "cannot join spans from different sources"
        );
        Span {
            source: self.source,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` for an empty range.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if the span does not point into a loaded source.
    pub fn is_synthetic(&self) -> bool {
        self.source == SourceId::SYNTHETIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_covers_both() {
        let s = SourceId::from_raw(0);
        let joined = Span::new(s, 10, 14).to(Span::new(s, 2, 6));
        assert_eq!(joined, Span::new(s, 2, 14));
    }

    #[test]
    #[should_panic(expected = "different sources")]
    fn join_across_sources_panics() {
        let a = Span::new(SourceId::from_raw(0), 0, 1);
        let b = Span::new(SourceId::from_raw(1), 0, 1);
        let _ = a.to(b);
    }

    #[test]
    fn len_and_empty() {
        let s = SourceId::from_raw(0);
        assert_eq!(Span::new(s, 3, 8).len(), 5);
        assert!(Span::new(s, 4, 4).is_empty());
    }

    #[test]
    fn synthetic_span() {
        assert!(Span::SYNTHETIC.is_synthetic());
        assert!(!Span::new(SourceId::from_raw(0), 0, 0).is_synthetic());
    }

    #[test]
    fn serde_roundtrip() {
        let span = Span::new(SourceId::from_raw(2), 5, 9);
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(serde_json::from_str::<Span>(&json).unwrap(), span);
    }
}
