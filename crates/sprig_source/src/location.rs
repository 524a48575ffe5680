//! Line/column coordinates for display.

use std::fmt;
use std::path::PathBuf;

/// A span resolved to 1-based line and column numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path of the style sheet.
    pub path: PathBuf,
    /// First line of the span.
    pub start_line: u32,
    /// Column of the first byte.
    pub start_col: u32,
    /// Last line of the span.
    pub end_line: u32,
    /// Column of the last byte.
    pub end_col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.start_line,
            self.start_col
        )
    }
}
