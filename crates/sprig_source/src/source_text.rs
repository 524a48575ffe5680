//! The text of one style sheet with a line index.

use crate::source_id::SourceId;
use sprig_common::ContentHash;
use std::path::{Path, PathBuf};

/// One loaded style sheet.
#[derive(Debug)]
pub struct SourceText {
    /// Id issued by the owning [`SourceMap`](crate::SourceMap).
    pub id: SourceId,
    /// Absolute path of the style sheet, or a synthetic name for in-memory text.
    pub path: PathBuf,
    /// Full text.
    pub text: String,
    /// Digest of `text`.
    pub digest: ContentHash,
    line_starts: Vec<u32>,
}

impl SourceText {
    /// Wraps `text`, indexing its line starts.
    pub fn new(id: SourceId, path: PathBuf, text: String) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        let digest = ContentHash::from_bytes(text.as_bytes());
        Self {
            id,
            path,
            text,
            digest,
            line_starts,
        }
    }

    /// The directory relative urls in this style sheet resolve against.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (idx as u32 + 1, offset - self.line_starts[idx] + 1)
    }

    /// Returns the text between two byte offsets.
    pub fn slice(&self, start: u32, end: u32) -> &str {
        &self.text[start as usize..end as usize]
    }

    /// Returns the full line containing `offset`, without its newline.
    pub fn line_at(&self, offset: u32) -> &str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[line as usize - 1] as usize;
        let end = self
            .line_starts
            .get(line as usize)
            .map_or(self.text.len(), |next| *next as usize - 1);
        self.text[start..end].trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(text: &str) -> SourceText {
        SourceText::new(
            SourceId::from_raw(0),
            PathBuf::from("/site/css/main.css"),
            text.to_string(),
        )
    }

    #[test]
    fn line_col_resolution() {
        let s = sheet("a{}\n.b{\n}");
        assert_eq!(s.line_col(0), (1, 1));
        assert_eq!(s.line_col(4), (2, 1));
        assert_eq!(s.line_col(6), (2, 3));
        assert_eq!(s.line_col(8), (3, 1));
    }

    #[test]
    fn line_at_strips_newline() {
        let s = sheet(".a { color: red; }\r\n.b { }\n");
        assert_eq!(s.line_at(3), ".a { color: red; }");
        assert_eq!(s.line_at(21), ".b { }");
    }

    #[test]
    fn directory_is_parent() {
        assert_eq!(sheet("").directory(), Path::new("/site/css"));
    }

    #[test]
    fn digest_tracks_text() {
        assert_eq!(sheet("x").digest, ContentHash::from_bytes(b"x"));
    }
}
