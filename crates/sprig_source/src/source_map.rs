//! Owner of every style sheet loaded during a run.

use crate::location::Location;
use crate::source_id::SourceId;
use crate::source_text::SourceText;
use crate::span::Span;
use std::io;
use std::path::{Path, PathBuf};

/// Holds loaded style sheets and resolves spans against them.
#[derive(Debug)]
pub struct SourceMap {
    sources: Vec<SourceText>,
}

impl SourceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Reads a style sheet from disk.
    ///
    /// The stored path is made absolute against the current directory so
    /// that relative urls resolve the same way regardless of how the file
    /// was named on the command line.
    pub fn load(&mut self, path: &Path) -> Result<SourceId, io::Error> {
        let text = std::fs::read_to_string(path)?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(self.add(sprig_common::normalize_path(&absolute), text))
    }

    /// Adds in-memory text under the given name.
    pub fn add(&mut self, path: impl Into<PathBuf>, text: String) -> SourceId {
        let id = SourceId::from_raw(self.sources.len() as u32);
        self.sources.push(SourceText::new(id, path.into(), text));
        id
    }

    /// Returns the style sheet for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this map.
    pub fn get(&self, id: SourceId) -> &SourceText {
        &self.sources[id.as_raw() as usize]
    }

    /// Resolves a span to its start and end coordinates.
    pub fn locate(&self, span: Span) -> Location {
        let source = self.get(span.source);
        let (start_line, start_col) = source.line_col(span.start);
        let (end_line, end_col) = source.line_col(span.end.saturating_sub(1).max(span.start));
        Location {
            path: source.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Returns the text covered by a span.
    pub fn text_of(&self, span: Span) -> &str {
        self.get(span.source).slice(span.start, span.end)
    }

    /// Number of loaded style sheets.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}
