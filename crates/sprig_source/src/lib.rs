//! Style-sheet sources and the locations that point back into them.
//!
//! The [`SourceMap`] owns the text of every style sheet loaded in a run.
//! Tree nodes carry a [`Span`] (a [`SourceId`] plus a byte range) so that
//! scan results and validation errors can name the rule they came from, and
//! [`Location`] turns a span into a `path:line:column` triple for display.

#![warn(missing_docs)]

pub mod location;
pub mod source_id;
pub mod source_map;
pub mod source_text;
pub mod span;

pub use location::Location;
pub use source_id::SourceId;
pub use source_map::SourceMap;
pub use source_text::SourceText;
pub use span::Span;
