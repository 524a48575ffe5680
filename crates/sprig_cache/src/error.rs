//! Error types for cache operations.

use crate::section::SectionId;
use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Reads are fail-safe: a missing or damaged descriptor is a cache miss,
/// and the header variants below only travel between the descriptor
/// decoder and the code that logs them. Writes that cannot be persisted
/// and misuse of the section stack are returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A descriptor file has an invalid or missing header.
    #[error("invalid descriptor header in {path}: {reason}")]
    InvalidHeader {
        /// The descriptor path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the computed checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The descriptor path.
        path: PathBuf,
        /// The checksum from the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The descriptor format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The descriptor path.
        path: PathBuf,
        /// The current format version.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The descriptor was written by a different tool version.
    #[error("descriptor {path} was written by sprig {actual}, this is {expected}")]
    ToolMismatch {
        /// The descriptor path.
        path: PathBuf,
        /// The running tool version.
        expected: String,
        /// The tool version recorded in the file.
        actual: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// An operation needed an open section but the stack is empty.
    #[error("no cache section is open")]
    NoOpenSection,

    /// `end_section` was called for a section that is not the top of the stack.
    #[error(
        "cannot end cache section {ended}: the innermost open section is {}",
        describe_innermost(.innermost)
    )]
    UnbalancedSection {
        /// The section the caller tried to end.
        ended: SectionId,
        /// The section actually on top of the stack.
        innermost: Option<SectionId>,
    },

    /// A sweep or merge was requested while sections are still open.
    #[error("{count} cache section(s) are still open")]
    SectionsStillOpen {
        /// Number of open sections.
        count: usize,
    },

    /// A sweep was requested while forked managers still share the store.
    #[error("cannot sweep the cache while {count} forked manager(s) are alive")]
    SharedHandles {
        /// Number of other live handles.
        count: usize,
    },
}

fn describe_innermost(innermost: &Option<SectionId>) -> String {
    match innermost {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
