//! Persisted section descriptors.
//!
//! A descriptor records what a committed section produced: its identity,
//! the source files it depended on, the stored outputs and the child
//! sections it contained. The file starts with a 4-byte header length, a
//! bincode header (magic, format version, tool version, payload checksum)
//! and then the bincode payload.

use crate::error::CacheError;
use crate::fingerprint::SourceStamp;
use serde::{Deserialize, Serialize};
use sprig_common::ContentHash;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Magic bytes identifying a sprig section descriptor.
const DESCRIPTOR_MAGIC: [u8; 4] = *b"SPRG";

/// Current descriptor format version. Increment on breaking changes to
/// the header or payload format.
const DESCRIPTOR_FORMAT_VERSION: u32 = 1;

/// File extension of descriptors.
pub const DESCRIPTOR_EXT: &str = "section";

/// Header prepended to every descriptor for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DescriptorHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: ContentHash,
}

/// A named output stored during a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedOutput {
    /// Logical name chosen by the caller.
    pub name: String,
    /// Stored path, relative to the cache root.
    pub path: PathBuf,
}

/// Reference to a committed child section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    /// Sanitized category of the child.
    pub category: String,
    /// Fingerprint of the child.
    pub fingerprint: ContentHash,
}

/// Everything persisted about a committed section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Sanitized category.
    pub category: String,
    /// Fingerprint, also the descriptor's file stem.
    pub fingerprint: ContentHash,
    /// Source files the section depended on.
    pub sources: Vec<SourceStamp>,
    /// Outputs in the order they were stored.
    pub outputs: Vec<RecordedOutput>,
    /// Child sections in the order they were committed.
    pub children: Vec<ChildRef>,
}

/// Encodes a record with its header.
pub fn encode_descriptor(record: &SectionRecord, tool_version: &str) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serde::encode_to_vec(record, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })?;
    let header = DescriptorHeader {
        magic: DESCRIPTOR_MAGIC,
        format_version: DESCRIPTOR_FORMAT_VERSION,
        tool_version: tool_version.to_string(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes and validates descriptor bytes read from `path`.
pub fn decode_descriptor(
    path: &Path,
    raw: &[u8],
    tool_version: &str,
) -> Result<SectionRecord, CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file too short"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (DescriptorHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != DESCRIPTOR_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != DESCRIPTOR_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: DESCRIPTOR_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    if header.tool_version != tool_version {
        return Err(CacheError::ToolMismatch {
            path: path.to_path_buf(),
            expected: tool_version.to_string(),
            actual: header.tool_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_hex(),
            actual: actual.to_hex(),
        });
    }

    let (record, _): (SectionRecord, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;
    Ok(record)
}

/// Reads a descriptor, returning `None` for a missing, unreadable or
/// invalid file. Damaged descriptors are logged and treated as misses.
pub fn read_descriptor(path: &Path, tool_version: &str) -> Option<SectionRecord> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable cache descriptor, treating as a miss");
            return None;
        }
    };
    match decode_descriptor(path, &raw, tool_version) {
        Ok(record) => Some(record),
        Err(CacheError::ToolMismatch { .. }) => None,
        Err(e) => {
            warn!(error = %e, "discarding damaged cache descriptor");
            None
        }
    }
}
