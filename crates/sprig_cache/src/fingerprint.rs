//! Section fingerprints and source-file stamps.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use sprig_common::{ContentHash, ContentHasher};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Mixed into every fingerprint; bump when the fingerprint inputs change.
const FINGERPRINT_TAG: &[u8] = b"sprig-section-v1";

/// Serializes settings with object keys in sorted order, so that equal
/// settings always produce the same text regardless of field order.
pub fn canonical_json<T: Serialize + ?Sized>(settings: &T) -> Result<String, CacheError> {
    let value = serde_json::to_value(settings).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })?;
    // `serde_json::Map` is ordered by key unless `preserve_order` is enabled.
    serde_json::to_string(&value).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })
}

/// Identity of a source file at the time a section was computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStamp {
    /// The file.
    pub path: PathBuf,
    /// Digest of its content.
    pub digest: ContentHash,
    /// Modification time as seconds and nanoseconds since the epoch, when
    /// the platform reports one.
    pub modified: Option<(u64, u32)>,
}

impl SourceStamp {
    /// Hashes `path` and records its modification time.
    pub fn capture(path: &Path) -> Result<Self, CacheError> {
        let metadata = std::fs::metadata(path).map_err(|e| CacheError::io(path, e))?;
        let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
        let digest =
            ContentHash::from_reader(BufReader::new(file)).map_err(|e| CacheError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            digest,
            modified: modified_of(&metadata),
        })
    }

    /// Returns `true` if the file still has the recorded content and time.
    pub fn is_current(&self) -> bool {
        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return false;
        };
        if modified_of(&metadata) != self.modified {
            return false;
        }
        Self::capture(&self.path).is_ok_and(|now| now.digest == self.digest)
    }
}

fn modified_of(metadata: &std::fs::Metadata) -> Option<(u64, u32)> {
    let since_epoch = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some((since_epoch.as_secs(), since_epoch.subsec_nanos()))
}

/// Digest over the category, the canonical settings and, for file
/// sections, the file's digest and modification time.
pub fn fingerprint(category: &str, settings_json: &str, source: Option<&SourceStamp>) -> ContentHash {
    let mut hasher = ContentHasher::new();
    hasher.update_field(FINGERPRINT_TAG);
    hasher.update_field(category.as_bytes());
    hasher.update_field(settings_json.as_bytes());
    match source {
        Some(stamp) => {
            hasher.update(&[1]);
            hasher.update_field(stamp.path.to_string_lossy().as_bytes());
            hasher.update_field(stamp.digest.as_bytes());
            let (secs, nanos) = stamp.modified.unwrap_or((0, 0));
            hasher.update(&secs.to_le_bytes());
            hasher.update(&nanos.to_le_bytes());
        }
        None => hasher.update(&[0]),
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct AB {
        a: u32,
        b: &'static str,
    }

    #[derive(Serialize)]
    struct BA {
        b: &'static str,
        a: u32,
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let ab = canonical_json(&AB { a: 1, b: "x" }).unwrap();
        let ba = canonical_json(&BA { b: "x", a: 1 }).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab, r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn fingerprint_depends_on_every_input() {
        let base = fingerprint("scan", "{}", None);
        assert_eq!(base, fingerprint("scan", "{}", None));
        assert_ne!(base, fingerprint("other", "{}", None));
        assert_ne!(base, fingerprint("scan", r#"{"a":1}"#, None));

        let stamp = SourceStamp {
            path: PathBuf::from("/a.css"),
            digest: ContentHash::from_bytes(b"x"),
            modified: Some((1, 2)),
        };
        let with_file = fingerprint("scan", "{}", Some(&stamp));
        assert_ne!(base, with_file);

        let touched = SourceStamp {
            modified: Some((1, 3)),
            ..stamp.clone()
        };
        assert_ne!(with_file, fingerprint("scan", "{}", Some(&touched)));
    }

    #[test]
    fn stamp_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css");
        std::fs::write(&path, ".a{}").unwrap();
        let stamp = SourceStamp::capture(&path).unwrap();
        assert!(stamp.is_current());
        assert_eq!(stamp.digest, ContentHash::from_bytes(b".a{}"));

        std::fs::write(&path, ".b{}").unwrap();
        assert!(!stamp.is_current());

        std::fs::remove_file(&path).unwrap();
        assert!(!stamp.is_current());
    }
}
