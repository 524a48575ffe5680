//! Content-addressed file storage.
//!
//! Every stored blob lives at `<root>/<category>/<digest>[.<ext>]`. Files are
//! written under a temporary name in the same directory and renamed into
//! place, so a concurrent reader never sees a partial file under its final
//! name. Every path the store hands out or finds already present is marked
//! as touched; the sweep deletes whatever was not touched.

use crate::error::CacheError;
use sprig_common::ContentHash;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Suffix of in-flight temporary files.
pub(crate) const TEMP_SUFFIX: &str = "tmp";

/// Maps a category to a directory name: lowercase `[a-z0-9_-]`, other
/// characters replaced by `-`.
pub fn sanitize_category(category: &str) -> String {
    let name: String = category
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if name.is_empty() {
        "default".to_string()
    } else {
        name
    }
}

/// A content-addressed store rooted at the cache directory.
///
/// Safe to share between threads; all methods take `&self`.
pub struct ContentStore {
    root: PathBuf,
    touched: Mutex<HashSet<PathBuf>>,
    physical_writes: AtomicUsize,
    temp_counter: AtomicU64,
}

impl ContentStore {
    /// Creates a store rooted at `root`. Nothing is created on disk until
    /// the first write.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            touched: Mutex::new(HashSet::new()),
            physical_writes: AtomicUsize::new(0),
            temp_counter: AtomicU64::new(0),
        }
    }

    /// Root cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entries of `category`.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(sanitize_category(category))
    }

    /// Stores `bytes` and returns the path of the stored copy.
    ///
    /// Storing identical content again returns the same path without
    /// writing.
    pub fn store(&self, category: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let digest = ContentHash::from_bytes(bytes);
        let dest = self.category_dir(category).join(digest.to_hex());
        if dest.is_file() {
            debug!(path = %dest.display(), "content already stored");
        } else {
            self.write_atomic(&dest, bytes)?;
        }
        self.touch(&dest);
        Ok(dest)
    }

    /// Stores a copy of the file at `source`, keeping its extension.
    ///
    /// The file is hashed in a streaming fashion, then copied under a
    /// temporary name and renamed into place if no copy exists yet.
    pub fn store_file(&self, category: &str, source: &Path) -> Result<PathBuf, CacheError> {
        let file = File::open(source).map_err(|e| CacheError::io(source, e))?;
        let digest =
            ContentHash::from_reader(BufReader::new(file)).map_err(|e| CacheError::io(source, e))?;
        let name = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", digest.to_hex(), ext.to_ascii_lowercase()),
            None => digest.to_hex(),
        };
        let dest = self.category_dir(category).join(name);
        if dest.is_file() {
            debug!(path = %dest.display(), "content already stored");
        } else {
            let temp = self.prepare_temp(&dest)?;
            std::fs::copy(source, &temp).map_err(|e| {
                let _ = std::fs::remove_file(&temp);
                CacheError::io(source, e)
            })?;
            self.commit_temp(&temp, &dest)?;
        }
        self.touch(&dest);
        Ok(dest)
    }

    /// Writes `bytes` to `dest` through a temporary file and a rename.
    ///
    /// Used for content blobs and for section descriptors. Counts as one
    /// physical write.
    pub fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let temp = self.prepare_temp(dest)?;
        std::fs::write(&temp, bytes).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            CacheError::io(&temp, e)
        })?;
        self.commit_temp(&temp, dest)
    }

    fn prepare_temp(&self, dest: &Path) -> Result<PathBuf, CacheError> {
        let dir = dest.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;
        let stem = dest
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("entry");
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        Ok(dir.join(format!(".{stem}.{}-{n}.{TEMP_SUFFIX}", std::process::id())))
    }

    fn commit_temp(&self, temp: &Path, dest: &Path) -> Result<(), CacheError> {
        std::fs::rename(temp, dest).map_err(|e| {
            let _ = std::fs::remove_file(temp);
            CacheError::io(dest, e)
        })?;
        self.physical_writes.fetch_add(1, Ordering::Relaxed);
        debug!(path = %dest.display(), "stored cache entry");
        Ok(())
    }

    fn touched(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.touched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks `path` as used by this run.
    pub fn touch(&self, path: &Path) {
        self.touched().insert(path.to_path_buf());
    }

    /// Returns `true` if `path` was touched this run.
    pub fn is_touched(&self, path: &Path) -> bool {
        self.touched().contains(path)
    }

    /// Number of distinct paths touched this run.
    pub fn touched_count(&self) -> usize {
        self.touched().len()
    }

    /// Number of files actually written (renamed into place) this run.
    pub fn physical_writes(&self) -> usize {
        self.physical_writes.load(Ordering::Relaxed)
    }
}
