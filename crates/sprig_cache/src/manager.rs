//! The cache manager: section stack, session memo and sweep.
//!
//! A [`CacheManager`] is created once per build run. Callers bracket each
//! unit of work with [`begin_section`](CacheManager::begin_section) and
//! [`end_section`](CacheManager::end_section); sections opened while
//! another is open become its children. If a section reports itself valid
//! right after `begin_section`, the caller can skip the work and read the
//! previous outputs instead.
//!
//! Each manager owns its stack. Parallel workers each get a
//! [`fork`](CacheManager::fork), which shares the content store, the memo
//! and the touched set, and hand it back with
//! [`absorb`](CacheManager::absorb) when done.

use crate::descriptor::{
    encode_descriptor, read_descriptor, ChildRef, RecordedOutput, SectionRecord, DESCRIPTOR_EXT,
};
use crate::error::CacheError;
use crate::fingerprint::{canonical_json, fingerprint, SourceStamp};
use crate::section::{CacheSection, CachedOutput, SectionId, SectionState, Validity};
use crate::store::{sanitize_category, ContentStore};
use serde::Serialize;
use sprig_common::ContentHash;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, warn};

type Memo = RwLock<HashMap<PathBuf, Arc<dyn Any + Send + Sync>>>;

/// Ambient build context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheContext {
    /// Free-form label used in log events (e.g. the build target).
    pub label: String,
    /// Tool version written into descriptors; descriptors from another
    /// version are misses.
    pub tool_version: String,
}

impl Default for CacheContext {
    fn default() -> Self {
        Self {
            label: "sprig".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Counts reported by [`CacheManager::clean_up`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files deleted.
    pub removed: usize,
    /// Files kept because this run used them.
    pub kept: usize,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "removed {} stale file(s), kept {}", self.removed, self.kept)
    }
}

/// A descriptor as loaded under a given tool version.
struct MemoizedRecord {
    tool_version: String,
    record: Arc<SectionRecord>,
}

/// State shared between a manager and its forks.
struct Shared {
    root: PathBuf,
    store: ContentStore,
    memo: Memo,
    next_id: AtomicU64,
}

/// Owner of the section stack, the content store and the session memo.
pub struct CacheManager {
    shared: Arc<Shared>,
    context: CacheContext,
    stack: Vec<CacheSection>,
    roots: Vec<CacheSection>,
}

impl CacheManager {
    /// Creates a manager for the cache rooted at `root`.
    pub fn new(root: &Path, context: CacheContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                root: root.to_path_buf(),
                store: ContentStore::new(root),
                memo: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
            context,
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Root cache directory.
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// The shared content store.
    pub fn content_store(&self) -> &ContentStore {
        &self.shared.store
    }

    /// Current ambient context.
    pub fn context(&self) -> &CacheContext {
        &self.context
    }

    /// Rebinds the ambient context. The memo and touched set are kept.
    pub fn set_context(&mut self, context: CacheContext) {
        debug!(label = %context.label, "cache context changed");
        self.context = context;
    }

    /// Number of open sections.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// `<root>/<category>/<file_name>`; no I/O.
    pub fn get_absolute_cache_file_path(&self, category: &str, file_name: &str) -> PathBuf {
        self.shared
            .root
            .join(sanitize_category(category))
            .join(file_name)
    }

    fn descriptor_path(&self, category: &str, fingerprint: &ContentHash) -> PathBuf {
        self.get_absolute_cache_file_path(
            category,
            &format!("{}.{DESCRIPTOR_EXT}", fingerprint.to_hex()),
        )
    }

    /// Opens a section keyed by `category` and `settings`.
    pub fn begin_section<S: Serialize + ?Sized>(
        &mut self,
        category: &str,
        settings: &S,
    ) -> Result<SectionId, CacheError> {
        let settings_json = canonical_json(settings)?;
        Ok(self.open(category, &settings_json, None))
    }

    /// Opens a section keyed by `category`, `settings` and the content and
    /// modification time of `source`.
    pub fn begin_file_section<S: Serialize + ?Sized>(
        &mut self,
        category: &str,
        source: &Path,
        settings: &S,
    ) -> Result<SectionId, CacheError> {
        let settings_json = canonical_json(settings)?;
        let stamp = SourceStamp::capture(source)?;
        Ok(self.open(category, &settings_json, Some(stamp)))
    }

    fn open(&mut self, category: &str, settings_json: &str, stamp: Option<SourceStamp>) -> SectionId {
        let category = sanitize_category(category);
        let fingerprint = fingerprint(&category, settings_json, stamp.as_ref());
        let descriptor_path = self.descriptor_path(&category, &fingerprint);

        let prior = self
            .load_record(&descriptor_path)
            .filter(|record| self.record_is_live(record));
        let prior_outputs: Vec<CachedOutput> = prior
            .as_ref()
            .map(|record| {
                record
                    .outputs
                    .iter()
                    .map(|o| CachedOutput {
                        name: o.name.clone(),
                        path: self.shared.root.join(&o.path),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let speculative_hit = prior.is_some();

        let id = SectionId::from_raw(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            context = %self.context.label,
            section = %id,
            category = %category,
            fingerprint = %fingerprint,
            hit = speculative_hit,
            "begin cache section"
        );
        self.stack.push(CacheSection {
            id,
            category,
            fingerprint,
            descriptor_path,
            sources: stamp.into_iter().collect(),
            prior,
            prior_outputs,
            outputs: Vec::new(),
            children: Vec::new(),
            speculative_hit,
            validity: Validity::Unknown,
            state: SectionState::Open,
        });
        id
    }

    /// The innermost open section.
    pub fn current_section(&self) -> Result<&CacheSection, CacheError> {
        self.stack.last().ok_or(CacheError::NoOpenSection)
    }

    fn current_section_mut(&mut self) -> Result<&mut CacheSection, CacheError> {
        self.stack.last_mut().ok_or(CacheError::NoOpenSection)
    }

    /// Stores `bytes` as the output `name` of the innermost open section.
    pub fn store_output(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let category = self.current_section()?.category.clone();
        let path = self.shared.store.store(&category, bytes)?;
        self.current_section_mut()?.outputs.push(CachedOutput {
            name: name.to_string(),
            path: path.clone(),
        });
        Ok(path)
    }

    /// Stores a copy of the file at `source` as the output `name` of the
    /// innermost open section.
    pub fn store_output_file(&mut self, name: &str, source: &Path) -> Result<PathBuf, CacheError> {
        let category = self.current_section()?.category.clone();
        let path = self.shared.store.store_file(&category, source)?;
        self.current_section_mut()?.outputs.push(CachedOutput {
            name: name.to_string(),
            path: path.clone(),
        });
        Ok(path)
    }

    /// Reads the output `name` of the innermost open section.
    pub fn read_output(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.current_section()?.read_output(name)
    }

    /// Closes the innermost section, which must be `id`.
    ///
    /// Persists a descriptor unless the section was reused unchanged, then
    /// folds the section into its parent. Returns the committed section
    /// when it was a root. Ending any other section is a contract
    /// violation: the call fails and the stack is left as it was.
    pub fn end_section(&mut self, id: SectionId) -> Result<Option<CacheSection>, CacheError> {
        let innermost = self.stack.last().map(CacheSection::id);
        if innermost != Some(id) {
            error!(ended = %id, ?innermost, "unbalanced end_section");
            return Err(CacheError::UnbalancedSection {
                ended: id,
                innermost,
            });
        }
        let Some(mut section) = self.stack.pop() else {
            return Err(CacheError::NoOpenSection);
        };
        section.state = SectionState::Closing;

        let children_valid = section
            .children
            .iter()
            .all(|c| c.validity == Validity::Valid);
        let valid = section.speculative_hit && children_valid;

        if valid && section.outputs.is_empty() {
            if let Some(prior) = &section.prior {
                self.touch_record_tree(prior);
            }
        } else if let Err(e) = self.persist(&section) {
            section.state = SectionState::Open;
            self.stack.push(section);
            return Err(e);
        }

        section.validity = if valid {
            Validity::Valid
        } else {
            Validity::Invalid
        };
        section.state = SectionState::Committed;
        debug!(
            context = %self.context.label,
            section = %section.id,
            category = %section.category,
            valid,
            "end cache section"
        );

        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(section);
                Ok(None)
            }
            None => {
                self.roots.push(section.clone());
                Ok(Some(section))
            }
        }
    }

    fn persist(&self, section: &CacheSection) -> Result<(), CacheError> {
        let store = &self.shared.store;
        let outputs: Vec<RecordedOutput> = if section.outputs.is_empty() && section.speculative_hit {
            let kept = section.prior.as_ref().map(|p| p.outputs.clone()).unwrap_or_default();
            for output in &kept {
                store.touch(&self.shared.root.join(&output.path));
            }
            kept
        } else {
            section
                .outputs
                .iter()
                .map(|o| RecordedOutput {
                    name: o.name.clone(),
                    path: o
                        .path
                        .strip_prefix(&self.shared.root)
                        .unwrap_or(&o.path)
                        .to_path_buf(),
                })
                .collect()
        };
        let children: Vec<ChildRef> = if section.children.is_empty() && section.speculative_hit {
            let kept = section.prior.as_ref().map(|p| p.children.clone()).unwrap_or_default();
            for child in &kept {
                self.touch_child(child);
            }
            kept
        } else {
            section
                .children
                .iter()
                .map(|c| ChildRef {
                    category: c.category.clone(),
                    fingerprint: c.fingerprint,
                })
                .collect()
        };
        let record = SectionRecord {
            category: section.category.clone(),
            fingerprint: section.fingerprint,
            sources: section.sources.clone(),
            outputs,
            children,
        };

        let bytes = encode_descriptor(&record, &self.context.tool_version)?;
        store.write_atomic(&section.descriptor_path, &bytes)?;
        store.touch(&section.descriptor_path);
        self.memoize(
            &section.descriptor_path,
            MemoizedRecord {
                tool_version: self.context.tool_version.clone(),
                record: Arc::new(record),
            },
        );
        Ok(())
    }

    /// Sections committed at the top level, in commit order.
    pub fn committed_sections(&self) -> &[CacheSection] {
        &self.roots
    }

    /// Returns the value memoized for `descriptor_path`, or calls `load`
    /// and memoizes its result.
    ///
    /// Only successful loads are memoized, so a miss is retried on the next
    /// call. The memo lives as long as the manager and its forks.
    pub fn load_cache_section<T, F>(&self, descriptor_path: &Path, load: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Path) -> Option<T>,
    {
        let cached = self
            .shared
            .memo
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(descriptor_path)
            .cloned();
        if let Some(value) = cached {
            if let Ok(value) = value.downcast::<T>() {
                return Some(value);
            }
        }
        let value = load(descriptor_path)?;
        Some(self.memoize(descriptor_path, value))
    }

    fn memoize<T: Any + Send + Sync>(&self, path: &Path, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.shared
            .memo
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_path_buf(), value.clone());
        value
    }

    fn load_record(&self, descriptor_path: &Path) -> Option<Arc<SectionRecord>> {
        let tool_version = &self.context.tool_version;
        let read = |path: &Path| {
            read_descriptor(path, tool_version).map(|record| MemoizedRecord {
                tool_version: tool_version.clone(),
                record: Arc::new(record),
            })
        };
        let entry = self.load_cache_section(descriptor_path, read)?;
        if entry.tool_version == *tool_version {
            return Some(entry.record.clone());
        }
        // Memoized under another context; re-read under this one.
        let fresh = read(descriptor_path)?;
        let record = fresh.record.clone();
        self.memoize(descriptor_path, fresh);
        Some(record)
    }

    /// A record can be reused if its outputs still exist, its source files
    /// are unchanged and every child it recorded can be reused too.
    fn record_is_live(&self, record: &SectionRecord) -> bool {
        if let Some(missing) = record
            .outputs
            .iter()
            .find(|o| !self.shared.root.join(&o.path).is_file())
        {
            debug!(output = %missing.name, "cached output is gone");
            return false;
        }
        if record.sources.iter().any(|s| !s.is_current()) {
            return false;
        }
        record.children.iter().all(|child| {
            let path = self.descriptor_path(&child.category, &child.fingerprint);
            self.load_record(&path)
                .is_some_and(|child_record| self.record_is_live(&child_record))
        })
    }

    fn touch_record_tree(&self, record: &SectionRecord) {
        let store = &self.shared.store;
        store.touch(&self.descriptor_path(&record.category, &record.fingerprint));
        for output in &record.outputs {
            store.touch(&self.shared.root.join(&output.path));
        }
        for child in &record.children {
            self.touch_child(child);
        }
    }

    fn touch_child(&self, child: &ChildRef) {
        let path = self.descriptor_path(&child.category, &child.fingerprint);
        match self.load_record(&path) {
            Some(child_record) => self.touch_record_tree(&child_record),
            None => warn!(path = %path.display(), "reused section lost a child descriptor"),
        }
    }

    /// Creates a worker manager with an empty stack that shares the store,
    /// memo and touched set with this one.
    pub fn fork(&self) -> CacheManager {
        CacheManager {
            shared: Arc::clone(&self.shared),
            context: self.context.clone(),
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Takes back a forked worker. Its committed sections become children
    /// of the innermost open section, or committed roots if none is open.
    pub fn absorb(&mut self, worker: CacheManager) -> Result<(), CacheError> {
        if !worker.stack.is_empty() {
            return Err(CacheError::SectionsStillOpen {
                count: worker.stack.len(),
            });
        }
        match self.stack.last_mut() {
            Some(parent) => parent.children.extend(worker.roots),
            None => self.roots.extend(worker.roots),
        }
        Ok(())
    }

    /// Deletes every file in the category directories that this run did
    /// not touch, then removes category directories left empty.
    ///
    /// Must run after all sections are closed and all forks are absorbed.
    pub fn clean_up(&mut self) -> Result<SweepReport, CacheError> {
        if !self.stack.is_empty() {
            error!(open = self.stack.len(), "clean_up called with open sections");
            return Err(CacheError::SectionsStillOpen {
                count: self.stack.len(),
            });
        }
        let others = Arc::strong_count(&self.shared) - 1;
        if others > 0 {
            error!(forks = others, "clean_up called while forks are alive");
            return Err(CacheError::SharedHandles { count: others });
        }

        let mut report = SweepReport::default();
        let root = &self.shared.root;
        if !root.is_dir() {
            return Ok(report);
        }
        let categories = std::fs::read_dir(root).map_err(|e| CacheError::io(root, e))?;
        for category in categories {
            let category = category.map_err(|e| CacheError::io(root, e))?;
            let dir = category.path();
            if !dir.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(&dir).map_err(|e| CacheError::io(&dir, e))?;
            let mut remaining = 0usize;
            for entry in entries {
                let path = entry.map_err(|e| CacheError::io(&dir, e))?.path();
                if !path.is_file() {
                    remaining += 1;
                    continue;
                }
                if self.shared.store.is_touched(&path) {
                    report.kept += 1;
                    remaining += 1;
                } else {
                    std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                    debug!(path = %path.display(), "removed stale cache file");
                    report.removed += 1;
                }
            }
            if remaining == 0 {
                std::fs::remove_dir(&dir).map_err(|e| CacheError::io(&dir, e))?;
            }
        }
        self.shared
            .memo
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        debug!(removed = report.removed, kept = report.kept, "cache sweep done");
        Ok(report)
    }
}
