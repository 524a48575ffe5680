//! Cache sections: units of work tracked by the [`CacheManager`](crate::CacheManager).

use crate::descriptor::SectionRecord;
use crate::error::CacheError;
use crate::fingerprint::SourceStamp;
use sprig_common::ContentHash;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle returned by `begin_section`, passed back to `end_section`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

impl SectionId {
    /// Creates an id from its raw value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a section's previous results can be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validity {
    /// Not decided yet; the section is still open.
    Unknown,
    /// Cache hit: the section and all of its children were reusable.
    Valid,
    /// Cache miss: the work was (or has to be) redone.
    Invalid,
}

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionState {
    /// On the stack, accepting outputs and children.
    Open,
    /// Being persisted by `end_section`.
    Closing,
    /// Popped and folded into its parent or into the committed roots.
    Committed,
}

/// A named output of a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedOutput {
    /// Logical name chosen by the caller.
    pub name: String,
    /// Absolute path of the stored content.
    pub path: PathBuf,
}

/// One unit of cached work.
#[derive(Clone, Debug)]
pub struct CacheSection {
    pub(crate) id: SectionId,
    pub(crate) category: String,
    pub(crate) fingerprint: ContentHash,
    pub(crate) descriptor_path: PathBuf,
    pub(crate) sources: Vec<SourceStamp>,
    pub(crate) prior: Option<Arc<SectionRecord>>,
    pub(crate) prior_outputs: Vec<CachedOutput>,
    pub(crate) outputs: Vec<CachedOutput>,
    pub(crate) children: Vec<CacheSection>,
    pub(crate) speculative_hit: bool,
    pub(crate) validity: Validity,
    pub(crate) state: SectionState,
}

impl CacheSection {
    /// Handle of this section.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Sanitized category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Fingerprint of the section's inputs.
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    /// Where the descriptor is (or will be) persisted.
    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    /// Final verdict; [`Validity::Unknown`] while open.
    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Lifecycle state.
    pub fn state(&self) -> SectionState {
        self.state
    }

    /// Returns `true` if a previous run's results can be reused.
    ///
    /// While the section is open this is the speculative verdict taken at
    /// `begin_section`; once committed it is the final one, which also
    /// accounts for the children.
    pub fn is_valid(&self) -> bool {
        match self.validity {
            Validity::Unknown => self.speculative_hit,
            Validity::Valid => true,
            Validity::Invalid => false,
        }
    }

    /// Outputs of the section: those stored during this run, or the
    /// previous run's outputs when the section was reused unchanged.
    pub fn outputs(&self) -> &[CachedOutput] {
        if self.outputs.is_empty() && self.speculative_hit {
            &self.prior_outputs
        } else {
            &self.outputs
        }
    }

    /// Committed children in commit order.
    pub fn children(&self) -> &[CacheSection] {
        &self.children
    }

    /// Path of the output called `name`, looking at this run's outputs
    /// first and then at the reused ones.
    pub fn cached_output(&self, name: &str) -> Option<&Path> {
        let reusable: &[CachedOutput] = if self.speculative_hit {
            &self.prior_outputs
        } else {
            &[]
        };
        self.outputs
            .iter()
            .rev()
            .chain(reusable.iter())
            .find(|o| o.name == name)
            .map(|o| o.path.as_path())
    }

    /// Reads the output called `name`; `Ok(None)` if there is none.
    pub fn read_output(&self, name: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self.cached_output(name) {
            Some(path) => std::fs::read(path)
                .map(Some)
                .map_err(|e| CacheError::io(path, e)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(hit: bool) -> CacheSection {
        CacheSection {
            id: SectionId::from_raw(7),
            category: "scan".into(),
            fingerprint: ContentHash::from_bytes(b"fp"),
            descriptor_path: PathBuf::from("/cache/scan/fp.section"),
            sources: vec![],
            prior: None,
            prior_outputs: vec![CachedOutput {
                name: "scan".into(),
                path: PathBuf::from("/cache/scan/old"),
            }],
            outputs: vec![],
            children: vec![],
            speculative_hit: hit,
            validity: Validity::Unknown,
            state: SectionState::Open,
        }
    }

    #[test]
    fn reused_outputs_only_on_hit() {
        assert_eq!(
            section(true).cached_output("scan"),
            Some(Path::new("/cache/scan/old"))
        );
        assert_eq!(section(false).cached_output("scan"), None);
        assert!(section(false).outputs().is_empty());
    }

    #[test]
    fn new_outputs_take_precedence() {
        let mut s = section(true);
        s.outputs.push(CachedOutput {
            name: "scan".into(),
            path: PathBuf::from("/cache/scan/new"),
        });
        assert_eq!(s.cached_output("scan"), Some(Path::new("/cache/scan/new")));
        assert_eq!(s.outputs().len(), 1);
    }

    #[test]
    fn validity_while_open_is_speculative() {
        assert!(section(true).is_valid());
        assert!(!section(false).is_valid());
        let mut s = section(true);
        s.validity = Validity::Invalid;
        assert!(!s.is_valid());
    }

    #[test]
    fn id_display() {
        assert_eq!(SectionId::from_raw(12).to_string(), "#12");
    }
}
