//! Identifier of a style sheet loaded into a [`SourceMap`](crate::SourceMap).

use serde::{Deserialize, Serialize};

/// Index of a style sheet within the [`SourceMap`](crate::SourceMap) of a run.
///
/// Ids are only meaningful for the map that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceId(u32);

impl SourceId {
    /// Id used by spans that do not point into any loaded source.
    pub const SYNTHETIC: SourceId = SourceId(u32::MAX);

    /// Wraps a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}
