//! Incremental build-artifact cache.
//!
//! Work is bracketed in nested [`CacheSection`]s keyed by a category, the
//! settings that affect the result and, for file-driven work, the input
//! file's content and modification time. A section whose inputs are
//! unchanged since a previous run reports itself valid and hands back that
//! run's outputs. Outputs live in a content-addressed [`ContentStore`];
//! [`CacheManager::clean_up`] sweeps everything the current run did not use.
//!
//! ```no_run
//! use sprig_cache::{CacheContext, CacheManager};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), sprig_cache::CacheError> {
//! let mut cache = CacheManager::new(Path::new(".sprig-cache"), CacheContext::default());
//! let id = cache.begin_file_section("minify", Path::new("site.css"), &"level=2")?;
//! if !cache.current_section()?.is_valid() {
//!     cache.store_output("css", b"a{color:red}")?;
//! }
//! cache.end_section(id)?;
//! cache.clean_up()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod fingerprint;
pub mod manager;
pub mod section;
pub mod store;

pub use descriptor::SectionRecord;
pub use error::CacheError;
pub use fingerprint::SourceStamp;
pub use manager::{CacheContext, CacheManager, SweepReport};
pub use section::{CacheSection, CachedOutput, SectionId, SectionState, Validity};
pub use store::ContentStore;
