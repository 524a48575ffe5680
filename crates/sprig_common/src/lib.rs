//! Shared foundational types used across the sprig toolchain.
//!
//! Provides the [`ContentHash`] digest used as the key of every cache entry,
//! a streaming [`ContentHasher`] for large inputs, and lexical path helpers
//! shared by url resolution and the cache sweep.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{ContentHash, ContentHasher};
pub use path::{has_url_scheme, normalize_path};
