//! Loading and validation of `sprig.toml`.
//!
//! The file is optional: a project without one gets [`SprigConfig::default`],
//! which caches under `.sprig-cache`, sweeps stale entries after each run and
//! ignores no images.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::{CacheConfig, SpriteConfig, SprigConfig};
