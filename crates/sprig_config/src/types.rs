//! Configuration types deserialized from `sprig.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct SprigConfig {
    /// Build cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Sprite analysis settings.
    #[serde(default)]
    pub sprite: SpriteConfig,
}

/// `[cache]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When `false`, every run recomputes everything and nothing is stored.
    pub enabled: bool,
    /// Cache directory, relative to the project directory unless absolute.
    pub root: PathBuf,
    /// Delete cache entries not used by the run once it finishes.
    pub sweep: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: PathBuf::from(".sprig-cache"),
            sweep: true,
        }
    }
}

/// `[sprite]` table.
#[derive(Debug, Default, Deserialize)]
pub struct SpriteConfig {
    /// Directory that root-relative urls (`/i/a.png`) resolve against.
    /// Defaults to the directory of each style sheet.
    #[serde(default)]
    pub image_root: Option<PathBuf>,

    /// Images never considered for sprites.
    ///
    /// Accepts a single string or a list, e.g. `ignore = "/i/logo.png"`.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub ignore: Vec<String>,
}

fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut values = Vec::new();
            while let Some(value) = seq.next_element::<String>()? {
                values.push(value);
            }
            Ok(values)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
