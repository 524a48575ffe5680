//! Content digests for the content-addressed cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};

use xxhash_rust::xxh3::Xxh3;

/// Buffer size used when hashing readers.
const READ_CHUNK: usize = 64 * 1024;

/// A 128-bit XXH3 digest of a byte sequence.
///
/// Equal digests are treated as equal content. The hex form (32 lowercase
/// characters) is used as the file name of stored artifacts and section
/// descriptors.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes the digest of an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes the digest of everything readable from `reader`.
    ///
    /// The input is consumed in fixed-size chunks so arbitrarily large files
    /// never have to be held in memory.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = ContentHasher::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finish())
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the lowercase hex form of the digest.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental digest builder producing a [`ContentHash`].
///
/// Feeding the same bytes in any chunking yields the same digest as
/// [`ContentHash::from_bytes`] over their concatenation.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Appends bytes to the digest input.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Appends a length-prefixed field, so adjacent fields cannot run together.
    pub fn update_field(&mut self, data: &[u8]) {
        self.state.update(&(data.len() as u64).to_le_bytes());
        self.state.update(data);
    }

    /// Returns the digest of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_32_hex_chars() {
        let h = ContentHash::from_bytes(b"test");
        let s = h.to_hex();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let mut hasher = ContentHasher::new();
        for chunk in data.chunks(777) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finish(), ContentHash::from_bytes(&data));
    }

    #[test]
    fn reader_matches_one_shot() {
        let data = vec![7u8; READ_CHUNK * 2 + 13];
        let from_reader = ContentHash::from_reader(&data[..]).unwrap();
        assert_eq!(from_reader, ContentHash::from_bytes(&data));
    }

    #[test]
    fn fields_do_not_run_together() {
        let mut a = ContentHasher::new();
        a.update_field(b"ab");
        a.update_field(b"c");
        let mut b = ContentHasher::new();
        b.update_field(b"a");
        b.update_field(b"bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
