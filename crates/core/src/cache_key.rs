//! Deterministic cache keys for subset artifacts.
//!
//! A key is the first 128 bits of SHA-256 over `"{family}:{index}"`,
//! rendered as lowercase hex. Keys are stable across runs and platforms.

use std::fmt;

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a key.
const KEY_BYTES: usize = 16;

/// Fingerprint identifying one (family, subset) build output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a family and subset index.
    pub fn derive(font_family: &str, subset_index: usize) -> Self {
        let digest = Sha256::digest(format!("{font_family}:{subset_index}").as_bytes());
        Self(hex::encode(&digest[..KEY_BYTES]))
    }

    /// Accept an existing key string if it has the exact shape of a derived key.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == KEY_BYTES * 2
            && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{key}.woff2`
    pub fn artifact_file_name(&self) -> String {
        format!("{}.woff2", self.0)
    }

    /// `{key}.json`
    pub fn metadata_file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a family and subset index.
pub fn derive_key(font_family: &str, subset_index: usize) -> CacheKey {
    CacheKey::derive(font_family, subset_index)
}
