// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SHA-256 content hash, the canonical key behind the `(gxBucketId, fileHash)`
//! de-duplication invariant.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex-encoded SHA-256 digest of a file's original bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

/// Error returned when a string is not a valid 64-character lowercase hex
/// SHA-256 digest.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid content hash: {0}")]
pub struct InvalidContentHash(String);

impl ContentHash {
    /// Validate and wrap an existing hex string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidContentHash> {
        let raw = raw.into();
        if raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            Ok(Self(raw))
        } else {
            Err(InvalidContentHash(raw))
        }
    }

    /// Compute the hash of an in-memory byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental SHA-256 digest fed while a stream is copied to a temp file, so
/// the hash is available without a second read pass.
#[derive(Default)]
pub struct HashingDigest(Sha256);

impl HashingDigest {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash(hex::encode(self.0.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_bytes_is_64_lowercase_hex_chars() {
        let hash = ContentHash::of_bytes(b"hello world");
        assert_eq!(hash.as_str().len(), 64);
        assert!(hash.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn parse_rejects_uppercase_and_wrong_length() {
        assert!(ContentHash::parse("ABCD").is_err());
        assert!(ContentHash::parse("a".repeat(63)).is_err());
        assert!(ContentHash::parse("a".repeat(64)).is_ok());
    }

    #[test]
    fn incremental_digest_matches_one_shot() {
        let mut digest = HashingDigest::new();
        digest.update(b"hello ");
        digest.update(b"world");
        let incremental = digest.finalize();
        let one_shot = ContentHash::of_bytes(b"hello world");
        assert_eq!(incremental, one_shot);
    }
}
