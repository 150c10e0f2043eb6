//! # Content Digest
//!
//! SHA-256 over [`CanonicalBytes`]. Taking `&CanonicalBytes` rather than
//! `&[u8]` means every digest in this crate is computed over JCS output;
//! two logically equal preimages always hash the same.

use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 digest of canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Lowercase hex, the form evidence hashes and Merkle leaves use.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

pub fn sha256_digest(canonical: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    ContentDigest(hasher.finalize().into())
}
