//! # Cryptographic Evidence
//!
//! A signature's evidence hash binds a voter to a target content under a
//! one-time nonce. The hash is what enters the Merkle tree, so the raw
//! voter identifier is never published alongside the anchored root.
//!
//! Derivation: `SHA-256(JCS({"nonce", "targetContentIdentifier",
//! "voterIdentifier"}))`, all values as lowercase strings.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalBytes;
use crate::digest::sha256_digest;
use crate::error::{CanonicalizationError, ValidationError};
use crate::identity::{ContentId, VoterId};

const NONCE_BYTES: usize = 16;

fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

/// A 64-hex-character SHA-256 evidence digest, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvidenceHash(String);

impl EvidenceHash {
    /// Validate a submitted hash. Upper-case hex is accepted and normalised.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidEvidenceHash`] unless the input is exactly
    /// 64 hex characters.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.len() != 64 || !is_hex(value) {
            return Err(ValidationError::InvalidEvidenceHash(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Derive the evidence hash for a voter, content and nonce.
    pub fn derive(
        voter: &VoterId,
        content: &ContentId,
        nonce: &EvidenceNonce,
    ) -> Result<Self, CanonicalizationError> {
        let preimage = serde_json::json!({
            "voterIdentifier": voter.to_string(),
            "targetContentIdentifier": content.to_string(),
            "nonce": nonce.as_str(),
        });
        let canonical = CanonicalBytes::new(&preimage)?;
        Ok(Self(sha256_digest(&canonical).to_hex()))
    }

    /// The lowercase hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EvidenceHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EvidenceHash {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvidenceHash> for String {
    fn from(hash: EvidenceHash) -> String {
        hash.0
    }
}

/// A one-time hex nonce mixed into the evidence preimage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvidenceNonce(String);

impl EvidenceNonce {
    /// Generate a fresh nonce of 16 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Accept a caller-supplied nonce of 16 to 64 bytes in hex.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let len = value.len();
        if !(32..=128).contains(&len) || len % 2 != 0 || !is_hex(value) {
            return Err(ValidationError::InvalidNonce(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// The lowercase hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EvidenceNonce {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvidenceNonce> for String {
    fn from(nonce: EvidenceNonce) -> String {
        nonce.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter() -> VoterId {
        VoterId::parse("6f1c2a8e-4b7d-4e55-9a51-0c3f5d2e9b10").unwrap()
    }

    fn content() -> ContentId {
        ContentId::parse("0d9e6b3a-1f2c-4a7e-8b5d-2c4e6f8a0b1c").unwrap()
    }

    #[test]
    fn parse_normalises_to_lowercase() {
        let upper = "AB".repeat(32);
        let hash = EvidenceHash::parse(&upper).unwrap();
        assert_eq!(hash.as_str(), "ab".repeat(32));
    }

    #[test]
    fn parse_rejects_wrong_length_and_charset() {
        assert!(EvidenceHash::parse(&"a".repeat(63)).is_err());
        assert!(EvidenceHash::parse(&"a".repeat(65)).is_err());
        assert!(EvidenceHash::parse(&"g".repeat(64)).is_err());
        assert!(EvidenceHash::parse("").is_err());
    }

    #[test]
    fn derive_is_deterministic_for_same_inputs() {
        let nonce = EvidenceNonce::parse(&"01".repeat(16)).unwrap();
        let a = EvidenceHash::derive(&voter(), &content(), &nonce).unwrap();
        let b = EvidenceHash::derive(&voter(), &content(), &nonce).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn derive_depends_on_nonce() {
        let a = EvidenceHash::derive(&voter(), &content(), &EvidenceNonce::generate()).unwrap();
        let b = EvidenceHash::derive(&voter(), &content(), &EvidenceNonce::generate()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn derive_matches_manual_canonical_preimage() {
        let nonce = EvidenceNonce::parse(&"ab".repeat(16)).unwrap();
        let expected = {
            let preimage = format!(
                r#"{{"nonce":"{}","targetContentIdentifier":"{}","voterIdentifier":"{}"}}"#,
                nonce.as_str(),
                content(),
                voter()
            );
            use sha2::{Digest, Sha256};
            Sha256::digest(preimage.as_bytes())
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<String>()
        };
        let derived = EvidenceHash::derive(&voter(), &content(), &nonce).unwrap();
        assert_eq!(derived.as_str(), expected);
    }

    #[test]
    fn nonce_bounds() {
        assert_eq!(EvidenceNonce::generate().as_str().len(), 32);
        assert!(EvidenceNonce::parse(&"a".repeat(30)).is_err());
        assert!(EvidenceNonce::parse(&"a".repeat(33)).is_err());
        assert!(EvidenceNonce::parse(&"a".repeat(130)).is_err());
        assert!(EvidenceNonce::parse(&"A".repeat(128)).is_ok());
    }
}
