//! # Error Types
//!
//! Validation and canonicalization errors for the primitive types in this
//! crate. Built with `thiserror`; each variant carries the rejected input so
//! that operators can diagnose a bad payload without guesswork.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
///
/// Each identifier type enforces its format at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required identifier was empty.
    #[error("{field} must not be empty")]
    EmptyIdentifier {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Identifier is not a well-formed UUID.
    #[error("invalid {field}: \"{value}\" (expected a UUID)")]
    InvalidUuid {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The nil UUID is reserved and never identifies a real record.
    #[error("invalid {field}: the nil UUID is not a valid identifier")]
    NilUuid {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Evidence hash is not exactly 64 hexadecimal characters.
    #[error("invalid evidence hash: \"{0}\" (expected 64 hex characters)")]
    InvalidEvidenceHash(String),

    /// Nonce is not an even-length hex string of 16..=64 bytes.
    #[error("invalid nonce: \"{0}\" (expected 32-128 hex characters)")]
    InvalidNonce(String),

    /// Regional slug does not match `[a-z0-9]+(-[a-z0-9]+)*`, max 64 chars.
    #[error("invalid regional slug: \"{0}\" (expected lowercase alphanumeric segments joined by '-')")]
    InvalidRegionalSlug(String),

    /// Assurance level label is not one of the three known tiers.
    #[error("unknown assurance level: \"{0}\" (expected IAL1_UNVERIFIED, IAL2_VERIFIED or IAL3_SOVEREIGN)")]
    InvalidAssuranceLevel(String),

    /// Timestamp string is not valid ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
