//! # Cryptographic Error Types
//!
//! Structured errors for Merkle operations in `sovpool-crypto`.

use thiserror::Error;

/// Errors from Merkle tree construction and proof building.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A hash input was not 64 hex characters.
    #[error("invalid {context}: \"{value}\" (expected 64 hex characters)")]
    InvalidHex {
        /// What the value was supposed to be.
        context: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A Merkle root was requested over zero leaves.
    #[error("cannot compute a Merkle root over an empty leaf sequence")]
    EmptyTree,

    /// Proof requested for a leaf that does not exist.
    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of leaves in the tree.
        leaf_count: usize,
    },
}
