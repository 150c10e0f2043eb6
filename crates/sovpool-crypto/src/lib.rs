//! # sovpool-crypto — Merkle Primitives for Signature Pooling
//!
//! Sealed pools commit to their ordered evidence hashes through a binary
//! Merkle tree. This crate owns the one canonical tree shape so that the
//! sealer, the local ledger, the audit path and the offline CLI verifier
//! all agree byte for byte.
//!
//! - Leaf: `SHA256(0x00 || evidence_bytes)`
//! - Node: `SHA256(0x01 || left || right)`
//! - Odd layers duplicate their last node before pairing.
//! - A root is always reported together with its leaf count.

pub mod error;
pub mod merkle;

pub use error::CryptoError;
pub use merkle::{
    build_inclusion_proof, merkle_root, verify_inclusion_proof, InclusionProof, MerkleRoot,
    PathStep, Side,
};
