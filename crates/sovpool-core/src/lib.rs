//! # sovpool-core — Foundational Types for Signature Pooling
//!
//! This crate is the leaf of the workspace. It defines the value objects
//! that every other crate passes around: validated identifiers, evidence
//! hashes, identity assurance levels, the immutable [`Signature`] record,
//! canonical bytes for digest computation, and UTC timestamps.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `VoterId`, `ContentId`,
//!    `PoolId`, `RegionalSlug`, `EvidenceHash`: each has a private inner
//!    field and is constructed only through a validating factory. Serde
//!    deserialization goes through the same validation.
//!
//! 2. **`CanonicalBytes` newtype.** Evidence hashes are derived from
//!    canonical (JCS) bytes, never from ad-hoc string concatenation, so
//!    third parties can recompute them in any language.
//!
//! 3. **Closed assurance enum.** `AssuranceLevel` has exactly three
//!    variants. Unknown labels are a validation error, never a default.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sovpool-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod assurance;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod evidence;
pub mod identity;
pub mod signature;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use assurance::AssuranceLevel;
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use evidence::{EvidenceHash, EvidenceNonce};
pub use identity::{ContentId, CorrelationId, PoolId, RegionalSlug, SignatureId, VoterId};
pub use signature::Signature;
pub use temporal::Timestamp;
