//! # Pooling Error Taxonomy
//!
//! Synchronous rejections (`Validation`, `InvalidAssuranceLevel`,
//! `DuplicateSignature`, `PoolClosed`) go straight back to the submitter
//! and are never retried. `AnchoringTransient` is the only retryable
//! class. `IntegrityCorruption` is fatal and always accompanied by an
//! operator alert.

use thiserror::Error;

use sovpool_core::{EvidenceHash, PoolId, ValidationError};
use sovpool_state::{PoolStateError, PoolStatus};

/// Errors from the pooling engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolingError {
    /// Malformed submission payload.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// Assurance label outside the three known tiers.
    #[error("invalid assurance level: \"{0}\"")]
    InvalidAssuranceLevel(String),

    /// Same voter and content, or the same evidence, already in the pool.
    #[error("duplicate signature in pool {pool_id}: {reason}")]
    DuplicateSignature { pool_id: PoolId, reason: String },

    /// The target pool is past `OPEN`; resubmit to the next cycle.
    #[error("pool {pool_id} is {status} and closed to new signatures")]
    PoolClosed { pool_id: PoolId, status: PoolStatus },

    /// The ledger could not be reached after bounded retries.
    #[error("anchoring pool {pool_id} failed after {attempts} attempt(s): {last_error}")]
    AnchoringTransient {
        pool_id: PoolId,
        attempts: u32,
        last_error: String,
    },

    /// Local and ledger commitments disagree, or a record is inconsistent.
    #[error("integrity corruption in pool {pool_id}: {detail}")]
    IntegrityCorruption { pool_id: PoolId, detail: String },

    /// No pool with this identifier or slug.
    #[error("pool not found: {0}")]
    PoolNotFound(String),

    /// Sealing requested with zero leaves.
    #[error("pool {pool_id} is empty and cannot be sealed")]
    EmptyPool { pool_id: PoolId },

    /// Lifecycle edge not allowed from the current status.
    #[error("pool {pool_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        pool_id: PoolId,
        from: PoolStatus,
        to: PoolStatus,
    },

    /// Another anchoring attempt for this pool is still running.
    #[error("pool {pool_id} already has an anchoring attempt in flight")]
    AnchorInFlight { pool_id: PoolId },

    /// Operation needs an `ANCHORED` pool.
    #[error("pool {pool_id} is {status}, not ANCHORED")]
    NotAnchored { pool_id: PoolId, status: PoolStatus },

    /// Evidence hash is not a leaf of this pool.
    #[error("evidence {evidence} is not part of pool {pool_id}")]
    EvidenceNotFound {
        pool_id: PoolId,
        evidence: EvidenceHash,
    },
}

impl PoolingError {
    /// Only ledger unavailability is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AnchoringTransient { .. })
    }

    /// Stable label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidAssuranceLevel(_) => "invalid_assurance_level",
            Self::DuplicateSignature { .. } => "duplicate_signature",
            Self::PoolClosed { .. } => "pool_closed",
            Self::AnchoringTransient { .. } => "anchoring_transient",
            Self::IntegrityCorruption { .. } => "integrity_corruption",
            Self::PoolNotFound(_) => "pool_not_found",
            Self::EmptyPool { .. } => "empty_pool",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AnchorInFlight { .. } => "anchor_in_flight",
            Self::NotAnchored { .. } => "not_anchored",
            Self::EvidenceNotFound { .. } => "evidence_not_found",
        }
    }
}

impl From<ValidationError> for PoolingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidAssuranceLevel(label) => Self::InvalidAssuranceLevel(label),
            other => Self::Validation(other),
        }
    }
}

impl From<PoolStateError> for PoolingError {
    fn from(err: PoolStateError) -> Self {
        match err {
            PoolStateError::InvalidTransition { pool_id, from, to } => {
                Self::InvalidTransition { pool_id, from, to }
            }
            PoolStateError::NotOpen { pool_id, status } => Self::PoolClosed { pool_id, status },
            PoolStateError::DuplicateMember {
                pool_id,
                voter,
                content,
            } => Self::DuplicateSignature {
                pool_id,
                reason: format!("voter {voter} already signed content {content}"),
            },
            PoolStateError::ReplayedEvidence { pool_id, evidence } => Self::DuplicateSignature {
                pool_id,
                reason: format!("evidence {evidence} was already admitted"),
            },
            PoolStateError::EmptyPool { pool_id } => Self::EmptyPool { pool_id },
            PoolStateError::AnchorInFlight { pool_id } => Self::AnchorInFlight { pool_id },
            PoolStateError::CorruptRecord { pool_id, reason } => Self::IntegrityCorruption {
                pool_id,
                detail: reason,
            },
        }
    }
}
