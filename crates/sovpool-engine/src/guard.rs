//! # Duplicate Guard
//!
//! Checks a candidate against the pool's existing members. The check reads
//! the pool the caller has locked, so it is part of the same critical
//! section as the weight update that follows it.

use sovpool_core::{ContentId, EvidenceHash, VoterId};
use sovpool_state::RegionalPool;

use crate::error::PoolingError;

/// Rejects a second `(voter, content)` signature or replayed evidence
/// within one pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateGuard;

impl DuplicateGuard {
    pub fn check(
        &self,
        pool: &RegionalPool,
        voter: &VoterId,
        content: &ContentId,
        evidence: &EvidenceHash,
    ) -> Result<(), PoolingError> {
        if pool.has_signed(voter, content) {
            return Err(PoolingError::DuplicateSignature {
                pool_id: pool.pool_identifier(),
                reason: format!("voter {voter} already signed content {content}"),
            });
        }
        if pool.has_evidence(evidence) {
            return Err(PoolingError::DuplicateSignature {
                pool_id: pool.pool_identifier(),
                reason: format!("evidence {evidence} was already admitted"),
            });
        }
        Ok(())
    }
}
