//! # Signature Ingestion Gate
//!
//! Turns a raw submission into an admission decision in two steps:
//!
//! 1. [`SignatureIngestionGate::validate`] checks structure only: UUIDs,
//!    hash format, assurance label, timestamp, slug. It needs no pool.
//! 2. [`SignatureIngestionGate::evaluate`] runs against the target pool
//!    (status, duplicates) and computes the weight.
//!
//! Neither step mutates anything. The registry applies the returned
//! [`Admission`] to the pool while still holding the lock it evaluated
//! under.

use serde::{Deserialize, Serialize};

use sovpool_core::{
    AssuranceLevel, ContentId, CorrelationId, EvidenceHash, PoolId, RegionalSlug, Signature,
    SignatureId, Timestamp, VoterId,
};
use sovpool_state::{PoolStatus, RegionalPool};

use crate::error::PoolingError;
use crate::guard::DuplicateGuard;
use crate::weight::MeritWeightCalculator;

/// Raw submission as received at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSubmission {
    pub voter_identifier: String,
    pub target_content_identifier: String,
    pub assurance_level_at_signing: String,
    pub cryptographic_evidence_hash: String,
    pub signed_at: String,
    pub regional_slug: String,
    pub correlation_identifier: String,
}

/// A submission whose fields have all been parsed into domain types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub voter: VoterId,
    pub content: ContentId,
    pub assurance_level: AssuranceLevel,
    pub evidence: EvidenceHash,
    pub signed_at: Timestamp,
    pub regional_slug: RegionalSlug,
    pub correlation_id: CorrelationId,
}

/// The gate's decision: the signature to admit and its weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub pool_id: PoolId,
    pub signature: Signature,
    pub weight: u64,
}

/// Stateless validator for signature submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureIngestionGate {
    weights: MeritWeightCalculator,
    guard: DuplicateGuard,
}

impl SignatureIngestionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural validation. Fails on the first bad field.
    pub fn validate(&self, raw: &SignatureSubmission) -> Result<ValidatedSubmission, PoolingError> {
        Ok(ValidatedSubmission {
            voter: VoterId::parse(&raw.voter_identifier)?,
            content: ContentId::parse(&raw.target_content_identifier)?,
            assurance_level: raw.assurance_level_at_signing.parse()?,
            evidence: EvidenceHash::parse(&raw.cryptographic_evidence_hash)?,
            signed_at: Timestamp::parse(&raw.signed_at)?,
            regional_slug: RegionalSlug::new(raw.regional_slug.as_str())?,
            correlation_id: CorrelationId::parse(&raw.correlation_identifier)?,
        })
    }

    /// Decide admission against the current state of `pool`.
    pub fn evaluate(
        &self,
        submission: &ValidatedSubmission,
        pool: &RegionalPool,
    ) -> Result<Admission, PoolingError> {
        if pool.status() != PoolStatus::Open {
            return Err(PoolingError::PoolClosed {
                pool_id: pool.pool_identifier(),
                status: pool.status(),
            });
        }
        self.guard.check(
            pool,
            &submission.voter,
            &submission.content,
            &submission.evidence,
        )?;
        let weight = self.weights.weight(submission.assurance_level);
        let signature = Signature::new(
            SignatureId::new(),
            submission.voter,
            submission.content,
            submission.assurance_level,
            submission.evidence.clone(),
            submission.signed_at,
        );
        Ok(Admission {
            pool_id: pool.pool_identifier(),
            signature,
            weight,
        })
    }
}
