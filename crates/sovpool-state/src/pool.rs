//! # Regional Pool State Machine
//!
//! Runtime-checked lifecycle for one region/cycle pool. Every mutation
//! either succeeds completely or leaves the pool untouched, so a reader
//! holding the pool's lock always sees a consistent weight, member list
//! and status.
//!
//! ## Invariants
//!
//! - `total_weight_in_group == Σ member.weight` after every mutation.
//! - No two members share `(voter, content)`; no two members share an
//!   evidence hash.
//! - `merkle_root_anchor.is_some()` iff status is `ANCHORED`.
//! - Status only moves forward along the edges in
//!   [`PoolStatus::can_transition_to`].
//! - A pool enters `SEALING` only with at least one member.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sovpool_core::{ContentId, EvidenceHash, PoolId, RegionalSlug, Signature, Timestamp, VoterId};

// ── Pool Status ──────────────────────────────────────────────────────

/// Lifecycle status of a regional pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    /// Admitting signatures.
    Open,
    /// Closed to admissions; root being computed and anchored.
    Sealing,
    /// Root confirmed by the ledger. Terminal.
    Anchored,
    /// Ledger and local root disagree. Terminal, kept for forensics.
    Corrupted,
}

impl PoolStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Anchored | Self::Corrupted)
    }

    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Sealing => "SEALING",
            Self::Anchored => "ANCHORED",
            Self::Corrupted => "CORRUPTED",
        }
    }

    /// The allowed edges. No wildcard, so a new status forces a decision here.
    pub fn can_transition_to(&self, to: PoolStatus) -> bool {
        match self {
            Self::Open => matches!(to, Self::Sealing),
            Self::Sealing => matches!(to, Self::Anchored | Self::Corrupted),
            Self::Anchored | Self::Corrupted => false,
        }
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Error Types ──────────────────────────────────────────────────────

/// Errors from pool mutations. The pool is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolStateError {
    /// Attempted an edge that is not in the lifecycle graph.
    #[error("pool {pool_id}: invalid transition from {from} to {to}")]
    InvalidTransition {
        pool_id: PoolId,
        from: PoolStatus,
        to: PoolStatus,
    },

    /// Admission attempted while the pool is not `OPEN`.
    #[error("pool {pool_id} is {status} and no longer admits signatures")]
    NotOpen { pool_id: PoolId, status: PoolStatus },

    /// The voter already signed this content in this pool.
    #[error("pool {pool_id}: voter {voter} already signed content {content}")]
    DuplicateMember {
        pool_id: PoolId,
        voter: VoterId,
        content: ContentId,
    },

    /// The evidence hash was already admitted to this pool.
    #[error("pool {pool_id}: evidence {evidence} was already admitted")]
    ReplayedEvidence {
        pool_id: PoolId,
        evidence: EvidenceHash,
    },

    /// Sealing a pool with no members.
    #[error("pool {pool_id} has no signatures and cannot be sealed")]
    EmptyPool { pool_id: PoolId },

    /// Another task is already anchoring this pool.
    #[error("pool {pool_id} already has an anchoring attempt in flight")]
    AnchorInFlight { pool_id: PoolId },

    /// A persisted record violates a pool invariant.
    #[error("pool {pool_id}: corrupt record: {reason}")]
    CorruptRecord { pool_id: PoolId, reason: String },
}

// ── Records ──────────────────────────────────────────────────────────

/// One entry of the append-only transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTransitionRecord {
    pub from: PoolStatus,
    pub to: PoolStatus,
    pub timestamp: Timestamp,
    pub reason: String,
}

/// A signature together with the weight it contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedSignature {
    pub signature: Signature,
    pub weight: u64,
}

/// Read-only view of a pool for dashboards and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    pub pool_identifier: PoolId,
    pub regional_slug: RegionalSlug,
    pub current_status: PoolStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub merkle_root_anchor: Option<String>,
    pub total_weight_in_group: u64,
    pub signature_count: usize,
    pub escalated: bool,
    pub opened_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub closed_at: Option<Timestamp>,
}

/// Durable form of a pool. Member order is admission order and is the
/// Merkle leaf order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub pool_identifier: PoolId,
    pub regional_slug: RegionalSlug,
    pub current_status: PoolStatus,
    #[serde(default)]
    pub merkle_root_anchor: Option<String>,
    pub total_weight_in_group: u64,
    pub opened_at: Timestamp,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub escalated: bool,
    pub signatures: Vec<AcceptedSignature>,
    #[serde(default)]
    pub transitions: Vec<PoolTransitionRecord>,
}

// ── Regional Pool ────────────────────────────────────────────────────

/// The aggregation unit for one region/cycle.
#[derive(Debug, Clone)]
pub struct RegionalPool {
    pool_identifier: PoolId,
    regional_slug: RegionalSlug,
    status: PoolStatus,
    merkle_root_anchor: Option<String>,
    total_weight_in_group: u64,
    opened_at: Timestamp,
    closed_at: Option<Timestamp>,
    escalated: bool,
    anchor_in_flight: bool,
    members: Vec<AcceptedSignature>,
    voter_content: HashSet<(VoterId, ContentId)>,
    evidence: HashSet<EvidenceHash>,
    transitions: Vec<PoolTransitionRecord>,
}

impl RegionalPool {
    /// Open a fresh, empty pool for `regional_slug`.
    pub fn open(regional_slug: RegionalSlug) -> Self {
        Self::open_with_id(PoolId::new(), regional_slug, Timestamp::now())
    }

    /// Open a pool with a caller-chosen identifier and opening time.
    pub fn open_with_id(pool_identifier: PoolId, regional_slug: RegionalSlug, opened_at: Timestamp) -> Self {
        Self {
            pool_identifier,
            regional_slug,
            status: PoolStatus::Open,
            merkle_root_anchor: None,
            total_weight_in_group: 0,
            opened_at,
            closed_at: None,
            escalated: false,
            anchor_in_flight: false,
            members: Vec::new(),
            voter_content: HashSet::new(),
            evidence: HashSet::new(),
            transitions: Vec::new(),
        }
    }

    pub fn pool_identifier(&self) -> PoolId {
        self.pool_identifier
    }

    pub fn regional_slug(&self) -> &RegionalSlug {
        &self.regional_slug
    }

    pub fn status(&self) -> PoolStatus {
        self.status
    }

    pub fn merkle_root_anchor(&self) -> Option<&str> {
        self.merkle_root_anchor.as_deref()
    }

    pub fn total_weight_in_group(&self) -> u64 {
        self.total_weight_in_group
    }

    pub fn signature_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    pub fn is_anchor_in_flight(&self) -> bool {
        self.anchor_in_flight
    }

    /// Members in admission order.
    pub fn members(&self) -> &[AcceptedSignature] {
        &self.members
    }

    /// The append-only transition log.
    pub fn transitions(&self) -> &[PoolTransitionRecord] {
        &self.transitions
    }

    /// Whether `(voter, content)` already has a signature in this pool.
    pub fn has_signed(&self, voter: &VoterId, content: &ContentId) -> bool {
        self.voter_content.contains(&(*voter, *content))
    }

    /// Whether this evidence hash was already admitted.
    pub fn has_evidence(&self, evidence: &EvidenceHash) -> bool {
        self.evidence.contains(evidence)
    }

    /// Ordered evidence hashes: the Merkle leaves.
    pub fn leaf_hashes(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.signature.cryptographic_evidence_hash().as_str().to_string())
            .collect()
    }

    /// Consistent view for readers.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            pool_identifier: self.pool_identifier,
            regional_slug: self.regional_slug.clone(),
            current_status: self.status,
            merkle_root_anchor: self.merkle_root_anchor.clone(),
            total_weight_in_group: self.total_weight_in_group,
            signature_count: self.members.len(),
            escalated: self.escalated,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
        }
    }

    /// Append an accepted signature and its weight.
    ///
    /// Re-checks status and uniqueness so that the invariants hold even if
    /// the caller's earlier evaluation raced with another admission.
    pub fn admit(&mut self, signature: Signature, weight: u64) -> Result<(), PoolStateError> {
        if self.status != PoolStatus::Open {
            return Err(PoolStateError::NotOpen {
                pool_id: self.pool_identifier,
                status: self.status,
            });
        }
        let pair = (signature.voter_identifier(), signature.target_content_identifier());
        if self.voter_content.contains(&pair) {
            return Err(PoolStateError::DuplicateMember {
                pool_id: self.pool_identifier,
                voter: pair.0,
                content: pair.1,
            });
        }
        let evidence = signature.cryptographic_evidence_hash().clone();
        if self.evidence.contains(&evidence) {
            return Err(PoolStateError::ReplayedEvidence {
                pool_id: self.pool_identifier,
                evidence,
            });
        }

        self.voter_content.insert(pair);
        self.evidence.insert(evidence);
        self.total_weight_in_group += weight;
        self.members.push(AcceptedSignature { signature, weight });
        Ok(())
    }

    fn transition(&mut self, to: PoolStatus, reason: &str) -> Result<(), PoolStateError> {
        if !self.status.can_transition_to(to) {
            return Err(PoolStateError::InvalidTransition {
                pool_id: self.pool_identifier,
                from: self.status,
                to,
            });
        }
        self.transitions.push(PoolTransitionRecord {
            from: self.status,
            to,
            timestamp: Timestamp::now(),
            reason: reason.to_string(),
        });
        self.status = to;
        Ok(())
    }

    /// `OPEN → SEALING`. Fails on an empty pool.
    pub fn begin_sealing(&mut self, reason: &str) -> Result<(), PoolStateError> {
        if self.status == PoolStatus::Open && self.members.is_empty() {
            return Err(PoolStateError::EmptyPool {
                pool_id: self.pool_identifier,
            });
        }
        self.transition(PoolStatus::Sealing, reason)
    }

    /// `SEALING → ANCHORED`, recording the confirmed root.
    pub fn mark_anchored(&mut self, merkle_root: String, reason: &str) -> Result<(), PoolStateError> {
        self.transition(PoolStatus::Anchored, reason)?;
        self.merkle_root_anchor = Some(merkle_root);
        self.closed_at = Some(Timestamp::now());
        self.escalated = false;
        self.anchor_in_flight = false;
        Ok(())
    }

    /// `SEALING → CORRUPTED`. Members are preserved for investigation.
    pub fn mark_corrupted(&mut self, reason: &str) -> Result<(), PoolStateError> {
        self.transition(PoolStatus::Corrupted, reason)?;
        self.closed_at = Some(Timestamp::now());
        self.anchor_in_flight = false;
        Ok(())
    }

    /// Claim the single anchoring slot. Only a `SEALING` pool can be anchored.
    pub fn begin_anchor_attempt(&mut self) -> Result<(), PoolStateError> {
        if self.status != PoolStatus::Sealing {
            return Err(PoolStateError::InvalidTransition {
                pool_id: self.pool_identifier,
                from: self.status,
                to: PoolStatus::Anchored,
            });
        }
        if self.anchor_in_flight {
            return Err(PoolStateError::AnchorInFlight {
                pool_id: self.pool_identifier,
            });
        }
        self.anchor_in_flight = true;
        Ok(())
    }

    /// Release the anchoring slot after retries ran out, flagging the pool
    /// for operator review. The pool stays `SEALING`.
    pub fn escalate(&mut self) {
        self.anchor_in_flight = false;
        self.escalated = true;
    }

    /// Durable form of the pool.
    pub fn to_record(&self) -> PoolRecord {
        PoolRecord {
            pool_identifier: self.pool_identifier,
            regional_slug: self.regional_slug.clone(),
            current_status: self.status,
            merkle_root_anchor: self.merkle_root_anchor.clone(),
            total_weight_in_group: self.total_weight_in_group,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            escalated: self.escalated,
            signatures: self.members.clone(),
            transitions: self.transitions.clone(),
        }
    }

    /// Rebuild a pool from its record, re-deriving the duplicate indexes
    /// and re-checking every invariant. The stored total must equal the
    /// sum of stored member weights.
    pub fn from_record(record: PoolRecord) -> Result<Self, PoolStateError> {
        let pool_id = record.pool_identifier;
        let corrupt = |reason: String| PoolStateError::CorruptRecord { pool_id, reason };

        if record.merkle_root_anchor.is_some() != (record.current_status == PoolStatus::Anchored) {
            return Err(corrupt(format!(
                "merkleRootAnchor presence does not match status {}",
                record.current_status
            )));
        }
        if record.current_status != PoolStatus::Open && record.signatures.is_empty() {
            return Err(corrupt(format!(
                "{} pool has no signatures",
                record.current_status
            )));
        }

        let mut pool = Self::open_with_id(pool_id, record.regional_slug, record.opened_at);
        for member in record.signatures {
            pool.admit(member.signature, member.weight)
                .map_err(|e| corrupt(e.to_string()))?;
        }
        if pool.total_weight_in_group != record.total_weight_in_group {
            return Err(corrupt(format!(
                "stored totalWeightInGroup {} but members sum to {}",
                record.total_weight_in_group, pool.total_weight_in_group
            )));
        }

        pool.status = record.current_status;
        pool.merkle_root_anchor = record.merkle_root_anchor;
        pool.closed_at = record.closed_at;
        pool.escalated = record.escalated;
        pool.transitions = record.transitions;
        Ok(pool)
    }
}
