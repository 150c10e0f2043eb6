//! # Signature
//!
//! One citizen's support expression. A `Signature` is assembled only from
//! already-validated parts and has no setters; once admitted to a pool it
//! is never modified.

use serde::{Deserialize, Serialize};

use crate::assurance::AssuranceLevel;
use crate::evidence::EvidenceHash;
use crate::identity::{ContentId, SignatureId, VoterId};
use crate::temporal::Timestamp;

/// An immutable, validated signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    identifier: SignatureId,
    voter_identifier: VoterId,
    target_content_identifier: ContentId,
    assurance_level_at_signing: AssuranceLevel,
    cryptographic_evidence_hash: EvidenceHash,
    signed_at: Timestamp,
}

impl Signature {
    /// Assemble a signature from validated parts.
    pub fn new(
        identifier: SignatureId,
        voter_identifier: VoterId,
        target_content_identifier: ContentId,
        assurance_level_at_signing: AssuranceLevel,
        cryptographic_evidence_hash: EvidenceHash,
        signed_at: Timestamp,
    ) -> Self {
        Self {
            identifier,
            voter_identifier,
            target_content_identifier,
            assurance_level_at_signing,
            cryptographic_evidence_hash,
            signed_at,
        }
    }

    pub fn identifier(&self) -> SignatureId {
        self.identifier
    }

    pub fn voter_identifier(&self) -> VoterId {
        self.voter_identifier
    }

    pub fn target_content_identifier(&self) -> ContentId {
        self.target_content_identifier
    }

    pub fn assurance_level_at_signing(&self) -> AssuranceLevel {
        self.assurance_level_at_signing
    }

    pub fn cryptographic_evidence_hash(&self) -> &EvidenceHash {
        &self.cryptographic_evidence_hash
    }

    pub fn signed_at(&self) -> Timestamp {
        self.signed_at
    }
}
