//! # Ledger Anchoring
//!
//! [`AnchorPublisher`] is the seam to the immutable ledger that stores
//! sealed roots. The ledger's consensus is opaque here: a publisher takes
//! the ordered leaves and a correlation id and either confirms what it
//! recorded or fails.
//!
//! ## Security Invariant
//!
//! Implementations must only return `Ok` once the commitment is durably
//! recorded, and must report the root and leaf count the ledger actually
//! stored, not echo back the caller's expectation. The registry compares
//! both against its own computation and marks the pool `CORRUPTED` on any
//! disagreement.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sovpool_core::{CorrelationId, PoolId, RegionalSlug, Timestamp};
use sovpool_crypto::merkle_root;

/// Failures reported by a publisher. All of them are treated as transient
/// by the registry and retried with backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// The ledger endpoint could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger did not answer in time.
    #[error("ledger call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The ledger refused the commitment.
    #[error("ledger rejected commitment: {0}")]
    Rejected(String),
}

/// What is sent to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRequest {
    pub pool_identifier: PoolId,
    pub regional_slug: RegionalSlug,
    pub correlation_identifier: CorrelationId,
    /// Evidence hashes in admission order.
    pub leaf_hashes: Vec<String>,
}

/// What the ledger says it stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorConfirmation {
    pub merkle_root: String,
    pub total_signature_count: usize,
    pub block_timestamp: Timestamp,
}

/// Publishes sealed leaf sets to an immutable ledger.
pub trait AnchorPublisher: Send + Sync + 'static {
    /// Anchor `request.leaf_hashes` and report the stored commitment.
    fn publish(
        &self,
        request: &AnchorRequest,
    ) -> impl Future<Output = Result<AnchorConfirmation, AnchorError>> + Send;
}

/// In-process ledger stand-in.
///
/// Computes the root with the canonical tree and keeps the first
/// confirmation per pool, as an append-only ledger would: publishing a
/// different leaf set for an already-anchored pool returns the original
/// commitment.
#[derive(Debug)]
pub struct LocalLedger {
    next_block: AtomicU64,
    entries: Mutex<HashMap<PoolId, AnchorConfirmation>>,
}

impl LocalLedger {
    pub fn new() -> Self {
        Self {
            next_block: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The commitment stored for `pool_id`, if any.
    pub fn stored(&self, pool_id: &PoolId) -> Option<AnchorConfirmation> {
        self.entries.lock().get(pool_id).cloned()
    }

    /// Height of the most recently written block (0 before any write).
    pub fn height(&self) -> u64 {
        self.next_block.load(Ordering::SeqCst) - 1
    }
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorPublisher for LocalLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        let root =
            merkle_root(&request.leaf_hashes).map_err(|e| AnchorError::Rejected(e.to_string()))?;
        let confirmation = {
            let mut entries = self.entries.lock();
            entries
                .entry(request.pool_identifier)
                .or_insert_with(|| {
                    self.next_block.fetch_add(1, Ordering::SeqCst);
                    AnchorConfirmation {
                        merkle_root: root.root,
                        total_signature_count: root.leaf_count,
                        block_timestamp: Timestamp::now(),
                    }
                })
                .clone()
        };
        tracing::debug!(
            pool_id = %request.pool_identifier,
            correlation_id = %request.correlation_identifier,
            merkle_root = %confirmation.merkle_root,
            "local ledger recorded commitment"
        );
        Ok(confirmation)
    }
}
