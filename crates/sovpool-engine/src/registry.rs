//! # Regional Pool Registry
//!
//! The single writer for every pool. Each pool sits behind its own
//! `parking_lot::Mutex`; the index from id and slug to pool sits behind a
//! `RwLock` that is only write-locked when a region's first signature
//! creates its pool. Pools of different regions never contend.
//!
//! ## Admission
//!
//! Structural validation runs without any lock. Status check, duplicate
//! check, weight accumulation, leaf append and the capacity-triggered
//! `OPEN → SEALING` transition all happen under one acquisition of the
//! pool mutex, so readers never see a partial update.
//!
//! ## Anchoring
//!
//! ```text
//! lock: claim anchor slot, copy leaves     (pool stays SEALING)
//! compute root                             (no lock)
//! publish with bounded backoff             (no lock, may suspend)
//! lock: ANCHORED | CORRUPTED | escalate
//! ```
//!
//! No lock guard is held across an `.await`. Each ledger call is bounded by
//! `anchor_retry.attempt_timeout_ms`. The anchor slot is held by an
//! [`AnchorClaim`]; if the anchoring future is dropped before it settles,
//! the claim escalates the pool so `retry_anchor` can pick it up.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use sovpool_core::{CorrelationId, EvidenceHash, PoolId, RegionalSlug, SignatureId};
use sovpool_crypto::{build_inclusion_proof, InclusionProof, MerkleRoot};
use sovpool_state::{PoolRecord, PoolSnapshot, PoolStatus, RegionalPool};

use crate::alert::{Alert, AlertSink};
use crate::anchor::{AnchorConfirmation, AnchorError, AnchorPublisher, AnchorRequest};
use crate::config::PoolingConfig;
use crate::error::PoolingError;
use crate::ingest::{SignatureIngestionGate, SignatureSubmission};
use crate::retry::retry_with_backoff;
use crate::sealer::MerkleSealer;
use crate::weight::MeritWeightCalculator;

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReceipt {
    pub signature_identifier: SignatureId,
    pub pool_identifier: PoolId,
    pub weight: u64,
    pub total_weight_in_group: u64,
    /// This admission filled the pool and moved it to `SEALING`.
    pub sealing_triggered: bool,
}

/// Outcome of re-deriving an anchored pool's root from its stored leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub pool_identifier: PoolId,
    pub regional_slug: RegionalSlug,
    pub anchored_root: String,
    pub recomputed_root: String,
    pub leaf_count: usize,
    pub consistent: bool,
}

type PoolHandle = Arc<Mutex<RegionalPool>>;

#[derive(Default)]
struct PoolIndex {
    by_id: HashMap<PoolId, PoolHandle>,
    by_slug: HashMap<RegionalSlug, PoolId>,
}

/// Owner and sole writer of all regional pools.
pub struct RegionalPoolRegistry<P> {
    config: PoolingConfig,
    gate: SignatureIngestionGate,
    sealer: MerkleSealer,
    weights: MeritWeightCalculator,
    publisher: Arc<P>,
    alerts: Arc<dyn AlertSink>,
    index: RwLock<PoolIndex>,
}

impl<P> std::fmt::Debug for RegionalPoolRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionalPoolRegistry")
            .field("config", &self.config)
            .field("pools", &self.index.read().by_id.len())
            .finish()
    }
}

impl<P: AnchorPublisher> RegionalPoolRegistry<P> {
    pub fn new(config: PoolingConfig, publisher: Arc<P>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            config,
            gate: SignatureIngestionGate::new(),
            sealer: MerkleSealer,
            weights: MeritWeightCalculator,
            publisher,
            alerts,
            index: RwLock::new(PoolIndex::default()),
        }
    }

    pub fn config(&self) -> &PoolingConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Arc<P> {
        &self.publisher
    }

    // ── Lookup ───────────────────────────────────────────────────────

    fn handle(&self, pool_id: &PoolId) -> Result<PoolHandle, PoolingError> {
        self.index
            .read()
            .by_id
            .get(pool_id)
            .cloned()
            .ok_or_else(|| PoolingError::PoolNotFound(pool_id.to_string()))
    }

    fn handle_for_slug_or_open(&self, slug: &RegionalSlug) -> PoolHandle {
        if let Some(handle) = self.lookup_slug(slug) {
            return handle;
        }
        let mut index = self.index.write();
        if let Some(id) = index.by_slug.get(slug).copied() {
            if let Some(handle) = index.by_id.get(&id) {
                return handle.clone();
            }
        }
        let pool = RegionalPool::open(slug.clone());
        let pool_id = pool.pool_identifier();
        let handle = Arc::new(Mutex::new(pool));
        index.by_slug.insert(slug.clone(), pool_id);
        index.by_id.insert(pool_id, handle.clone());
        tracing::info!(pool_id = %pool_id, regional_slug = %slug, "opened regional pool");
        handle
    }

    fn lookup_slug(&self, slug: &RegionalSlug) -> Option<PoolHandle> {
        let index = self.index.read();
        let id = index.by_slug.get(slug)?;
        index.by_id.get(id).cloned()
    }

    /// Consistent snapshot of one pool.
    pub fn snapshot(&self, pool_id: &PoolId) -> Result<PoolSnapshot, PoolingError> {
        Ok(self.handle(pool_id)?.lock().snapshot())
    }

    /// Snapshot of the pool for a region/cycle slug.
    pub fn snapshot_by_slug(&self, slug: &RegionalSlug) -> Result<PoolSnapshot, PoolingError> {
        self.lookup_slug(slug)
            .map(|h| h.lock().snapshot())
            .ok_or_else(|| PoolingError::PoolNotFound(slug.to_string()))
    }

    /// Snapshots of every pool, oldest first.
    pub fn list(&self) -> Vec<PoolSnapshot> {
        let handles: Vec<PoolHandle> = self.index.read().by_id.values().cloned().collect();
        let mut snapshots: Vec<PoolSnapshot> = handles.iter().map(|h| h.lock().snapshot()).collect();
        snapshots.sort_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.regional_slug.cmp(&b.regional_slug))
        });
        snapshots
    }

    /// Durable record of one pool.
    pub fn record(&self, pool_id: &PoolId) -> Result<PoolRecord, PoolingError> {
        Ok(self.handle(pool_id)?.lock().to_record())
    }

    // ── Admission ────────────────────────────────────────────────────

    /// Validate and admit one signature.
    pub fn submit(&self, raw: &SignatureSubmission) -> Result<AdmissionReceipt, PoolingError> {
        let result = self.submit_inner(raw);
        match &result {
            Ok(receipt) => {
                metrics::counter!("sovpool_signatures_admitted_total").increment(1);
                if receipt.sealing_triggered {
                    metrics::counter!("sovpool_pools_sealed_total").increment(1);
                }
            }
            Err(e) => {
                metrics::counter!("sovpool_signatures_rejected_total", "reason" => e.kind())
                    .increment(1);
                tracing::info!(
                    regional_slug = %raw.regional_slug,
                    correlation_id = %raw.correlation_identifier,
                    reason = e.kind(),
                    "signature rejected: {e}"
                );
            }
        }
        result
    }

    fn submit_inner(&self, raw: &SignatureSubmission) -> Result<AdmissionReceipt, PoolingError> {
        let validated = self.gate.validate(raw)?;
        let handle = self.handle_for_slug_or_open(&validated.regional_slug);

        let mut pool = handle.lock();
        let admission = self.gate.evaluate(&validated, &pool)?;
        let signature_identifier = admission.signature.identifier();
        pool.admit(admission.signature, admission.weight)?;

        let sealing_triggered = pool.signature_count() >= self.config.max_signatures_per_pool;
        if sealing_triggered {
            pool.begin_sealing("capacity reached")?;
        }

        tracing::info!(
            pool_id = %pool.pool_identifier(),
            regional_slug = %pool.regional_slug(),
            correlation_id = %validated.correlation_id,
            weight = admission.weight,
            total_weight = pool.total_weight_in_group(),
            sealing_triggered,
            "signature admitted"
        );

        Ok(AdmissionReceipt {
            signature_identifier,
            pool_identifier: pool.pool_identifier(),
            weight: admission.weight,
            total_weight_in_group: pool.total_weight_in_group(),
            sealing_triggered,
        })
    }

    // ── Sealing and anchoring ────────────────────────────────────────

    /// Explicit closure: `OPEN → SEALING`. Fails on an empty pool.
    pub fn seal(&self, pool_id: &PoolId) -> Result<PoolSnapshot, PoolingError> {
        let handle = self.handle(pool_id)?;
        let mut pool = handle.lock();
        pool.begin_sealing("explicit seal command")?;
        metrics::counter!("sovpool_pools_sealed_total").increment(1);
        tracing::info!(
            pool_id = %pool_id,
            regional_slug = %pool.regional_slug(),
            signatures = pool.signature_count(),
            "pool sealed"
        );
        Ok(pool.snapshot())
    }

    /// Seal an open pool and anchor it, returning the final snapshot.
    pub async fn seal_and_anchor(
        &self,
        pool_id: &PoolId,
        correlation_id: CorrelationId,
    ) -> Result<PoolSnapshot, PoolingError> {
        self.seal(pool_id)?;
        self.anchor(pool_id, correlation_id).await
    }

    /// Operator retry for an escalated `SEALING` pool.
    pub async fn retry_anchor(
        &self,
        pool_id: &PoolId,
        correlation_id: CorrelationId,
    ) -> Result<PoolSnapshot, PoolingError> {
        tracing::info!(pool_id = %pool_id, correlation_id = %correlation_id, "operator retry of anchoring");
        self.anchor(pool_id, correlation_id).await
    }

    /// Compute the root of a `SEALING` pool, publish it, and settle the
    /// pool as `ANCHORED` or `CORRUPTED`.
    ///
    /// # Errors
    ///
    /// - `AnchorInFlight` if another call is anchoring this pool.
    /// - `InvalidTransition` if the pool is not `SEALING`.
    /// - `AnchoringTransient` after `max_attempts` failures; the pool stays
    ///   `SEALING`, is flagged escalated, and an alert is raised.
    /// - `IntegrityCorruption` if the ledger's root or count differs; the
    ///   pool becomes `CORRUPTED` and an alert is raised.
    pub async fn anchor(
        &self,
        pool_id: &PoolId,
        correlation_id: CorrelationId,
    ) -> Result<PoolSnapshot, PoolingError> {
        let handle = self.handle(pool_id)?;
        let (slug, leaves) = {
            let mut pool = handle.lock();
            pool.begin_anchor_attempt()?;
            (pool.regional_slug().clone(), pool.leaf_hashes())
        };
        let claim = AnchorClaim {
            handle,
            alerts: Arc::clone(&self.alerts),
            pool_id: *pool_id,
            regional_slug: slug.clone(),
            correlation_id,
            settled: false,
        };
        let span = tracing::info_span!(
            "anchor",
            pool_id = %pool_id,
            regional_slug = %slug,
            correlation_id = %correlation_id
        );
        self.anchor_claimed(claim, leaves).instrument(span).await
    }

    async fn anchor_claimed(
        &self,
        mut claim: AnchorClaim,
        leaves: Vec<String>,
    ) -> Result<PoolSnapshot, PoolingError> {
        let pool_id = claim.pool_id;
        let slug = claim.regional_slug.clone();
        let correlation_id = claim.correlation_id;
        let handle = Arc::clone(&claim.handle);

        let local = match self.sealer.seal(pool_id, &leaves) {
            Ok(root) => root,
            Err(e) => {
                handle.lock().escalate();
                claim.settled = true;
                tracing::error!("sealer failed on a SEALING pool: {e}");
                return Err(e);
            }
        };

        let request = AnchorRequest {
            pool_identifier: pool_id,
            regional_slug: slug.clone(),
            correlation_identifier: correlation_id,
            leaf_hashes: leaves,
        };
        let publisher: &P = &self.publisher;
        let request_ref = &request;
        let attempt_timeout = self.config.anchor_retry.attempt_timeout();
        let outcome = retry_with_backoff(&self.config.anchor_retry, move |attempt| {
            metrics::counter!("sovpool_anchor_attempts_total").increment(1);
            tracing::debug!(attempt, "publishing root to ledger");
            async move {
                match tokio::time::timeout(attempt_timeout, publisher.publish(request_ref)).await {
                    Ok(result) => result,
                    Err(_) => Err(AnchorError::Timeout {
                        after_ms: attempt_timeout.as_millis() as u64,
                    }),
                }
            }
        })
        .await;

        let confirmation = match outcome {
            Ok(confirmation) => confirmation,
            Err(exhausted) => {
                let snapshot = {
                    let mut pool = handle.lock();
                    pool.escalate();
                    pool.snapshot()
                };
                claim.settled = true;
                let last_error = exhausted.last_error.to_string();
                tracing::error!(
                    attempts = exhausted.attempts,
                    signatures = snapshot.signature_count,
                    "anchoring exhausted retries, escalating pool for operator review: {last_error}"
                );
                self.alerts.raise(Alert::AnchoringEscalated {
                    pool_id,
                    regional_slug: slug,
                    correlation_id,
                    attempts: exhausted.attempts,
                    last_error: last_error.clone(),
                });
                return Err(PoolingError::AnchoringTransient {
                    pool_id,
                    attempts: exhausted.attempts,
                    last_error,
                });
            }
        };

        if confirms(&local, &confirmation) {
            let snapshot = {
                let mut pool = handle.lock();
                pool.mark_anchored(
                    local.root.clone(),
                    &format!("ledger confirmed at {}", confirmation.block_timestamp),
                )?;
                pool.snapshot()
            };
            claim.settled = true;
            metrics::counter!("sovpool_pools_anchored_total").increment(1);
            tracing::info!(
                merkle_root = %local.root,
                signatures = local.leaf_count,
                block_timestamp = %confirmation.block_timestamp,
                "pool anchored"
            );
            return Ok(snapshot);
        }

        let detail = format!(
            "local root {} over {} leaves, ledger stored {} over {} leaves",
            local.root,
            local.leaf_count,
            confirmation.merkle_root,
            confirmation.total_signature_count
        );
        handle.lock().mark_corrupted(&detail)?;
        claim.settled = true;
        metrics::counter!("sovpool_pools_corrupted_total").increment(1);
        tracing::error!("ledger commitment mismatch, pool marked CORRUPTED: {detail}");
        self.alerts.raise(Alert::IntegrityCorruption {
            pool_id,
            regional_slug: slug,
            correlation_id,
            local_root: local.root,
            local_count: local.leaf_count,
            ledger_root: confirmation.merkle_root,
            ledger_count: confirmation.total_signature_count,
        });
        Err(PoolingError::IntegrityCorruption { pool_id, detail })
    }

    // ── Verification ─────────────────────────────────────────────────

    /// Recompute the root of an `ANCHORED` pool from its stored leaf order.
    /// A mismatch raises an alert; the terminal status is left unchanged.
    pub fn audit(&self, pool_id: &PoolId) -> Result<AuditReport, PoolingError> {
        let (slug, anchored_root, leaves) = {
            let handle = self.handle(pool_id)?;
            let pool = handle.lock();
            let anchored = match (pool.status(), pool.merkle_root_anchor()) {
                (PoolStatus::Anchored, Some(root)) => root.to_string(),
                (status, _) => {
                    return Err(PoolingError::NotAnchored {
                        pool_id: *pool_id,
                        status,
                    })
                }
            };
            (pool.regional_slug().clone(), anchored, pool.leaf_hashes())
        };

        let recomputed = self.sealer.seal(*pool_id, &leaves)?;
        let consistent = recomputed.root == anchored_root;
        if !consistent {
            tracing::error!(
                pool_id = %pool_id,
                regional_slug = %slug,
                anchored_root = %anchored_root,
                recomputed_root = %recomputed.root,
                "audit could not reproduce anchored root"
            );
            self.alerts.raise(Alert::AuditMismatch {
                pool_id: *pool_id,
                regional_slug: slug.clone(),
                anchored_root: anchored_root.clone(),
                recomputed_root: recomputed.root.clone(),
            });
        }
        Ok(AuditReport {
            pool_identifier: *pool_id,
            regional_slug: slug,
            anchored_root,
            recomputed_root: recomputed.root,
            leaf_count: recomputed.leaf_count,
            consistent,
        })
    }

    /// Inclusion proof of `evidence` in an `ANCHORED` pool.
    pub fn inclusion_proof(
        &self,
        pool_id: &PoolId,
        evidence: &EvidenceHash,
    ) -> Result<InclusionProof, PoolingError> {
        let leaves = {
            let handle = self.handle(pool_id)?;
            let pool = handle.lock();
            if pool.status() != PoolStatus::Anchored {
                return Err(PoolingError::NotAnchored {
                    pool_id: *pool_id,
                    status: pool.status(),
                });
            }
            pool.leaf_hashes()
        };
        let index = leaves
            .iter()
            .position(|leaf| leaf == evidence.as_str())
            .ok_or_else(|| PoolingError::EvidenceNotFound {
                pool_id: *pool_id,
                evidence: evidence.clone(),
            })?;
        build_inclusion_proof(&leaves, index).map_err(|e| PoolingError::IntegrityCorruption {
            pool_id: *pool_id,
            detail: e.to_string(),
        })
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Records of every pool, for durable storage.
    pub fn export_records(&self) -> Vec<PoolRecord> {
        let handles: Vec<PoolHandle> = self.index.read().by_id.values().cloned().collect();
        handles.iter().map(|h| h.lock().to_record()).collect()
    }

    /// Rebuild pools from stored records after a restart.
    ///
    /// Every member's weight is recomputed from its assurance level and
    /// must match what was stored. Records are all validated before any is
    /// installed, so a bad batch leaves the registry untouched.
    pub fn hydrate(&self, records: Vec<PoolRecord>) -> Result<usize, PoolingError> {
        let mut rebuilt = Vec::with_capacity(records.len());
        for record in records {
            let pool_id = record.pool_identifier;
            for member in &record.signatures {
                let expected = self
                    .weights
                    .weight(member.signature.assurance_level_at_signing());
                if member.weight != expected {
                    return Err(PoolingError::IntegrityCorruption {
                        pool_id,
                        detail: format!(
                            "signature {} stored weight {} but {} weighs {}",
                            member.signature.identifier(),
                            member.weight,
                            member.signature.assurance_level_at_signing(),
                            expected
                        ),
                    });
                }
            }
            rebuilt.push(RegionalPool::from_record(record)?);
        }

        let mut index = self.index.write();
        for pool in &rebuilt {
            let id = pool.pool_identifier();
            let clash = index.by_id.contains_key(&id)
                || index.by_slug.contains_key(pool.regional_slug())
                || rebuilt
                    .iter()
                    .filter(|p| p.regional_slug() == pool.regional_slug() || p.pool_identifier() == id)
                    .count()
                    > 1;
            if clash {
                return Err(PoolingError::IntegrityCorruption {
                    pool_id: id,
                    detail: format!("pool or slug {} already present", pool.regional_slug()),
                });
            }
        }
        let count = rebuilt.len();
        for pool in rebuilt {
            let id = pool.pool_identifier();
            index.by_slug.insert(pool.regional_slug().clone(), id);
            index.by_id.insert(id, Arc::new(Mutex::new(pool)));
        }
        tracing::info!(pools = count, "registry hydrated from stored records");
        Ok(count)
    }

    /// Pools left in `SEALING` without an anchor in flight, e.g. after a
    /// restart or an escalation. Candidates for [`Self::retry_anchor`].
    pub fn pending_anchors(&self) -> Vec<PoolId> {
        let handles: Vec<PoolHandle> = self.index.read().by_id.values().cloned().collect();
        handles
            .iter()
            .filter_map(|h| {
                let pool = h.lock();
                (pool.status() == PoolStatus::Sealing && !pool.is_anchor_in_flight())
                    .then(|| pool.pool_identifier())
            })
            .collect()
    }
}

/// Ownership of a pool's anchor slot for the lifetime of one `anchor` call.
///
/// Every settling path sets `settled`. Dropping an unsettled claim (the
/// caller's future was cancelled or timed out) escalates the pool instead
/// of leaving the slot taken.
struct AnchorClaim {
    handle: PoolHandle,
    alerts: Arc<dyn AlertSink>,
    pool_id: PoolId,
    regional_slug: RegionalSlug,
    correlation_id: CorrelationId,
    settled: bool,
}

impl Drop for AnchorClaim {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.handle.lock().escalate();
        tracing::error!(
            pool_id = %self.pool_id,
            regional_slug = %self.regional_slug,
            correlation_id = %self.correlation_id,
            "anchoring abandoned before settling, pool escalated"
        );
        self.alerts.raise(Alert::AnchoringAbandoned {
            pool_id: self.pool_id,
            regional_slug: self.regional_slug.clone(),
            correlation_id: self.correlation_id,
        });
    }
}

fn confirms(local: &MerkleRoot, confirmation: &AnchorConfirmation) -> bool {
    local.root.eq_ignore_ascii_case(confirmation.merkle_root.trim())
        && local.leaf_count == confirmation.total_signature_count
}
