//! End-to-end pool lifecycle scenarios against the registry.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sovpool_core::{
    AssuranceLevel, ContentId, CorrelationId, EvidenceHash, EvidenceNonce, PoolId, RegionalSlug,
    VoterId,
};
use sovpool_crypto::{merkle_root, verify_inclusion_proof};
use sovpool_engine::{
    Alert, AnchorConfirmation, AnchorError, AnchorPublisher, AnchorRequest, CollectingAlertSink,
    LocalLedger, MerkleSealer, PoolingConfig, PoolingError, RegionalPoolRegistry, RetryPolicy,
    SignatureSubmission,
};
use sovpool_state::PoolStatus;

// ── Test ledgers ─────────────────────────────────────────────────────

/// Times out a fixed number of times, then behaves like a local ledger.
struct FlakyLedger {
    failures_left: AtomicU32,
    calls: AtomicU32,
    inner: LocalLedger,
}

impl FlakyLedger {
    fn failing(times: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            calls: AtomicU32::new(0),
            inner: LocalLedger::new(),
        }
    }
}

impl AnchorPublisher for FlakyLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AnchorError::Timeout { after_ms: 30_000 });
        }
        self.inner.publish(request).await
    }
}

/// Claims to have stored a different root.
struct ForgingLedger;

impl AnchorPublisher for ForgingLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        Ok(AnchorConfirmation {
            merkle_root: "ee".repeat(32),
            total_signature_count: request.leaf_hashes.len(),
            block_timestamp: sovpool_core::Timestamp::now(),
        })
    }
}

/// Reports one leaf fewer than it was sent, with the right root for that.
struct TruncatingLedger;

impl AnchorPublisher for TruncatingLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        let kept = &request.leaf_hashes[..request.leaf_hashes.len() - 1];
        let root = merkle_root(kept).map_err(|e| AnchorError::Rejected(e.to_string()))?;
        Ok(AnchorConfirmation {
            merkle_root: root.root,
            total_signature_count: root.leaf_count,
            block_timestamp: sovpool_core::Timestamp::now(),
        })
    }
}

/// Takes a while to answer.
struct SlowLedger(LocalLedger);

impl AnchorPublisher for SlowLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.0.publish(request).await
    }
}

/// Never answers its first call; later calls go to a local ledger.
struct HangOnceLedger {
    hung: AtomicBool,
    inner: LocalLedger,
}

impl HangOnceLedger {
    fn new() -> Self {
        Self {
            hung: AtomicBool::new(false),
            inner: LocalLedger::new(),
        }
    }
}

impl AnchorPublisher for HangOnceLedger {
    async fn publish(&self, request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        if !self.hung.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.publish(request).await
    }
}

/// Never answers.
struct SilentLedger;

impl AnchorPublisher for SilentLedger {
    async fn publish(&self, _request: &AnchorRequest) -> Result<AnchorConfirmation, AnchorError> {
        std::future::pending().await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

const FLORIANOPOLIS: &str = "florianopolis-2026-02";

fn config(max_signatures: usize, max_attempts: u32) -> PoolingConfig {
    PoolingConfig {
        max_signatures_per_pool: max_signatures,
        anchor_retry: RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
            attempt_timeout_ms: 30_000,
        },
    }
}

fn registry<P: AnchorPublisher>(
    publisher: P,
    config: PoolingConfig,
) -> (RegionalPoolRegistry<P>, Arc<CollectingAlertSink>) {
    let alerts = Arc::new(CollectingAlertSink::new());
    let registry = RegionalPoolRegistry::new(config, Arc::new(publisher), alerts.clone());
    (registry, alerts)
}

fn submission(slug: &str, level: AssuranceLevel, voter: VoterId, content: ContentId) -> SignatureSubmission {
    let evidence = EvidenceHash::derive(&voter, &content, &EvidenceNonce::generate()).unwrap();
    SignatureSubmission {
        voter_identifier: voter.to_string(),
        target_content_identifier: content.to_string(),
        assurance_level_at_signing: level.as_str().to_string(),
        cryptographic_evidence_hash: evidence.to_string(),
        signed_at: "2026-02-14T09:30:00Z".to_string(),
        regional_slug: slug.to_string(),
        correlation_identifier: CorrelationId::new().to_string(),
    }
}

fn fresh(slug: &str, level: AssuranceLevel) -> SignatureSubmission {
    submission(slug, level, VoterId::new(), ContentId::new())
}

/// Admit IAL1, IAL2, IAL3 into the Florianópolis pool.
fn admit_three<P: AnchorPublisher>(registry: &RegionalPoolRegistry<P>) -> (PoolId, Vec<String>) {
    let subs: Vec<_> = AssuranceLevel::ALL
        .iter()
        .map(|level| fresh(FLORIANOPOLIS, *level))
        .collect();
    let mut pool_id = None;
    for sub in &subs {
        pool_id = Some(registry.submit(sub).unwrap().pool_identifier);
    }
    let leaves = subs
        .iter()
        .map(|s| s.cryptographic_evidence_hash.clone())
        .collect();
    (pool_id.unwrap(), leaves)
}

// ── Scenarios ────────────────────────────────────────────────────────

#[tokio::test]
async fn florianopolis_three_signatures_weigh_26_and_anchor_deterministically() {
    let (registry, alerts) = registry(LocalLedger::new(), config(10_000, 5));
    let (pool_id, leaves) = admit_three(&registry);

    let snapshot = registry.snapshot(&pool_id).unwrap();
    assert_eq!(snapshot.total_weight_in_group, 26);
    assert_eq!(snapshot.current_status, PoolStatus::Open);
    assert_eq!(snapshot.regional_slug.as_str(), FLORIANOPOLIS);

    let anchored = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();
    assert_eq!(anchored.current_status, PoolStatus::Anchored);
    assert!(anchored.closed_at.is_some());
    let root = anchored.merkle_root_anchor.clone().unwrap();
    assert_eq!(root.len(), 64);

    let recomputed = MerkleSealer.seal(pool_id, &leaves).unwrap();
    assert_eq!(recomputed.root, root);
    assert_eq!(MerkleSealer.seal(pool_id, &leaves).unwrap(), recomputed);
    assert_eq!(registry.publisher().stored(&pool_id).unwrap().merkle_root, root);
    assert!(alerts.alerts().is_empty());

    let record = registry.record(&pool_id).unwrap();
    let statuses: Vec<_> = record.transitions.iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        statuses,
        vec![
            (PoolStatus::Open, PoolStatus::Sealing),
            (PoolStatus::Sealing, PoolStatus::Anchored)
        ]
    );
}

#[test]
fn duplicate_voter_and_content_is_rejected_without_changing_weight() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let (voter, content) = (VoterId::new(), ContentId::new());
    let first = registry
        .submit(&submission(FLORIANOPOLIS, AssuranceLevel::Ial3Sovereign, voter, content))
        .unwrap();
    assert_eq!(first.total_weight_in_group, 20);

    let err = registry
        .submit(&submission(FLORIANOPOLIS, AssuranceLevel::Ial3Sovereign, voter, content))
        .unwrap_err();
    assert!(matches!(err, PoolingError::DuplicateSignature { .. }));

    let snapshot = registry.snapshot(&first.pool_identifier).unwrap();
    assert_eq!(snapshot.total_weight_in_group, 20);
    assert_eq!(snapshot.signature_count, 1);
}

#[test]
fn replayed_evidence_is_rejected() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let original = fresh(FLORIANOPOLIS, AssuranceLevel::Ial1Unverified);
    registry.submit(&original).unwrap();

    let mut replay = fresh(FLORIANOPOLIS, AssuranceLevel::Ial3Sovereign);
    replay.cryptographic_evidence_hash = original.cryptographic_evidence_hash.to_uppercase();
    assert!(matches!(
        registry.submit(&replay),
        Err(PoolingError::DuplicateSignature { .. })
    ));
}

#[tokio::test]
async fn submission_to_anchored_pool_is_pool_closed() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let (pool_id, _) = admit_three(&registry);
    registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();

    let err = registry
        .submit(&fresh(FLORIANOPOLIS, AssuranceLevel::Ial2Verified))
        .unwrap_err();
    assert_eq!(
        err,
        PoolingError::PoolClosed {
            pool_id,
            status: PoolStatus::Anchored
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(registry.snapshot(&pool_id).unwrap().total_weight_in_group, 26);
}

#[tokio::test]
async fn three_timeouts_then_success_anchors_with_correct_root() {
    let (registry, alerts) = registry(FlakyLedger::failing(3), config(10_000, 5));
    let (pool_id, leaves) = admit_three(&registry);

    let snapshot = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();

    assert_eq!(registry.publisher().calls.load(Ordering::SeqCst), 4);
    assert_eq!(snapshot.current_status, PoolStatus::Anchored);
    assert_eq!(snapshot.signature_count, 3);
    assert_eq!(snapshot.total_weight_in_group, 26);
    assert_eq!(
        snapshot.merkle_root_anchor.unwrap(),
        merkle_root(&leaves).unwrap().root
    );
    assert_eq!(registry.record(&pool_id).unwrap().signatures.len(), 3);
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn exhausted_retries_escalate_and_operator_retry_recovers() {
    let (registry, alerts) = registry(FlakyLedger::failing(3), config(10_000, 3));
    let (pool_id, leaves) = admit_three(&registry);

    let err = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        PoolingError::AnchoringTransient { attempts: 3, .. }
    ));

    let snapshot = registry.snapshot(&pool_id).unwrap();
    assert_eq!(snapshot.current_status, PoolStatus::Sealing);
    assert!(snapshot.escalated);
    assert!(snapshot.merkle_root_anchor.is_none());
    assert_eq!(registry.pending_anchors(), vec![pool_id]);
    assert!(matches!(
        alerts.alerts().as_slice(),
        [Alert::AnchoringEscalated { attempts: 3, .. }]
    ));
    assert!(matches!(
        registry.submit(&fresh(FLORIANOPOLIS, AssuranceLevel::Ial1Unverified)),
        Err(PoolingError::PoolClosed {
            status: PoolStatus::Sealing,
            ..
        })
    ));

    let recovered = registry
        .retry_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();
    assert_eq!(recovered.current_status, PoolStatus::Anchored);
    assert!(!recovered.escalated);
    assert_eq!(
        recovered.merkle_root_anchor.unwrap(),
        merkle_root(&leaves).unwrap().root
    );
    assert!(registry.pending_anchors().is_empty());
}

#[tokio::test]
async fn forged_root_marks_pool_corrupted() {
    let (registry, alerts) = registry(ForgingLedger, config(10_000, 5));
    let (pool_id, _) = admit_three(&registry);

    let err = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PoolingError::IntegrityCorruption { .. }));
    assert!(!err.is_retryable());

    let snapshot = registry.snapshot(&pool_id).unwrap();
    assert_eq!(snapshot.current_status, PoolStatus::Corrupted);
    assert!(snapshot.merkle_root_anchor.is_none());
    assert_eq!(registry.record(&pool_id).unwrap().signatures.len(), 3);
    match alerts.alerts().as_slice() {
        [Alert::IntegrityCorruption { ledger_root, .. }] => assert_eq!(ledger_root, &"ee".repeat(32)),
        other => panic!("expected one corruption alert, got {other:?}"),
    }

    // Terminal: no retry, no audit.
    assert!(matches!(
        registry.retry_anchor(&pool_id, CorrelationId::new()).await,
        Err(PoolingError::InvalidTransition {
            from: PoolStatus::Corrupted,
            ..
        })
    ));
    assert!(matches!(
        registry.audit(&pool_id),
        Err(PoolingError::NotAnchored { .. })
    ));
}

#[tokio::test]
async fn leaf_count_mismatch_is_corruption() {
    let (registry, alerts) = registry(TruncatingLedger, config(10_000, 5));
    let (pool_id, _) = admit_three(&registry);
    let err = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PoolingError::IntegrityCorruption { .. }));
    assert_eq!(
        registry.snapshot(&pool_id).unwrap().current_status,
        PoolStatus::Corrupted
    );
    assert_eq!(alerts.alerts().len(), 1);
}

#[tokio::test]
async fn capacity_triggers_sealing_in_the_same_admission() {
    let (registry, _) = registry(LocalLedger::new(), config(2, 5));
    let first = registry
        .submit(&fresh(FLORIANOPOLIS, AssuranceLevel::Ial1Unverified))
        .unwrap();
    assert!(!first.sealing_triggered);
    let second = registry
        .submit(&fresh(FLORIANOPOLIS, AssuranceLevel::Ial2Verified))
        .unwrap();
    assert!(second.sealing_triggered);
    assert_eq!(second.total_weight_in_group, 6);

    let pool_id = second.pool_identifier;
    assert_eq!(
        registry.snapshot(&pool_id).unwrap().current_status,
        PoolStatus::Sealing
    );
    assert!(matches!(
        registry.submit(&fresh(FLORIANOPOLIS, AssuranceLevel::Ial3Sovereign)),
        Err(PoolingError::PoolClosed { .. })
    ));

    let anchored = registry.anchor(&pool_id, CorrelationId::new()).await.unwrap();
    assert_eq!(anchored.current_status, PoolStatus::Anchored);
    assert_eq!(anchored.signature_count, 2);
}

#[tokio::test]
async fn anchoring_an_open_pool_is_an_invalid_transition() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let (pool_id, _) = admit_three(&registry);
    assert!(matches!(
        registry.anchor(&pool_id, CorrelationId::new()).await,
        Err(PoolingError::InvalidTransition {
            from: PoolStatus::Open,
            to: PoolStatus::Anchored,
            ..
        })
    ));
    assert_eq!(
        registry.snapshot(&pool_id).unwrap().current_status,
        PoolStatus::Open
    );
}

#[tokio::test]
async fn concurrent_anchor_attempts_fail_fast() {
    let (registry, _) = registry(SlowLedger(LocalLedger::new()), config(10_000, 5));
    let (pool_id, _) = admit_three(&registry);
    registry.seal(&pool_id).unwrap();

    let (a, b) = tokio::join!(
        registry.anchor(&pool_id, CorrelationId::new()),
        registry.anchor(&pool_id, CorrelationId::new())
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(PoolingError::AnchorInFlight { .. })))
            .count(),
        1
    );
    assert_eq!(
        registry.snapshot(&pool_id).unwrap().current_status,
        PoolStatus::Anchored
    );
}

#[tokio::test]
async fn audit_and_inclusion_proofs_for_anchored_pool() {
    let (registry, alerts) = registry(LocalLedger::new(), config(10_000, 5));
    let (pool_id, leaves) = admit_three(&registry);

    assert!(matches!(
        registry.audit(&pool_id),
        Err(PoolingError::NotAnchored {
            status: PoolStatus::Open,
            ..
        })
    ));
    let evidence = EvidenceHash::parse(&leaves[0]).unwrap();
    assert!(matches!(
        registry.inclusion_proof(&pool_id, &evidence),
        Err(PoolingError::NotAnchored { .. })
    ));

    let anchored = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();
    let root = anchored.merkle_root_anchor.unwrap();

    let report = registry.audit(&pool_id).unwrap();
    assert!(report.consistent);
    assert_eq!(report.anchored_root, root);
    assert_eq!(report.leaf_count, 3);
    assert!(alerts.alerts().is_empty());

    for (i, leaf) in leaves.iter().enumerate() {
        let proof = registry
            .inclusion_proof(&pool_id, &EvidenceHash::parse(leaf).unwrap())
            .unwrap();
        assert_eq!(proof.leaf_index, i);
        assert_eq!(proof.root, root);
        assert!(verify_inclusion_proof(&proof));
    }

    let stranger = EvidenceHash::parse(&"00".repeat(32)).unwrap();
    assert!(matches!(
        registry.inclusion_proof(&pool_id, &stranger),
        Err(PoolingError::EvidenceNotFound { .. })
    ));
}

#[test]
fn unknown_pool_is_not_found() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    assert!(matches!(
        registry.snapshot(&PoolId::new()),
        Err(PoolingError::PoolNotFound(_))
    ));
    assert!(matches!(
        registry.snapshot_by_slug(&RegionalSlug::new("manaus-2026-02").unwrap()),
        Err(PoolingError::PoolNotFound(_))
    ));
}

#[test]
fn regions_get_independent_pools() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let a = registry
        .submit(&fresh("porto-alegre-2026-02", AssuranceLevel::Ial3Sovereign))
        .unwrap();
    let b = registry
        .submit(&fresh("salvador-2026-02", AssuranceLevel::Ial1Unverified))
        .unwrap();
    assert_ne!(a.pool_identifier, b.pool_identifier);
    assert_eq!(registry.list().len(), 2);

    let by_slug = registry
        .snapshot_by_slug(&RegionalSlug::new("salvador-2026-02").unwrap())
        .unwrap();
    assert_eq!(by_slug.pool_identifier, b.pool_identifier);
    assert_eq!(by_slug.total_weight_in_group, 1);
}

#[test]
fn concurrent_submissions_keep_weight_sum_exact() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let content = ContentId::new();
    std::thread::scope(|scope| {
        for t in 0..8 {
            let registry = &registry;
            scope.spawn(move || {
                for i in 0..50 {
                    let level = AssuranceLevel::ALL[(t + i) % 3];
                    registry
                        .submit(&submission(FLORIANOPOLIS, level, VoterId::new(), content))
                        .unwrap();
                }
            });
        }
    });

    let expected: u64 = (0..8usize)
        .flat_map(|t| (0..50usize).map(move |i| [1u64, 5, 20][(t + i) % 3]))
        .sum();
    let snapshot = registry
        .snapshot_by_slug(&RegionalSlug::new(FLORIANOPOLIS).unwrap())
        .unwrap();
    assert_eq!(snapshot.signature_count, 400);
    assert_eq!(snapshot.total_weight_in_group, expected);
}

#[tokio::test]
async fn export_and_hydrate_survive_restart() {
    let (before, _) = registry(LocalLedger::new(), config(10_000, 5));
    let (anchored_id, _) = admit_three(&before);
    before
        .seal_and_anchor(&anchored_id, CorrelationId::new())
        .await
        .unwrap();
    let (voter, content) = (VoterId::new(), ContentId::new());
    let open = before
        .submit(&submission("recife-2026-03", AssuranceLevel::Ial2Verified, voter, content))
        .unwrap();

    let records = before.export_records();
    let json = serde_json::to_string(&records).unwrap();

    let (after, _) = registry(LocalLedger::new(), config(10_000, 5));
    let count = after.hydrate(serde_json::from_str(&json).unwrap()).unwrap();
    assert_eq!(count, 2);
    assert_eq!(
        after.snapshot(&anchored_id).unwrap(),
        before.snapshot(&anchored_id).unwrap()
    );
    assert!(after.audit(&anchored_id).unwrap().consistent);

    // Duplicate index and slug mapping were rebuilt.
    assert!(matches!(
        after.submit(&submission("recife-2026-03", AssuranceLevel::Ial2Verified, voter, content)),
        Err(PoolingError::DuplicateSignature { .. })
    ));
    let next = after
        .submit(&fresh("recife-2026-03", AssuranceLevel::Ial3Sovereign))
        .unwrap();
    assert_eq!(next.pool_identifier, open.pool_identifier);
    assert_eq!(next.total_weight_in_group, 25);

    // Hydrating the same pools twice is refused.
    assert!(after.hydrate(records).is_err());
}

#[test]
fn hydrate_rejects_tampered_weights_and_leaves_registry_empty() {
    let (before, _) = registry(LocalLedger::new(), config(10_000, 5));
    admit_three(&before);
    let mut records = before.export_records();
    records[0].signatures[0].weight = 100;
    records[0].total_weight_in_group += 99;

    let (after, _) = registry(LocalLedger::new(), config(10_000, 5));
    assert!(matches!(
        after.hydrate(records),
        Err(PoolingError::IntegrityCorruption { .. })
    ));
    assert!(after.list().is_empty());
}

#[test]
fn sealing_an_empty_pool_fails() {
    let (source, _) = registry(LocalLedger::new(), config(10_000, 5));
    admit_three(&source);
    let mut record = source.export_records().remove(0);
    record.signatures.clear();
    record.total_weight_in_group = 0;
    let pool_id = record.pool_identifier;

    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    registry.hydrate(vec![record]).unwrap();
    assert_eq!(
        registry.seal(&pool_id).unwrap_err(),
        PoolingError::EmptyPool { pool_id }
    );
    assert_eq!(
        registry.snapshot(&pool_id).unwrap().current_status,
        PoolStatus::Open
    );
}

#[test]
fn admitted_signatures_are_unique_per_voter_and_content() {
    let (registry, _) = registry(LocalLedger::new(), config(10_000, 5));
    let voters: Vec<_> = (0..4).map(|_| VoterId::new()).collect();
    let contents: Vec<_> = (0..3).map(|_| ContentId::new()).collect();
    for round in 0..3 {
        for voter in &voters {
            for content in &contents {
                let level = AssuranceLevel::ALL[round];
                let _ = registry.submit(&submission(FLORIANOPOLIS, level, *voter, *content));
            }
        }
    }
    let pool_id = registry.list()[0].pool_identifier;
    let record = registry.record(&pool_id).unwrap();
    let pairs: HashSet<_> = record
        .signatures
        .iter()
        .map(|m| (m.signature.voter_identifier(), m.signature.target_content_identifier()))
        .collect();
    assert_eq!(pairs.len(), record.signatures.len());
    assert_eq!(record.signatures.len(), 12);
    assert_eq!(record.total_weight_in_group, 12);
}

#[tokio::test]
async fn dropped_anchor_call_escalates_and_retry_recovers() {
    let (registry, alerts) = registry(HangOnceLedger::new(), config(10_000, 5));
    let (pool_id, leaves) = admit_three(&registry);
    registry.seal(&pool_id).unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        registry.anchor(&pool_id, CorrelationId::new()),
    )
    .await;
    assert!(cancelled.is_err());

    let snapshot = registry.snapshot(&pool_id).unwrap();
    assert_eq!(snapshot.current_status, PoolStatus::Sealing);
    assert!(snapshot.escalated);
    assert_eq!(registry.pending_anchors(), vec![pool_id]);
    match alerts.alerts().as_slice() {
        [Alert::AnchoringAbandoned { pool_id: alerted, .. }] => assert_eq!(*alerted, pool_id),
        other => panic!("expected one abandonment alert, got {other:?}"),
    }

    let recovered = registry
        .retry_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();
    assert_eq!(recovered.current_status, PoolStatus::Anchored);
    assert_eq!(
        recovered.merkle_root_anchor.unwrap(),
        merkle_root(&leaves).unwrap().root
    );
    assert_eq!(alerts.alerts().len(), 1);
}

#[tokio::test]
async fn hung_ledger_call_times_out_and_the_next_attempt_anchors() {
    let mut config = config(10_000, 3);
    config.anchor_retry.attempt_timeout_ms = 20;
    let (registry, alerts) = registry(HangOnceLedger::new(), config);
    let (pool_id, _) = admit_three(&registry);

    let anchored = registry
        .seal_and_anchor(&pool_id, CorrelationId::new())
        .await
        .unwrap();
    assert_eq!(anchored.current_status, PoolStatus::Anchored);
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn ledger_that_never_answers_exhausts_retries_with_timeouts() {
    let mut config = config(10_000, 2);
    config.anchor_retry.attempt_timeout_ms = 10;
    let (registry, alerts) = registry(SilentLedger, config);
    let (pool_id, _) = admit_three(&registry);

    match registry.seal_and_anchor(&pool_id, CorrelationId::new()).await {
        Err(PoolingError::AnchoringTransient {
            attempts,
            last_error,
            ..
        }) => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("timed out after 10ms"), "{last_error}");
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    let snapshot = registry.snapshot(&pool_id).unwrap();
    assert_eq!(snapshot.current_status, PoolStatus::Sealing);
    assert!(snapshot.escalated);
    assert!(matches!(
        alerts.alerts().as_slice(),
        [Alert::AnchoringEscalated { attempts: 2, .. }]
    ));
}
