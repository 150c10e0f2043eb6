//! # Pool Endpoints
//!
//! Read endpoints return consistent snapshots taken under the pool's lock.
//! Seal and anchor await the anchoring outcome: `200` with the final
//! snapshot, `503` when the ledger stayed unavailable (the pool remains
//! `SEALING` and escalated), or a generic `500` if the ledger's commitment
//! did not match.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use sovpool_core::{EvidenceHash, PoolId, RegionalSlug};
use sovpool_crypto::{InclusionProof, Side};
use sovpool_engine::AuditReport;
use sovpool_state::PoolSnapshot;

use crate::error::AppError;
use crate::extractors::correlation_id;
use crate::state::AppState;

/// Snapshot of one regional pool.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolView {
    pub pool_identifier: String,
    pub regional_slug: String,
    /// `OPEN`, `SEALING`, `ANCHORED` or `CORRUPTED`.
    pub current_status: String,
    /// Present once `ANCHORED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root_anchor: Option<String>,
    pub total_weight_in_group: u64,
    pub signature_count: usize,
    /// Anchoring exhausted its retries and awaits an operator.
    pub escalated: bool,
    pub opened_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

impl From<PoolSnapshot> for PoolView {
    fn from(s: PoolSnapshot) -> Self {
        Self {
            pool_identifier: s.pool_identifier.to_string(),
            regional_slug: s.regional_slug.to_string(),
            current_status: s.current_status.as_str().to_string(),
            merkle_root_anchor: s.merkle_root_anchor,
            total_weight_in_group: s.total_weight_in_group,
            signature_count: s.signature_count,
            escalated: s.escalated,
            opened_at: s.opened_at.to_iso8601(),
            closed_at: s.closed_at.map(|t| t.to_iso8601()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolListResponse {
    pub count: usize,
    pub pools: Vec<PoolView>,
}

/// Result of recomputing an anchored root.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    pub pool_identifier: String,
    pub regional_slug: String,
    pub anchored_root: String,
    pub recomputed_root: String,
    pub leaf_count: usize,
    pub consistent: bool,
}

impl From<AuditReport> for AuditView {
    fn from(r: AuditReport) -> Self {
        Self {
            pool_identifier: r.pool_identifier.to_string(),
            regional_slug: r.regional_slug.to_string(),
            anchored_root: r.anchored_root,
            recomputed_root: r.recomputed_root,
            leaf_count: r.leaf_count,
            consistent: r.consistent,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProofStep {
    /// `left` or `right`.
    pub side: String,
    pub hash: String,
}

/// Inclusion proof of one evidence hash. Accepted as-is by
/// `sovpool verify --proof`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofView {
    pub pool_identifier: String,
    pub leaf_count: usize,
    pub root: String,
    pub leaf_index: usize,
    pub leaf: String,
    pub leaf_hash: String,
    pub path: Vec<ProofStep>,
}

impl ProofView {
    fn new(pool_id: PoolId, proof: InclusionProof) -> Self {
        Self {
            pool_identifier: pool_id.to_string(),
            leaf_count: proof.leaf_count,
            root: proof.root,
            leaf_index: proof.leaf_index,
            leaf: proof.leaf,
            leaf_hash: proof.leaf_hash,
            path: proof
                .path
                .into_iter()
                .map(|step| ProofStep {
                    side: match step.side {
                        Side::Left => "left",
                        Side::Right => "right",
                    }
                    .to_string(),
                    hash: step.hash,
                })
                .collect(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/pools", get(list_pools))
        .route("/v1/pools/{id}", get(get_pool))
        .route("/v1/regions/{slug}/pool", get(get_pool_by_region))
        .route("/v1/pools/{id}/seal", post(seal_pool))
        .route("/v1/pools/{id}/anchor", post(retry_anchor))
        .route("/v1/pools/{id}/audit", get(audit_pool))
        .route("/v1/pools/{id}/proof/{hash}", get(inclusion_proof))
}

/// GET /v1/pools — All pools, oldest first.
#[utoipa::path(
    get,
    path = "/v1/pools",
    responses((status = 200, description = "Pool snapshots", body = PoolListResponse)),
    tag = "pools"
)]
pub(crate) async fn list_pools(State(state): State<AppState>) -> Json<PoolListResponse> {
    let pools: Vec<PoolView> = state.registry.list().into_iter().map(PoolView::from).collect();
    Json(PoolListResponse {
        count: pools.len(),
        pools,
    })
}

/// GET /v1/pools/{id} — One pool's snapshot.
#[utoipa::path(
    get,
    path = "/v1/pools/{id}",
    params(("id" = String, Path, description = "Pool UUID")),
    responses(
        (status = 200, description = "Pool snapshot", body = PoolView),
        (status = 404, description = "Unknown pool", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PoolView>, AppError> {
    let pool_id = PoolId::parse(&id)?;
    Ok(Json(state.registry.snapshot(&pool_id)?.into()))
}

/// GET /v1/regions/{slug}/pool — The pool of a region/cycle.
#[utoipa::path(
    get,
    path = "/v1/regions/{slug}/pool",
    params(("slug" = String, Path, description = "Regional slug, e.g. florianopolis-2026-02")),
    responses(
        (status = 200, description = "Pool snapshot", body = PoolView),
        (status = 404, description = "No pool for this region yet", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn get_pool_by_region(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PoolView>, AppError> {
    let slug = RegionalSlug::new(slug)?;
    Ok(Json(state.registry.snapshot_by_slug(&slug)?.into()))
}

/// POST /v1/pools/{id}/seal — Close an open pool and anchor it.
#[utoipa::path(
    post,
    path = "/v1/pools/{id}/seal",
    params(("id" = String, Path, description = "Pool UUID")),
    responses(
        (status = 200, description = "Pool anchored", body = PoolView),
        (status = 409, description = "Pool empty or not OPEN", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger unavailable; pool escalated", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn seal_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PoolView>, AppError> {
    let pool_id = PoolId::parse(&id)?;
    let correlation_id = correlation_id(&headers)?;
    state.registry.seal(&pool_id)?;
    state.persist(&pool_id).await;
    let snapshot = state.anchor_and_persist(pool_id, correlation_id).await?;
    Ok(Json(snapshot.into()))
}

/// POST /v1/pools/{id}/anchor — Operator retry for a `SEALING` pool.
#[utoipa::path(
    post,
    path = "/v1/pools/{id}/anchor",
    params(("id" = String, Path, description = "Pool UUID")),
    responses(
        (status = 200, description = "Pool anchored", body = PoolView),
        (status = 409, description = "Pool not SEALING or anchoring in flight", body = crate::error::ErrorBody),
        (status = 503, description = "Ledger still unavailable", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn retry_anchor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PoolView>, AppError> {
    let pool_id = PoolId::parse(&id)?;
    let correlation_id = correlation_id(&headers)?;
    let snapshot = state.retry_and_persist(pool_id, correlation_id).await?;
    Ok(Json(snapshot.into()))
}

/// GET /v1/pools/{id}/audit — Recompute an anchored pool's root.
#[utoipa::path(
    get,
    path = "/v1/pools/{id}/audit",
    params(("id" = String, Path, description = "Pool UUID")),
    responses(
        (status = 200, description = "Audit report", body = AuditView),
        (status = 409, description = "Pool not ANCHORED", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn audit_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditView>, AppError> {
    let pool_id = PoolId::parse(&id)?;
    Ok(Json(state.registry.audit(&pool_id)?.into()))
}

/// GET /v1/pools/{id}/proof/{hash} — Inclusion proof for one evidence hash.
#[utoipa::path(
    get,
    path = "/v1/pools/{id}/proof/{hash}",
    params(
        ("id" = String, Path, description = "Pool UUID"),
        ("hash" = String, Path, description = "Evidence hash, 64 hex chars"),
    ),
    responses(
        (status = 200, description = "Inclusion proof", body = ProofView),
        (status = 404, description = "Evidence not in this pool", body = crate::error::ErrorBody),
        (status = 409, description = "Pool not ANCHORED", body = crate::error::ErrorBody),
    ),
    tag = "pools"
)]
pub(crate) async fn inclusion_proof(
    State(state): State<AppState>,
    Path((id, hash)): Path<(String, String)>,
) -> Result<Json<ProofView>, AppError> {
    let pool_id = PoolId::parse(&id)?;
    let evidence = EvidenceHash::parse(&hash)?;
    let proof = state.registry.inclusion_proof(&pool_id, &evidence)?;
    Ok(Json(ProofView::new(pool_id, proof)))
}
