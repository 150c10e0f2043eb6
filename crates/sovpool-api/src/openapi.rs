//! # OpenAPI Document
//!
//! Assembles the utoipa-annotated handlers into one OpenAPI 3.1 document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sovereign Signature Pooling API",
        version = "0.1.0",
        description = "Merit-weighted signature pooling per region and cycle, sealed into Merkle roots anchored on an external ledger.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::signatures::submit_signature,
        crate::routes::pools::list_pools,
        crate::routes::pools::get_pool,
        crate::routes::pools::get_pool_by_region,
        crate::routes::pools::seal_pool,
        crate::routes::pools::retry_anchor,
        crate::routes::pools::audit_pool,
        crate::routes::pools::inclusion_proof,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::signatures::SubmitSignatureRequest,
        crate::routes::signatures::AdmissionResponse,
        crate::routes::pools::PoolView,
        crate::routes::pools::PoolListResponse,
        crate::routes::pools::AuditView,
        crate::routes::pools::ProofView,
        crate::routes::pools::ProofStep,
    )),
    tags(
        (name = "signatures", description = "Signature submission"),
        (name = "pools", description = "Regional pools, sealing, anchoring and verification"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
