//! # Signature Submission
//!
//! `POST /v1/signatures` runs the payload through the submission schema,
//! then through the engine's ingestion gate. When an admission fills its
//! pool, anchoring starts in the background and the response returns
//! immediately with `sealingTriggered: true`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use sovpool_core::CorrelationId;
use sovpool_engine::{AdmissionReceipt, SignatureSubmission};
use sovpool_schema::SchemaValidationError;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Signature submission payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSignatureRequest {
    /// UUID of the signing voter.
    pub voter_identifier: String,
    /// UUID of the content being supported.
    pub target_content_identifier: String,
    /// `IAL1_UNVERIFIED`, `IAL2_VERIFIED` or `IAL3_SOVEREIGN`.
    pub assurance_level_at_signing: String,
    /// 64 hex chars.
    pub cryptographic_evidence_hash: String,
    /// RFC 3339 timestamp with offset.
    pub signed_at: String,
    /// Region and cycle, e.g. `florianopolis-2026-02`.
    pub regional_slug: String,
    pub correlation_identifier: String,
}

impl From<SubmitSignatureRequest> for SignatureSubmission {
    fn from(req: SubmitSignatureRequest) -> Self {
        Self {
            voter_identifier: req.voter_identifier,
            target_content_identifier: req.target_content_identifier,
            assurance_level_at_signing: req.assurance_level_at_signing,
            cryptographic_evidence_hash: req.cryptographic_evidence_hash,
            signed_at: req.signed_at,
            regional_slug: req.regional_slug,
            correlation_identifier: req.correlation_identifier,
        }
    }
}

/// Accepted submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub signature_identifier: String,
    pub pool_identifier: String,
    /// Weight this signature contributed.
    pub weight: u64,
    /// Running total of the pool after this admission.
    pub total_weight_in_group: u64,
    /// This admission filled the pool; anchoring has started.
    pub sealing_triggered: bool,
}

impl From<AdmissionReceipt> for AdmissionResponse {
    fn from(receipt: AdmissionReceipt) -> Self {
        Self {
            signature_identifier: receipt.signature_identifier.to_string(),
            pool_identifier: receipt.pool_identifier.to_string(),
            weight: receipt.weight,
            total_weight_in_group: receipt.total_weight_in_group,
            sealing_triggered: receipt.sealing_triggered,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/signatures", post(submit_signature))
}

/// POST /v1/signatures — Submit one signature to its regional pool.
#[utoipa::path(
    post,
    path = "/v1/signatures",
    request_body = SubmitSignatureRequest,
    responses(
        (status = 201, description = "Signature admitted", body = AdmissionResponse),
        (status = 400, description = "Body is not JSON", body = crate::error::ErrorBody),
        (status = 409, description = "Duplicate signature or pool closed", body = crate::error::ErrorBody),
        (status = 422, description = "Payload failed validation", body = crate::error::ErrorBody),
    ),
    tag = "signatures"
)]
pub(crate) async fn submit_signature(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AdmissionResponse>), AppError> {
    let value = extract_json(body)?;
    state
        .schemas
        .validate_submission(&value)
        .map_err(|e| schema_rejection(e, &value))?;
    let request: SubmitSignatureRequest =
        serde_json::from_value(value).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let submission = SignatureSubmission::from(request);

    let receipt = state.registry.submit(&submission)?;
    state.persist(&receipt.pool_identifier).await;

    if receipt.sealing_triggered {
        let correlation_id = CorrelationId::parse(&submission.correlation_identifier)?;
        state.spawn_anchor(receipt.pool_identifier, correlation_id);
    }

    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// An unknown assurance tier is reported as `INVALID_ASSURANCE_LEVEL`
/// even though the schema's enum is what catches it.
fn schema_rejection(err: SchemaValidationError, payload: &Value) -> AppError {
    if let SchemaValidationError::ValidationFailed { violations, .. } = &err {
        if violations
            .iter()
            .any(|v| v.instance_path == "/assuranceLevelAtSigning")
        {
            let label = match payload.get("assuranceLevelAtSigning") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            return AppError::InvalidAssuranceLevel(label);
        }
    }
    AppError::from(err)
}
