//! # API Error Types
//!
//! Maps engine, schema and primitive errors to HTTP status codes and a
//! single JSON body shape. Integrity failures and other internal errors
//! are logged in full and answered with a generic message; Merkle roots
//! and ledger details never reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use sovpool_engine::PoolingError;
use sovpool_schema::{SchemaValidationError, Violation};

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `POOL_CLOSED`.
    pub code: String,
    pub message: String,
    /// Field-level violations, present only for schema failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error implementing [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// 422: a field failed domain validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// 422: the payload broke the submission contract.
    #[error("{} schema violation(s)", .0.len())]
    SchemaViolation(Vec<Violation>),

    /// 422: unknown assurance tier.
    #[error("invalid assurance level: {0}")]
    InvalidAssuranceLevel(String),

    /// 400: body is not JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 409: same voter and content, or replayed evidence.
    #[error("duplicate signature: {0}")]
    DuplicateSignature(String),

    /// 409: the pool no longer accepts signatures.
    #[error("pool closed: {0}")]
    PoolClosed(String),

    /// 409: audit or proof requested before the pool was anchored.
    #[error("pool not anchored: {0}")]
    NotAnchored(String),

    /// 409: the requested lifecycle step does not apply.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 503: the ledger is unavailable; the pool stays `SEALING`.
    #[error("anchoring unavailable: {0}")]
    AnchoringUnavailable(String),

    /// 500. The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::SchemaViolation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::InvalidAssuranceLevel(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ASSURANCE_LEVEL")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::DuplicateSignature(_) => (StatusCode::CONFLICT, "DUPLICATE_SIGNATURE"),
            Self::PoolClosed(_) => (StatusCode::CONFLICT, "POOL_CLOSED"),
            Self::NotAnchored(_) => (StatusCode::CONFLICT, "NOT_ANCHORED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::AnchoringUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ANCHORING_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::SchemaViolation(violations) => Some(serde_json::Value::Array(
                violations
                    .iter()
                    .map(|v| serde_json::json!({ "path": v.instance_path, "message": v.message }))
                    .collect(),
            )),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PoolingError> for AppError {
    fn from(err: PoolingError) -> Self {
        match err {
            PoolingError::Validation(e) => Self::Validation(e.to_string()),
            PoolingError::InvalidAssuranceLevel(label) => Self::InvalidAssuranceLevel(label),
            e @ PoolingError::DuplicateSignature { .. } => Self::DuplicateSignature(e.to_string()),
            PoolingError::PoolClosed { pool_id, status } => Self::PoolClosed(format!(
                "pool {pool_id} is {status}; submit to the next cycle's pool"
            )),
            PoolingError::AnchoringTransient {
                pool_id, attempts, ..
            } => Self::AnchoringUnavailable(format!(
                "pool {pool_id} could not be anchored after {attempts} attempt(s) and awaits operator retry"
            )),
            e @ PoolingError::IntegrityCorruption { .. } => Self::Internal(e.to_string()),
            PoolingError::PoolNotFound(id) => Self::NotFound(format!("pool {id}")),
            e @ PoolingError::EvidenceNotFound { .. } => Self::NotFound(e.to_string()),
            e @ PoolingError::NotAnchored { .. } => Self::NotAnchored(e.to_string()),
            e @ (PoolingError::EmptyPool { .. }
            | PoolingError::InvalidTransition { .. }
            | PoolingError::AnchorInFlight { .. }) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<SchemaValidationError> for AppError {
    fn from(err: SchemaValidationError) -> Self {
        match err {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                Self::SchemaViolation(violations)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<sovpool_core::ValidationError> for AppError {
    fn from(err: sovpool_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
