//! # Request Helpers
//!
//! JSON body extraction with rejection mapping, and the correlation
//! identifier that ties a request to the engine's log lines and alerts.

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::Json;

use sovpool_core::CorrelationId;

use crate::error::AppError;

/// Header carrying the caller's correlation identifier.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Unwrap a JSON body, mapping syntax and content-type failures to
/// [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// The caller's correlation identifier, or a fresh one when the header is
/// absent. A present but malformed header is a validation error.
pub fn correlation_id(headers: &HeaderMap) -> Result<CorrelationId, AppError> {
    match headers.get(CORRELATION_HEADER) {
        None => Ok(CorrelationId::new()),
        Some(value) => {
            let text = value.to_str().map_err(|_| {
                AppError::Validation(format!("{CORRELATION_HEADER} is not valid ASCII"))
            })?;
            Ok(CorrelationId::parse(text)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_generates_an_id() {
        let a = correlation_id(&HeaderMap::new()).unwrap();
        let b = correlation_id(&HeaderMap::new()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn header_is_parsed() {
        let id = CorrelationId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            CORRELATION_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(correlation_id(&headers).unwrap(), id);
    }

    #[test]
    fn malformed_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            correlation_id(&headers),
            Err(AppError::Validation(_))
        ));
    }
}
