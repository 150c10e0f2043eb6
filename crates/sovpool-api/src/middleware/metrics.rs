//! # Request Metrics
//!
//! In-process request and error counters, shared through a request
//! extension. Each request is also counted through the `metrics` facade so
//! the Prometheus exporter sees it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Responses with a 4xx or 5xx status.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }
}

/// Count every request and every error response.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let tracked = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;
    let status = response.status();

    ::metrics::counter!("sovpool_http_requests_total", "status" => status.as_u16().to_string())
        .increment(1);
    if let Some(m) = tracked {
        m.request_count.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            m.error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}
