//! # sovpool-api — HTTP Surface
//!
//! | Route                                | Handler                      |
//! |--------------------------------------|------------------------------|
//! | `POST /v1/signatures`                | [`routes::signatures`]       |
//! | `GET  /v1/pools`, `/v1/pools/{id}`   | [`routes::pools`]            |
//! | `GET  /v1/regions/{slug}/pool`       | [`routes::pools`]            |
//! | `POST /v1/pools/{id}/seal`, `/anchor`| [`routes::pools`]            |
//! | `GET  /v1/pools/{id}/audit`          | [`routes::pools`]            |
//! | `GET  /v1/pools/{id}/proof/{hash}`   | [`routes::pools`]            |
//! | `GET  /health/*`, `/metrics`         | this module                  |
//! | `GET  /openapi.json`                 | [`openapi`]                  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    app_with_metrics(state, ApiMetrics::new())
}

/// Assemble the router around a caller-provided counter set.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let api = Router::new()
        .merge(routes::signatures::router())
        .merge(routes::pools::router())
        .merge(openapi::router())
        .route("/metrics", get(prometheus_metrics))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}

/// Prometheus text exposition. 503 when no recorder was installed.
async fn prometheus_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
