//! # sovpool-api — Binary Entry Point
//!
//! Configuration comes from the environment: `PORT` (default 8080),
//! `DATABASE_URL` (optional), `LOG_FORMAT=json` for JSON logs, `RUST_LOG`
//! for filtering, and the engine's `SOVPOOL_*` variables.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use sovpool_api::state::{AppConfig, AppState};
use sovpool_engine::{LocalLedger, TracingAlertSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("invalid configuration: {e}");
        e
    })?;
    tracing::info!(
        max_signatures_per_pool = config.pooling.max_signatures_per_pool,
        anchor_max_attempts = config.pooling.anchor_retry.max_attempts,
        "configuration loaded"
    );

    let prometheus = PrometheusBuilder::new().install_recorder()?;
    let upkeep = prometheus.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(5));
        loop {
            tick.tick().await;
            upkeep.run_upkeep();
        }
    });

    let db_pool = sovpool_api::db::init_pool().await.map_err(|e| {
        tracing::error!("database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_parts(
        config.clone(),
        Arc::new(LocalLedger::new()),
        Arc::new(TracingAlertSink),
        db_pool,
        Some(prometheus),
    )?;
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    let app = sovpool_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("sovpool API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
