//! # Application State
//!
//! Shared state handed to every handler: the pool registry (the only
//! writer of pool state), the compiled boundary schemas, the optional
//! database pool and the optional Prometheus handle.
//!
//! Every operation that mutates a pool goes through [`AppState`] so the
//! pool's record can be written through to the [`RecordStore`] afterwards.
//! A failed write is logged and alerted but never undoes or blocks the
//! in-memory change: the registry is the authority while the process runs,
//! and the next write of the same pool carries the full record again.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use sovpool_core::{CorrelationId, PoolId};
use sovpool_engine::{
    Alert, AlertSink, ConfigError, LocalLedger, PoolingConfig, RegionalPoolRegistry, TracingAlertSink,
};
use sovpool_schema::{SchemaValidationError, SchemaValidator};
use sovpool_state::PoolSnapshot;

use crate::db::RecordStore;
use crate::error::AppError;

/// Registry type served by the API. The in-process ledger stands in for
/// the external one.
pub type PoolRegistry = RegionalPoolRegistry<LocalLedger>;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub pooling: PoolingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            pooling: PoolingConfig::default(),
        }
    }
}

impl AppConfig {
    /// `PORT` plus the engine's own environment resolution.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(value) => value.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidEnv {
                    var: "PORT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            Err(_) => 8080,
        };
        Ok(Self {
            port,
            pooling: PoolingConfig::from_env()?,
        })
    }
}

/// Startup failures of the state itself.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    #[error("failed to load pools from database: {0}")]
    Load(#[from] sqlx::Error),

    #[error("stored pools failed verification: {0}")]
    Hydrate(#[from] sovpool_engine::PoolingError),
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PoolRegistry>,
    pub schemas: Arc<SchemaValidator>,
    /// `None` means in-memory only.
    pub db_pool: Option<PgPool>,
    /// Write-through target; the database pool when one is configured.
    pub store: Option<Arc<dyn RecordStore>>,
    pub alerts: Arc<dyn AlertSink>,
    /// `None` when no global recorder was installed (e.g. in tests).
    pub prometheus: Option<PrometheusHandle>,
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("database", &self.db_pool.is_some())
            .field("store", &self.store.is_some())
            .field("prometheus", &self.prometheus.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with a local ledger and the tracing alert sink.
    pub fn try_new(config: AppConfig) -> Result<Self, StateError> {
        Self::with_parts(
            config,
            Arc::new(LocalLedger::new()),
            Arc::new(TracingAlertSink),
            None,
            None,
        )
    }

    /// State from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        ledger: Arc<LocalLedger>,
        alerts: Arc<dyn AlertSink>,
        db_pool: Option<PgPool>,
        prometheus: Option<PrometheusHandle>,
    ) -> Result<Self, StateError> {
        let registry = RegionalPoolRegistry::new(config.pooling.clone(), ledger, Arc::clone(&alerts));
        let store = db_pool
            .clone()
            .map(|pool| Arc::new(pool) as Arc<dyn RecordStore>);
        Ok(Self {
            registry: Arc::new(registry),
            schemas: Arc::new(SchemaValidator::new()?),
            db_pool,
            store,
            alerts,
            prometheus,
            config,
        })
    }

    /// Replace the write-through target.
    pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Rebuild the registry from stored records. Called once on startup.
    ///
    /// Pools left `SEALING` by the previous process are reported so an
    /// operator can retry them.
    pub async fn hydrate_from_db(&self) -> Result<usize, StateError> {
        let Some(pool) = &self.db_pool else {
            return Ok(0);
        };
        let records = crate::db::pools::load_all(pool).await?;
        let count = self.registry.hydrate(records)?;
        let pending = self.registry.pending_anchors();
        if !pending.is_empty() {
            tracing::warn!(
                pools = pending.len(),
                "pools awaiting anchoring after restart; retry via POST /v1/pools/{{id}}/anchor"
            );
        }
        tracing::info!(pools = count, "hydrated registry from database");
        Ok(count)
    }

    /// Write the pool's current record through to the store. Failures are
    /// logged and raised as [`Alert::PersistenceFailed`].
    pub async fn persist(&self, pool_id: &PoolId) {
        let Some(store) = &self.store else {
            return;
        };
        let outcome = match self.registry.record(pool_id) {
            Ok(record) => store.upsert(&record).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = outcome {
            tracing::error!(pool_id = %pool_id, error = %error, "failed to persist pool record");
            self.alerts.raise(Alert::PersistenceFailed {
                pool_id: *pool_id,
                error,
            });
        }
    }

    /// Anchor a `SEALING` pool and persist whatever state it ends in.
    pub async fn anchor_and_persist(
        &self,
        pool_id: PoolId,
        correlation_id: CorrelationId,
    ) -> Result<PoolSnapshot, AppError> {
        let outcome = self.registry.anchor(&pool_id, correlation_id).await;
        self.persist(&pool_id).await;
        Ok(outcome?)
    }

    /// Operator retry of an escalated pool, persisted the same way.
    pub async fn retry_and_persist(
        &self,
        pool_id: PoolId,
        correlation_id: CorrelationId,
    ) -> Result<PoolSnapshot, AppError> {
        let outcome = self.registry.retry_anchor(&pool_id, correlation_id).await;
        self.persist(&pool_id).await;
        Ok(outcome?)
    }

    /// Anchor on the runtime without blocking the caller, e.g. after a
    /// submission filled its pool. Failures are already logged and alerted
    /// by the registry.
    pub fn spawn_anchor(&self, pool_id: PoolId, correlation_id: CorrelationId) {
        let state = self.clone();
        tokio::spawn(async move {
            if let Err(e) = state.anchor_and_persist(pool_id, correlation_id).await {
                tracing::warn!(
                    pool_id = %pool_id,
                    correlation_id = %correlation_id,
                    error = %e,
                    "background anchoring did not complete"
                );
            }
        });
    }
}
