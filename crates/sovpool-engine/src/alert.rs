//! # Operational Alerts
//!
//! Anchoring exhaustion and integrity failures are never swallowed: the
//! registry logs them and hands them to an injected [`AlertSink`]. The
//! default sink writes structured `error` events; deployments wire their
//! paging integration behind the same trait.

use parking_lot::Mutex;
use serde::Serialize;

use sovpool_core::{CorrelationId, PoolId, RegionalSlug};

/// An event that needs operator attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// Anchoring ran out of retries; the pool is `SEALING` and escalated.
    AnchoringEscalated {
        pool_id: PoolId,
        regional_slug: RegionalSlug,
        correlation_id: CorrelationId,
        attempts: u32,
        last_error: String,
    },
    /// An anchoring call was dropped before it settled; the pool is
    /// `SEALING`, escalated, and eligible for `retry_anchor`.
    AnchoringAbandoned {
        pool_id: PoolId,
        regional_slug: RegionalSlug,
        correlation_id: CorrelationId,
    },
    /// The ledger stored a different commitment; the pool is `CORRUPTED`.
    IntegrityCorruption {
        pool_id: PoolId,
        regional_slug: RegionalSlug,
        correlation_id: CorrelationId,
        local_root: String,
        local_count: usize,
        ledger_root: String,
        ledger_count: usize,
    },
    /// A pool changed in memory but its record could not be written to
    /// durable storage; a restart would lose the change.
    PersistenceFailed {
        pool_id: PoolId,
        error: String,
    },
    /// An audit of an anchored pool could not reproduce its root.
    AuditMismatch {
        pool_id: PoolId,
        regional_slug: RegionalSlug,
        anchored_root: String,
        recomputed_root: String,
    },
}

impl Alert {
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::AnchoringEscalated { pool_id, .. }
            | Self::AnchoringAbandoned { pool_id, .. }
            | Self::IntegrityCorruption { pool_id, .. }
            | Self::PersistenceFailed { pool_id, .. }
            | Self::AuditMismatch { pool_id, .. } => *pool_id,
        }
    }
}

/// Destination for operator alerts.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: Alert);
}

/// Writes each alert as a structured `tracing::error!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: Alert) {
        let detail = serde_json::to_string(&alert).unwrap_or_else(|_| format!("{alert:?}"));
        tracing::error!(
            target: "sovpool::alert",
            pool_id = %alert.pool_id(),
            alert = %detail,
            "operator alert raised"
        );
    }
}

/// Keeps alerts in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct CollectingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts raised so far, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }
}

impl AlertSink for CollectingAlertSink {
    fn raise(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}
