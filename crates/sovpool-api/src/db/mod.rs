//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When `DATABASE_URL` is set the
//! API writes every mutated pool record through to the `pools` table and
//! rebuilds the registry from it on startup. When absent, the API runs in
//! memory only and pools do not survive a restart.
//!
//! The registry stays the authority while the process runs; the database
//! is only read during hydration.

pub mod pools;

use std::future::Future;
use std::pin::Pin;

use sqlx::postgres::{PgPool, PgPoolOptions};

use sovpool_state::PoolRecord;

/// Future returned by [`RecordStore::upsert`].
pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<(), sqlx::Error>> + Send + 'a>>;

/// Write-through destination for pool records.
pub trait RecordStore: Send + Sync {
    /// Insert or replace the stored record of `record.pool_identifier`.
    fn upsert<'a>(&'a self, record: &'a PoolRecord) -> StoreFuture<'a>;
}

impl RecordStore for PgPool {
    fn upsert<'a>(&'a self, record: &'a PoolRecord) -> StoreFuture<'a> {
        Box::pin(pools::upsert(self, record))
    }
}

/// Connect and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set. Returns `Err` if the URL is
/// set but the connection or a migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. Pools will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;
    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}
