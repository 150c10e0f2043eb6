//! Pool record persistence.
//!
//! One row per pool. The full [`PoolRecord`] lives in a JSONB column so the
//! ordered leaf list, member weights and transition log round-trip
//! exactly; `status` and `regional_slug` are duplicated into columns for
//! operator queries. Invariants are re-checked by the registry on load,
//! not by SQL.

use sqlx::types::Json;
use sqlx::PgPool;

use sovpool_state::PoolRecord;

/// Insert or replace the stored record of one pool.
pub async fn upsert(pool: &PgPool, record: &PoolRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pools (id, regional_slug, status, record, updated_at)
         VALUES ($1, $2, $3, $4, now())
         ON CONFLICT (id) DO UPDATE
         SET status = EXCLUDED.status, record = EXCLUDED.record, updated_at = now()",
    )
    .bind(*record.pool_identifier.as_uuid())
    .bind(record.regional_slug.as_str())
    .bind(record.current_status.as_str())
    .bind(Json(record))
    .execute(pool)
    .await?;
    Ok(())
}

/// Load every stored record, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<PoolRecord>, sqlx::Error> {
    let rows: Vec<Json<PoolRecord>> =
        sqlx::query_scalar("SELECT record FROM pools ORDER BY (record->>'openedAt') ASC")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|Json(record)| record).collect())
}
