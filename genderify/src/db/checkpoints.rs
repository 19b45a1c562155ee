//! Offset checkpoint log
//!
//! Append-only: every checkpoint is a new row and the most recent one wins.

use chrono::{SecondsFormat, Utc};
use genderify_common::Result;
use sqlx::SqlitePool;

/// Append a checkpoint for `offset`
pub async fn record_offset(pool: &SqlitePool, offset: u32) -> Result<()> {
    sqlx::query("INSERT INTO offset_checkpoints (timestamp, batch_offset) VALUES (?, ?)")
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(offset as i64)
        .execute(pool)
        .await?;

    tracing::debug!(offset, "Offset checkpoint recorded");
    Ok(())
}

/// Latest checkpointed offset (0 when the log is empty)
///
/// Rows written within the same timestamp tick are ordered by id.
pub async fn latest_offset(pool: &SqlitePool) -> Result<u32> {
    let offset: Option<i64> = sqlx::query_scalar(
        "SELECT batch_offset FROM offset_checkpoints ORDER BY timestamp DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(offset.map(|o| o.max(0) as u32).unwrap_or(0))
}

/// Number of checkpoints written so far
pub async fn count_checkpoints(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offset_checkpoints")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
