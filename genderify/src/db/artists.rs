//! Resolved artist records
//!
//! One row per distinct name. Rows are only ever inserted or deleted:
//! re-resolving an artist is an explicit delete followed by a fresh insert.

use chrono::Utc;
use genderify_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{
    ArtistIdentity, GenderLabel, MemberDistribution, ResolutionResult, ResolutionStatus,
};

/// Insert a resolved artist
///
/// Fails if a row for the same name already exists.
pub async fn insert_artist(pool: &SqlitePool, result: &ResolutionResult) -> Result<()> {
    let members = result.members.clone().unwrap_or_default();
    let member_names = serde_json::to_string(&members.member_names)
        .map_err(|e| Error::Internal(format!("Failed to serialize member names: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO artists (
            name, catalog_id, primary_url, secondary_url, context, gender,
            is_group, lead_gender, nonbinary_count, female_count, male_count,
            unknown_count, member_names, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&result.identity.name)
    .bind(&result.identity.catalog_id)
    .bind(&result.identity.primary_url)
    .bind(&result.identity.secondary_url)
    .bind(&result.context)
    .bind(result.gender.map(GenderLabel::as_str))
    .bind(result.is_group)
    .bind(result.lead_gender.map(GenderLabel::as_str))
    .bind(members.nonbinary as i64)
    .bind(members.female as i64)
    .bind(members.male as i64)
    .bind(members.unknown as i64)
    .bind(member_names)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the record stored under exactly `name`
pub async fn load_artist_by_name(pool: &SqlitePool, name: &str) -> Result<Option<ResolutionResult>> {
    let row = sqlx::query(
        r#"
        SELECT name, catalog_id, primary_url, secondary_url, context, gender,
               is_group, lead_gender, nonbinary_count, female_count, male_count,
               unknown_count, member_names
        FROM artists
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.map(|row| row_to_result(&row)).transpose()
}

/// Delete the record for `name`, returning rows removed
pub async fn delete_artist_by_name(pool: &SqlitePool, name: &str) -> Result<u64> {
    let outcome = sqlx::query("DELETE FROM artists WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(outcome.rows_affected())
}

/// Number of stored artist rows
pub async fn count_artists(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn row_to_result(row: &SqliteRow) -> Result<ResolutionResult> {
    let is_group: bool = row.get("is_group");

    let member_names: String = row.get("member_names");
    let member_names: Vec<String> = serde_json::from_str(&member_names)
        .map_err(|e| Error::Internal(format!("Failed to deserialize member names: {}", e)))?;

    let members = is_group.then(|| MemberDistribution {
        nonbinary: row.get::<i64, _>("nonbinary_count") as u32,
        female: row.get::<i64, _>("female_count") as u32,
        male: row.get::<i64, _>("male_count") as u32,
        unknown: row.get::<i64, _>("unknown_count") as u32,
        member_names,
    });

    Ok(ResolutionResult {
        identity: ArtistIdentity {
            name: row.get("name"),
            catalog_id: row.get("catalog_id"),
            primary_url: row.get("primary_url"),
            secondary_url: row.get("secondary_url"),
        },
        gender: parse_label(row.get("gender")),
        context: row.get("context"),
        is_group,
        lead_gender: parse_label(row.get("lead_gender")),
        members,
        status: ResolutionStatus::Cached,
    })
}

fn parse_label(value: Option<String>) -> Option<GenderLabel> {
    let value = value?;
    match value.parse() {
        Ok(label) => Some(label),
        Err(e) => {
            tracing::warn!("Ignoring stored gender label: {}", e);
            None
        }
    }
}
