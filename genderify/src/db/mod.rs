//! Cache Store
//!
//! Persistent record of resolved artists plus the append-only offset
//! checkpoint log used to resume catalog batches.

pub mod artists;
pub mod checkpoints;

use genderify_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

use crate::models::ResolutionResult;

/// Explicitly opened handle on the genderify database
///
/// The schema is created once, when the store is opened.
#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    /// Open (creating if needed) the database file at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        tracing::debug!("Connecting to database: {}", db_url);

        // Single connection: the engine is strictly sequential
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await?;

        Self::with_pool(pool).await
    }

    /// Private in-memory store (tests, dry runs)
    pub async fn in_memory() -> Result<Self> {
        // One connection that never expires, or the database vanishes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        init_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Previously stored result for `name`
    pub async fn lookup(&self, name: &str) -> Result<Option<ResolutionResult>> {
        artists::load_artist_by_name(&self.pool, name).await
    }

    pub async fn insert(&self, result: &ResolutionResult) -> Result<()> {
        artists::insert_artist(&self.pool, result).await
    }

    /// Delete the record for `name`, returning rows removed
    pub async fn delete(&self, name: &str) -> Result<u64> {
        artists::delete_artist_by_name(&self.pool, name).await
    }

    pub async fn record_offset(&self, offset: u32) -> Result<()> {
        checkpoints::record_offset(&self.pool, offset).await
    }

    /// Most recent checkpoint, 0 when none exists
    pub async fn latest_offset(&self) -> Result<u32> {
        checkpoints::latest_offset(&self.pool).await
    }
}

/// Create the artists and offset_checkpoints tables if they don't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            catalog_id TEXT,
            primary_url TEXT,
            secondary_url TEXT,
            context TEXT,
            gender TEXT,
            is_group INTEGER NOT NULL DEFAULT 0,
            lead_gender TEXT,
            nonbinary_count INTEGER NOT NULL DEFAULT 0,
            female_count INTEGER NOT NULL DEFAULT 0,
            male_count INTEGER NOT NULL DEFAULT 0,
            unknown_count INTEGER NOT NULL DEFAULT 0,
            member_names TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS offset_checkpoints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            batch_offset INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (artists, offset_checkpoints)");

    Ok(())
}
