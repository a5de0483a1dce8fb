//! Document store connection and bootstrap.
//!
//! The store is SQLite behind a pooled sqlx client. Each collection is
//! a table carrying the full serialized document in a `doc` column plus
//! the scalar columns the canonical indexes and queries need. Statement
//! level atomicity supplies the per-document atomic upsert guarantee;
//! no cross-document transactions are taken anywhere in the pipeline.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::FALLBACK_DB_PATH;

/// Resolve the database file embedded in a store URL, falling back to
/// the fixed default path when the URL carries none.
pub fn db_path_from_url(url: &str) -> PathBuf {
    let trimmed = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    if trimmed.is_empty() {
        PathBuf::from(FALLBACK_DB_PATH)
    } else {
        PathBuf::from(trimmed)
    }
}

/// Open a pooled connection to the store, creating the database file
/// (and its parent directory) if missing.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let db_path = db_path_from_url(url);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the two collections if absent. Uniqueness constraints are not
/// declared here — the index reconciler owns them, so that drifted or
/// legacy index definitions can be detected and replaced.
pub async fn ensure_collections(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            srd_id TEXT NOT NULL,
            name TEXT NOT NULL,
            doc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS features (
            class_srd_id TEXT,
            class_name TEXT NOT NULL,
            level INTEGER NOT NULL,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            doc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
