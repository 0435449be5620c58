//! Database initialization
//!
//! Creates the SQLite database on first run and applies the idempotent
//! schema used by the wine pipeline.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets recommendation reads proceed while a batch writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// A single connection keeps every query on the same in-memory database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_wines_table(pool).await?;
    create_restaurant_wines_table(pool).await?;
    create_recommendation_log_table(pool).await?;

    Ok(())
}

pub async fn create_wines_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wines (
            id TEXT PRIMARY KEY,
            identity_key TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            producer TEXT,
            vintage INTEGER,
            region TEXT,
            country TEXT,
            varietals TEXT NOT NULL DEFAULT '[]',
            wine_type TEXT,
            acidity REAL,
            tannin REAL,
            intensity REAL,
            sweetness REAL,
            body TEXT,
            flavor_profile TEXT,
            aroma TEXT,
            serving_temperature TEXT,
            aging_potential TEXT,
            food_pairing TEXT,
            enrichment_status TEXT NOT NULL DEFAULT 'unverified'
                CHECK (enrichment_status IN ('unverified', 'pending', 'verified', 'failed')),
            verification_source TEXT,
            rating REAL,
            priority INTEGER NOT NULL DEFAULT 0,
            enrichment_attempts INTEGER NOT NULL DEFAULT 0,
            last_enrichment_error TEXT,
            enriched_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_wines_status_priority ON wines(enrichment_status, priority)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_restaurant_wines_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS restaurant_wines (
            restaurant_id TEXT NOT NULL,
            wine_id TEXT NOT NULL REFERENCES wines(id) ON DELETE CASCADE,
            price REAL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (restaurant_id, wine_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_recommendation_log_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recommendation_log (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT NOT NULL,
            preference TEXT NOT NULL,
            wine_ids TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
