//! Database access for dinewise-wine
//!
//! Schema lives in `dinewise_common::db`; this module holds the queries.

pub mod inventory;
pub mod recommendation_log;
pub mod wines;

use dinewise_common::{db::init_database, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the service database and apply the schema
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = init_database(db_path).await?;
    tracing::debug!("Database ready: {}", db_path.display());
    Ok(pool)
}
