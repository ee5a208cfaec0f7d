//! Database connectivity and the persistence layer for action tokens and
//! session records.

pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use pool::{create_pool, DbPool};
pub use repositories::{
    ActionTokenRepository, SessionRepository, SqlxActionTokenRepository, SqlxSessionRepository,
};

use crate::errors::{PassageError, Result};

/// Embedded schema migrations, applied on startup when `auto_migrate` is set.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply any pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    MIGRATOR.run(pool).await.map_err(|e| {
        PassageError::internal(format!("Failed to run database migrations: {}", e))
    })
}

/// Ping the database, surfacing connectivity problems early.
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| PassageError::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}
