//! SQLite connection pool setup.

use crate::config::DatabaseConfig;
use crate::errors::{PassageError, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

/// The pool handle shared by every repository.
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a pool against the configured SQLite database, creating the file if
/// it does not exist yet.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    if !config.is_sqlite() {
        return Err(PassageError::validation(format!(
            "Unsupported database URL scheme: {}",
            sanitize_url(&config.url)
        )));
    }

    let pool_options = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true);

    let pool_options = if let Some(idle_timeout) = config.idle_timeout() {
        pool_options.idle_timeout(idle_timeout)
    } else {
        pool_options
    };

    let connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| PassageError::Database {
            source: e,
            context: format!("Invalid SQLite connection string: {}", sanitize_url(&config.url)),
        })?
        .create_if_missing(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = pool_options.connect_with(connect_options).await.map_err(|e| {
        tracing::error!(
            error = %e,
            url = %sanitize_url(&config.url),
            "Failed to create SQLite database pool"
        );
        PassageError::Database {
            source: e,
            context: format!("Failed to connect to database: {}", sanitize_url(&config.url)),
        }
    })?;

    tracing::info!(
        max_connections = config.max_connections,
        url = %sanitize_url(&config.url),
        "Database pool created"
    );

    Ok(pool)
}

/// Strip query parameters from a URL before logging it.
fn sanitize_url(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_in_memory_pool() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            auto_migrate: false,
            ..Default::default()
        };
        let pool = create_pool(&config).await.unwrap();
        sqlx::query("SELECT 1").fetch_one(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn reject_non_sqlite_url() {
        let config = DatabaseConfig {
            url: "postgresql://localhost/passage".to_string(),
            ..Default::default()
        };
        assert!(create_pool(&config).await.is_err());
    }

    #[test]
    fn sanitize_strips_query() {
        assert_eq!(sanitize_url("sqlite://./db.sqlite?mode=rwc"), "sqlite://./db.sqlite");
    }
}
