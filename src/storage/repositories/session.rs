//! Session record repository.
//!
//! One row per live session token. Deleting a row is server-side revocation;
//! the expiry sweep keeps the table from accumulating dead sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::auth::session::SessionRecord;
use crate::domain::UserId;
use crate::errors::{PassageError, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct SessionRow {
    pub token: String,
    pub principal_id: String,
    pub login_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            token: row.token,
            principal_id: UserId::from_string(row.principal_id),
            login_date: row.login_date,
            expiration_date: row.expiration_date,
        }
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session record.
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord>;

    /// Look a session up by its token string.
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>>;

    /// Delete a session. Returns whether a record was actually removed.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Delete every session whose expiration has passed. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Number of sessions still within their expiration window.
    async fn count_active(&self, now: DateTime<Utc>) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxSessionRepository {
    pool: DbPool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord> {
        sqlx::query(
            "INSERT INTO sessions (token, principal_id, login_date, expiration_date) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.token)
        .bind(&record.principal_id)
        .bind(record.login_date)
        .bind(record.expiration_date)
        .execute(&self.pool)
        .await
        .map_err(|err| PassageError::Database {
            source: err,
            context: "Failed to insert session record".to_string(),
        })?;

        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token, principal_id, login_date, expiration_date \
             FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| PassageError::Database {
            source: err,
            context: "Failed to fetch session record".to_string(),
        })?;

        Ok(row.map(SessionRecord::from))
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|err| PassageError::Database {
                source: err,
                context: "Failed to delete session record".to_string(),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiration_date < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|err| PassageError::Database {
                source: err,
                context: "Failed to purge expired sessions".to_string(),
            })?;

        Ok(result.rows_affected())
    }

    async fn count_active(&self, now: DateTime<Utc>) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE expiration_date >= $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(|err| PassageError::Database {
                    source: err,
                    context: "Failed to count active sessions".to_string(),
                })?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::{create_pool, run_migrations};
    use chrono::Duration;

    async fn repository() -> SqlxSessionRepository {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            auto_migrate: false,
            ..Default::default()
        };
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxSessionRepository::new(pool)
    }

    fn record(token: &str, expires_in: chrono::Duration) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            token: token.to_string(),
            principal_id: UserId::new(),
            login_date: now,
            expiration_date: now + expires_in,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let repo = repository().await;
        let created = repo.insert(record("jwt-1", Duration::hours(1))).await.unwrap();

        let fetched = repo.find_by_token("jwt-1").await.unwrap().unwrap();
        assert_eq!(fetched.token, created.token);
        assert_eq!(fetched.principal_id, created.principal_id);
    }

    #[tokio::test]
    async fn delete_is_tolerant_of_missing_rows() {
        let repo = repository().await;
        repo.insert(record("jwt-2", Duration::hours(1))).await.unwrap();

        assert!(repo.delete("jwt-2").await.unwrap());
        assert!(!repo.delete("jwt-2").await.unwrap());
        assert!(!repo.delete("never-existed").await.unwrap());
    }

    #[tokio::test]
    async fn expiry_sweep_and_active_count() {
        let repo = repository().await;
        let now = Utc::now();
        repo.insert(record("live", Duration::hours(1))).await.unwrap();
        repo.insert(record("dead", Duration::hours(-1))).await.unwrap();

        assert_eq!(repo.count_active(now).await.unwrap(), 1);
        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.find_by_token("dead").await.unwrap().is_none());
        assert!(repo.find_by_token("live").await.unwrap().is_some());
    }
}
