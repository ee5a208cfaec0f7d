//! Action token repository.
//!
//! Persistence for single-use action tokens. The `token` primary key is the
//! authoritative uniqueness guarantee; the service-level generate-and-check
//! loop only narrows the window before it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::auth::action_token::{ActionToken, NewActionToken};
use crate::auth::action_type::ActionType;
use crate::domain::UserId;
use crate::errors::{PassageError, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct ActionTokenRow {
    pub token: String,
    pub actions: i64,
    pub email: String,
    pub user_id: Option<String>,
    pub roles: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ActionTokenRepository: Send + Sync {
    /// Persist a new token. A primary key violation surfaces as a database
    /// error; callers treat it as a generation collision.
    async fn insert(&self, token: NewActionToken) -> Result<ActionToken>;

    /// Look a token up by its opaque string.
    async fn find_by_token(&self, token: &str) -> Result<Option<ActionToken>>;

    /// Delete a token. Returns whether a record was actually removed, so a
    /// concurrent delete of the same token reads as `false` rather than an
    /// error.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Delete every token whose expiry has passed. Returns the removed count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct SqlxActionTokenRepository {
    pool: DbPool,
}

impl SqlxActionTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_model(&self, row: ActionTokenRow) -> Result<ActionToken> {
        let actions = ActionType::from_bits(row.actions as u32).ok_or_else(|| {
            PassageError::validation(format!(
                "Unknown action bits '{}' for token {}",
                row.actions, row.token
            ))
        })?;

        let roles = match row.roles {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        Ok(ActionToken {
            token: row.token,
            actions,
            email: row.email,
            user_id: row.user_id.map(UserId::from_string),
            roles,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[async_trait]
impl ActionTokenRepository for SqlxActionTokenRepository {
    async fn insert(&self, token: NewActionToken) -> Result<ActionToken> {
        let created_at = Utc::now();
        let roles_json = if token.roles.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&token.roles)?)
        };

        sqlx::query(
            "INSERT INTO action_tokens (token, actions, email, user_id, roles, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&token.token)
        .bind(token.actions.bits() as i64)
        .bind(&token.email)
        .bind(token.user_id.as_ref())
        .bind(roles_json.as_ref())
        .bind(created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|err| PassageError::Database {
            source: err,
            context: "Failed to insert action token".to_string(),
        })?;

        Ok(ActionToken {
            token: token.token,
            actions: token.actions,
            email: token.email,
            user_id: token.user_id,
            roles: token.roles,
            created_at,
            expires_at: token.expires_at,
        })
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ActionToken>> {
        let row: Option<ActionTokenRow> = sqlx::query_as(
            "SELECT token, actions, email, user_id, roles, created_at, expires_at \
             FROM action_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| PassageError::Database {
            source: err,
            context: "Failed to fetch action token".to_string(),
        })?;

        row.map(|row| self.to_model(row)).transpose()
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM action_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|err| PassageError::Database {
                source: err,
                context: "Failed to delete action token".to_string(),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM action_tokens WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| PassageError::Database {
            source: err,
            context: "Failed to purge expired action tokens".to_string(),
        })?;

        Ok(result.rows_affected())
    }
}
