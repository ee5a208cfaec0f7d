//! Data models for single-use action tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::action_type::ActionType;
use crate::domain::UserId;

/// Stored representation of an action token.
///
/// `token` is the primary key: an opaque, server-generated, unguessable
/// string. `email` is always set, even when a principal is attached, so
/// ownership checks never need a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionToken {
    pub token: String,
    pub actions: ActionType,
    pub email: String,
    pub user_id: Option<UserId>,
    /// Role names to bind to the eventual principal (invite/sign-up flows).
    /// Set once at creation, immutable after.
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Absent means the token does not expire by time; it is still single-use
    /// via revocation.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ActionToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expiry| expiry < now).unwrap_or(false)
    }
}

/// New action token database payload.
#[derive(Debug, Clone)]
pub struct NewActionToken {
    pub token: String,
    pub actions: ActionType,
    pub email: String,
    pub user_id: Option<UserId>,
    pub roles: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request to create an action token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionTokenRequest {
    pub actions: ActionType,
    /// Target address; ignored (and overridden) when `user_id` is set.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Hours until expiry; absent means the token never expires by time.
    #[serde(default)]
    pub expires_in_hours: Option<i64>,
}

/// Request to validate a presented action token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateActionTokenRequest {
    pub token: String,
    pub email: String,
    /// Every action here must be authorized by the token; a partial match is
    /// not sufficient.
    pub required: ActionType,
}
