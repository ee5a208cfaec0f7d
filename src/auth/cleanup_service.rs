//! Background maintenance routines for action tokens and sessions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::action_token_service::ActionTokenService;
use crate::errors::Result;
use crate::observability::metrics;
use crate::storage::repositories::SessionRepository;

/// Periodic housekeeping over the two expiring stores. Safe to run
/// unconditionally and repeatedly; failures are logged by callers rather than
/// surfaced to any interactive path.
#[derive(Clone)]
pub struct CleanupService {
    action_tokens: ActionTokenService,
    sessions: Arc<dyn SessionRepository>,
}

impl CleanupService {
    pub fn new(action_tokens: ActionTokenService, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { action_tokens, sessions }
    }

    /// Sweep both stores once.
    pub async fn run_once(&self) -> Result<()> {
        let tokens_removed = self.action_tokens.purge().await?;

        let now = Utc::now();
        let sessions_removed = self.sessions.delete_expired(now).await?;
        if sessions_removed > 0 {
            metrics::record_session_ended(sessions_removed);
        }

        let active = self.sessions.count_active(now).await?;
        metrics::set_active_sessions(active as usize);

        info!(tokens_removed, sessions_removed, active, "maintenance sweep completed");
        Ok(())
    }

    /// Run the sweep on a fixed interval until the task is dropped.
    pub async fn run_forever(self, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                warn!(error = %err, "maintenance sweep failed");
            }
        }
    }
}
