//! Business logic for issuing, validating, and revoking action tokens.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use tracing::{info, instrument, warn};

use crate::auth::action_token::{
    ActionToken, CreateActionTokenRequest, NewActionToken, ValidateActionTokenRequest,
};
use crate::auth::action_type::ActionType;
use crate::auth::directory::{MailSender, RoleDirectory, UserDirectory};
use crate::auth::mail::render_action_mail;
use crate::auth::principal::Principal;
use crate::errors::{PassageError, Result};
use crate::observability::metrics;
use crate::storage::repositories::{ActionTokenRepository, SqlxActionTokenRepository};

/// Number of random bytes in a token string (32 bytes = 256 bits entropy).
const TOKEN_BYTES: usize = 32;

/// Upper bound on generate-then-check attempts. A collision at 256 bits is
/// effectively impossible, so exhausting the attempts signals a broken RNG or
/// store rather than bad luck.
const MAX_GENERATION_ATTEMPTS: u32 = 100;

/// Message shared by every validation rejection so callers cannot probe which
/// check failed.
const INVALID_TOKEN_MSG: &str = "invalid action token";

/// Service owning the action-token lifecycle.
#[derive(Clone)]
pub struct ActionTokenService {
    repository: Arc<dyn ActionTokenRepository>,
    users: Arc<dyn UserDirectory>,
    roles: Arc<dyn RoleDirectory>,
}

impl ActionTokenService {
    pub fn new(
        repository: Arc<dyn ActionTokenRepository>,
        users: Arc<dyn UserDirectory>,
        roles: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self { repository, users, roles }
    }

    pub fn with_sqlx(
        pool: crate::storage::DbPool,
        users: Arc<dyn UserDirectory>,
        roles: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self::new(Arc::new(SqlxActionTokenRepository::new(pool)), users, roles)
    }

    /// Create an action token.
    ///
    /// When the request is bound to a principal, the principal is re-resolved
    /// and its own email overrides whatever the caller supplied, so a token can
    /// never be bound to a different address than the account it acts on.
    #[instrument(skip(self, request), fields(actions = ?request.actions))]
    pub async fn create(&self, request: CreateActionTokenRequest) -> Result<ActionToken> {
        if request.actions.is_empty() {
            return Err(PassageError::validation(
                "An action token must authorize at least one action",
            ));
        }

        let needs_principal = request.actions.contains_any(ActionType::REQUIRES_PRINCIPAL);

        if request.actions.contains(ActionType::INVITE) && needs_principal {
            return Err(PassageError::validation(
                "Invite cannot be combined with actions that target an existing account",
            ));
        }

        if needs_principal && request.user_id.is_none() {
            return Err(PassageError::validation(
                "The requested actions require an existing account",
            ));
        }

        if !request.roles.is_empty() {
            let found = self.roles.find_by_names(&request.roles).await?;
            let missing: Vec<&String> = request
                .roles
                .iter()
                .filter(|name| !found.iter().any(|role| &role.name == *name))
                .collect();
            if !missing.is_empty() {
                return Err(PassageError::validation(format!(
                    "Unknown roles: {}",
                    missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
                )));
            }
        }

        let email = match &request.user_id {
            Some(user_id) => {
                let principal = match self.users.get_by_id(user_id).await {
                    Ok(principal) => principal,
                    Err(PassageError::NotFound { .. }) => {
                        return Err(PassageError::validation(format!(
                            "Unknown user: {}",
                            user_id
                        )))
                    }
                    Err(err) => return Err(err),
                };
                Principal::normalize_email(&principal.email)
            }
            None => match &request.email {
                Some(email) if !email.trim().is_empty() => Principal::normalize_email(email),
                _ => {
                    return Err(PassageError::validation(
                        "An email address or an existing account is required",
                    ))
                }
            },
        };

        let expires_at =
            request.expires_in_hours.map(|hours| Utc::now() + Duration::hours(hours));

        // Generate-and-check loop; the primary key on the store is the actual
        // uniqueness guarantee.
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = generate_token();

            if self.repository.find_by_token(&candidate).await?.is_some() {
                warn!(attempt, "action token collision, regenerating");
                continue;
            }

            let created = self
                .repository
                .insert(NewActionToken {
                    token: candidate,
                    actions: request.actions,
                    email: email.clone(),
                    user_id: request.user_id.clone(),
                    roles: request.roles.clone(),
                    expires_at,
                })
                .await?;

            metrics::record_action_token_created();
            info!(
                actions = ?created.actions,
                email = %created.email,
                expires_at = ?created.expires_at,
                "action token created"
            );

            return Ok(created);
        }

        Err(PassageError::internal("unable to allocate a unique action token"))
    }

    /// Create an action token and hand the rendered notification to the mail
    /// capability. Delivery is fire-and-forget: a transport failure is logged
    /// and the token is still returned.
    #[instrument(skip(self, request, mailer, base_url))]
    pub async fn request(
        &self,
        request: CreateActionTokenRequest,
        mailer: &dyn MailSender,
        base_url: &str,
    ) -> Result<ActionToken> {
        let token = self.create(request).await?;

        let (subject, body) = render_action_mail(&token, base_url);
        if let Err(err) = mailer.send(&token.email, &subject, &body).await {
            warn!(error = %err, email = %token.email, "action token mail delivery failed");
        }

        Ok(token)
    }

    /// Validate a presented token against the complete set of actions the
    /// caller is about to perform.
    ///
    /// All rejections share one generic message. An expired token is deleted
    /// as a side effect before the rejection is returned.
    #[instrument(skip(self, request))]
    pub async fn validate(&self, request: ValidateActionTokenRequest) -> Result<ActionToken> {
        let token = self
            .repository
            .find_by_token(&request.token)
            .await?
            .ok_or_else(|| PassageError::forbidden(INVALID_TOKEN_MSG))?;

        if token.is_expired(Utc::now()) {
            // Lazy cleanup; a concurrent validation may already have removed
            // the row, which reads as `false` and is fine.
            self.repository.delete(&request.token).await?;
            return Err(PassageError::forbidden(INVALID_TOKEN_MSG));
        }

        if token.email != Principal::normalize_email(&request.email) {
            return Err(PassageError::forbidden(INVALID_TOKEN_MSG));
        }

        if !token.actions.contains_all(request.required) {
            return Err(PassageError::forbidden(INVALID_TOKEN_MSG));
        }

        Ok(token)
    }

    /// Look a token up without validating it. Unlike [`validate`](Self::validate)
    /// this performs no ownership or expiry checks; orchestrating flows use it
    /// to inspect a record they already hold.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<ActionToken>> {
        self.repository.find_by_token(token).await
    }

    /// Revoke a token after its action has been durably applied.
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str) -> Result<()> {
        if !self.repository.delete(token).await? {
            return Err(PassageError::not_found("action token", token));
        }

        metrics::record_action_token_revoked();
        info!("action token revoked");
        Ok(())
    }

    /// Remove every expired token. Idempotent housekeeping; safe to run
    /// unconditionally and repeatedly.
    #[instrument(skip(self))]
    pub async fn purge(&self) -> Result<u64> {
        let removed = self.repository.delete_expired(Utc::now()).await?;
        if removed > 0 {
            metrics::record_action_tokens_purged(removed);
            info!(removed, "purged expired action tokens");
        }
        Ok(removed)
    }
}

/// Generate an opaque token string from 256 bits of OS randomness.
pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
