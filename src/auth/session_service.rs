//! Session engine: password authentication, JWT issuance bound to a
//! server-side session record, cookie synchronization, and token-to-principal
//! resolution.

use std::sync::{Arc, LazyLock};

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use crate::auth::directory::UserDirectory;
use crate::auth::hashing;
use crate::auth::jwt::{Claims, TokenSigner};
use crate::auth::principal::Principal;
use crate::auth::session::{
    CookieUpdate, RequestContext, SameSitePolicy, SessionCookie, SessionRecord, SessionToken,
};
use crate::config::AuthConfig;
use crate::errors::{AuthErrorType, PassageError, Result};
use crate::observability::metrics;
use crate::storage::repositories::{SessionRepository, SqlxSessionRepository};

/// Generic credential failure message; deliberately identical for unknown
/// user, missing credential, and wrong password so responses cannot be used
/// to enumerate accounts.
const INVALID_CREDENTIALS_MSG: &str = "Invalid email or password";

/// Dummy hash verified on the unknown-email and missing-credential paths so
/// their response time matches a real verification and cannot be used to
/// enumerate accounts.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

/// Engine managing the authenticated-session lifecycle.
#[derive(Clone)]
pub struct SessionEngine {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserDirectory>,
    signer: Arc<TokenSigner>,
    config: AuthConfig,
}

impl SessionEngine {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserDirectory>,
        config: AuthConfig,
    ) -> Self {
        let signer = Arc::new(TokenSigner::new(config.jwt_secret.as_bytes()));
        Self { sessions, users, signer, config }
    }

    pub fn with_sqlx(
        pool: crate::storage::DbPool,
        users: Arc<dyn UserDirectory>,
        config: AuthConfig,
    ) -> Self {
        Self::new(Arc::new(SqlxSessionRepository::new(pool)), users, config)
    }

    fn same_site(&self) -> SameSitePolicy {
        // Config validation rejects unknown values before an engine is built.
        self.config.same_site_policy().unwrap_or(SameSitePolicy::Strict)
    }

    /// Authenticate a resolved principal with a plaintext password and open a
    /// session for it.
    ///
    /// On success the signed JWT is bound to a new server-side session record,
    /// the session cookie is queued on the request context, and the principal
    /// is attached to it.
    #[instrument(skip(self, ctx, principal, password), fields(principal_id = %principal.id))]
    pub async fn authenticate(
        &self,
        ctx: &mut RequestContext,
        principal: &Principal,
        password: &str,
    ) -> Result<SessionToken> {
        if !principal.enabled {
            warn!(principal_id = %principal.id, "authentication attempt for disabled account");
            metrics::record_authentication("account_disabled");
            return Err(PassageError::invalid_state("Account is disabled"));
        }

        let Some(stored_hash) = principal.password_hash.as_deref() else {
            // No password credential yet (e.g. invite not completed). Burn the
            // same verification time as the real path.
            if let Err(err) = hashing::verify_password(password, &DUMMY_HASH) {
                warn!(error = %err, "dummy hash verification failed unexpectedly");
            }
            metrics::record_authentication("invalid_credentials");
            return Err(PassageError::auth(
                INVALID_CREDENTIALS_MSG,
                AuthErrorType::InvalidCredentials,
            ));
        };

        if !hashing::verify_password(password, stored_hash)? {
            warn!(principal_id = %principal.id, "authentication attempt with incorrect password");
            metrics::record_authentication("invalid_credentials");
            return Err(PassageError::auth(
                INVALID_CREDENTIALS_MSG,
                AuthErrorType::InvalidCredentials,
            ));
        }

        let expiry = self.config.session_expiry();
        let access_token = self.signer.sign(principal, expiry)?;

        let now = Utc::now();
        let expiration_date = now + Duration::seconds(expiry.as_secs() as i64);
        self.sessions
            .insert(SessionRecord {
                token: access_token.clone(),
                principal_id: principal.id.clone(),
                login_date: now,
                expiration_date,
            })
            .await?;

        ctx.queue_cookie(CookieUpdate::Set(SessionCookie::build(
            &self.config.session_cookie_name,
            &access_token,
            expiration_date,
            self.config.secure_cookies,
            self.same_site(),
        )));
        ctx.attach_principal(principal.clone());

        metrics::record_authentication("success");
        metrics::record_session_created();
        info!(principal_id = %principal.id, "session opened");

        Ok(SessionToken { access_token, expires_in: expiry.as_secs() })
    }

    /// Authenticate by email and password.
    ///
    /// The unknown-email path performs a dummy hash verification so its timing
    /// matches the real one.
    #[instrument(skip(self, ctx, email, password))]
    pub async fn login(
        &self,
        ctx: &mut RequestContext,
        email: &str,
        password: &str,
    ) -> Result<SessionToken> {
        let email = Principal::normalize_email(email);

        let Some(principal) = self.users.find_by_email(&email).await? else {
            if let Err(err) = hashing::verify_password(password, &DUMMY_HASH) {
                warn!(error = %err, "dummy hash verification failed unexpectedly");
            }
            warn!(email = %email, "login attempt for unknown email");
            metrics::record_authentication("invalid_credentials");
            return Err(PassageError::auth(
                INVALID_CREDENTIALS_MSG,
                AuthErrorType::InvalidCredentials,
            ));
        };

        self.authenticate(ctx, &principal, password).await
    }

    /// End the current session.
    ///
    /// Best effort by contract: the session record may already be gone, the
    /// store may be unreachable; the cookie is cleared and the principal
    /// detached regardless, and the call never fails observably.
    #[instrument(skip(self, ctx))]
    pub async fn logout(&self, ctx: &mut RequestContext) {
        if let Some(token) = ctx.presented_token().map(str::to_string) {
            match self.sessions.delete(&token).await {
                Ok(true) => {
                    metrics::record_session_ended(1);
                    info!("session closed");
                }
                Ok(false) => {}
                Err(err) => warn!(error = %err, "failed to delete session record on logout"),
            }
        }

        ctx.queue_cookie(CookieUpdate::Clear(SessionCookie::expired(
            &self.config.session_cookie_name,
            self.config.secure_cookies,
            self.same_site(),
        )));
        ctx.detach_principal();
    }

    /// Cryptographic verification only: signature and `exp` claim.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.signer.verify(token)
    }

    /// Resolve a presented token to a principal and attach it to the request
    /// context.
    ///
    /// Beyond JWT verification this requires a live server-side session
    /// record. The record's expiration is an independent second check: a
    /// session revoked or expired server-side stays dead even while the JWT's
    /// own `exp` claim would still verify.
    #[instrument(skip(self, ctx, token))]
    pub async fn load_principal_from_token(
        &self,
        ctx: &mut RequestContext,
        token: &str,
    ) -> Result<()> {
        let claims = self.verify_token(token)?;

        let record = self.sessions.find_by_token(token).await?.ok_or_else(|| {
            metrics::record_authentication("session_not_found");
            PassageError::auth("Session not found", AuthErrorType::SessionNotFound)
        })?;

        if !record.is_active(Utc::now()) {
            metrics::record_authentication("session_expired");
            return Err(PassageError::auth("Session expired", AuthErrorType::SessionExpired));
        }

        let principal_id = crate::domain::UserId::from_string(claims.sub);
        let principal = match self.users.get_by_id(&principal_id).await {
            Ok(principal) => principal,
            Err(PassageError::NotFound { .. }) => {
                return Err(PassageError::auth(
                    "Invalid session",
                    AuthErrorType::InvalidToken,
                ))
            }
            Err(err) => return Err(err),
        };

        if !principal.enabled {
            return Err(PassageError::auth(
                "Invalid session",
                AuthErrorType::InvalidCredentials,
            ));
        }

        ctx.attach_principal(principal);
        Ok(())
    }

    /// Whether the context principal holds at least one of the named roles.
    pub fn has_any_role(&self, ctx: &RequestContext, names: &[&str]) -> Result<bool> {
        let principal = Self::require_principal(ctx)?;
        Ok(names.iter().any(|name| principal.has_role(name)))
    }

    /// Whether the context principal holds every one of the named roles.
    pub fn has_all_roles(&self, ctx: &RequestContext, names: &[&str]) -> Result<bool> {
        let principal = Self::require_principal(ctx)?;
        Ok(names.iter().all(|name| principal.has_role(name)))
    }

    fn require_principal(ctx: &RequestContext) -> Result<&Principal> {
        ctx.principal().ok_or_else(|| {
            PassageError::auth("Authentication required", AuthErrorType::MissingToken)
        })
    }
}
