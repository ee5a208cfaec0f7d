//! Session records, cookies, and the per-request authentication context.
//!
//! A session is represented twice: as a signed JWT handed to the client and as
//! a server-side [`SessionRecord`] keyed by the same raw token string. The
//! record is what makes server-side revocation possible before the JWT's own
//! expiry claim lapses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::principal::Principal;
use crate::domain::UserId;

/// Server-side record of a live session. Exactly one record exists per live
/// session token; a session is active iff `expiration_date` is in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Same value as the signed JWT's raw string.
    pub token: String,
    pub principal_id: UserId,
    pub login_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date > now
    }
}

/// Response returned to a successfully authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// SameSite attribute on the session cookie. Strict by default; Lax exists
/// for cross-site redirect flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl SameSitePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSitePolicy::Strict => "Strict",
            SameSitePolicy::Lax => "Lax",
            SameSitePolicy::None => "None",
        }
    }
}

/// Secure session cookie, part of the wire contract with browser clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    /// The session token, or empty when clearing.
    pub value: String,
    pub expires: DateTime<Utc>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
    pub path: String,
}

impl SessionCookie {
    /// Build the session cookie with the security attributes the contract
    /// requires: httpOnly, path=/.
    pub fn build(
        name: &str,
        token: &str,
        expires: DateTime<Utc>,
        secure: bool,
        same_site: SameSitePolicy,
    ) -> Self {
        Self {
            name: name.to_string(),
            value: token.to_string(),
            expires,
            http_only: true,
            secure,
            same_site,
            path: "/".to_string(),
        }
    }

    /// An expired, empty-valued cookie that instructs the browser to drop the
    /// session cookie.
    pub fn expired(name: &str, secure: bool, same_site: SameSitePolicy) -> Self {
        Self::build(name, "", DateTime::<Utc>::UNIX_EPOCH, secure, same_site)
    }
}

/// Pending cookie mutation accumulated on a request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    Set(SessionCookie),
    Clear(SessionCookie),
}

/// Per-request authentication state.
///
/// The resolved principal lives here and nowhere else; every request starts
/// anonymous and transitions through `authenticate` or
/// `load_principal_from_token`.
#[derive(Debug, Default)]
pub struct RequestContext {
    authorization: Option<String>,
    session_cookie: Option<String>,
    principal: Option<Principal>,
    cookie_update: Option<CookieUpdate>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the raw Authorization header value presented by the request.
    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Record the session cookie value presented by the request.
    pub fn with_session_cookie(mut self, value: impl Into<String>) -> Self {
        self.session_cookie = Some(value.into());
        self
    }

    /// Bearer token from the Authorization header, if present and well formed.
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization
            .as_deref()
            .map(str::trim)
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// The session token presented by this request: Authorization header
    /// first, cookie fallback.
    pub fn presented_token(&self) -> Option<&str> {
        self.bearer_token().or(self.session_cookie.as_deref())
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn attach_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn detach_principal(&mut self) {
        self.principal = None;
    }

    pub fn queue_cookie(&mut self, update: CookieUpdate) {
        self.cookie_update = Some(update);
    }

    /// The cookie mutation this request should send back, if any.
    pub fn cookie_update(&self) -> Option<&CookieUpdate> {
        self.cookie_update.as_ref()
    }
}
