//! Runtime configuration: database pool settings and the authentication
//! parameters (JWT secret and expiry, session cookie contract, action mail
//! base URL).

use crate::errors::{PassageError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Top-level configuration for the identity core.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    #[validate(nested)]
    pub database: DatabaseConfig,

    #[validate(nested)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Run both the derive-based and the custom checks.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(PassageError::from)?;
        self.validate_custom()?;
        Ok(())
    }

    /// Checks the validator derive cannot express.
    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite://") {
            return Err(PassageError::validation("Database URL must start with 'sqlite://'"));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(PassageError::validation(
                "JWT secret must be at least 32 characters long",
            ));
        }

        if self.auth.same_site_policy().is_none() {
            return Err(PassageError::validation(
                "Cookie SameSite must be one of 'strict', 'lax', 'none'",
            ));
        }

        Ok(())
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config =
            Self { database: DatabaseConfig::from_env(), auth: AuthConfig::from_env()? };
        config.validate()?;
        Ok(config)
    }
}

/// Connection pool settings for the token and session store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// 0 disables the idle timeout
    pub idle_timeout_seconds: u64,

    /// Apply embedded migrations on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/passage.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite://")
    }

    /// Read database settings from `PASSAGE_DATABASE_*` variables, falling
    /// back to the defaults.
    pub fn from_env() -> Self {
        let url = std::env::var("PASSAGE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/passage.db".to_string());

        let max_connections = std::env::var("PASSAGE_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("PASSAGE_DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);

        let connect_timeout_seconds = std::env::var("PASSAGE_DATABASE_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let idle_timeout_seconds = std::env::var("PASSAGE_DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600);

        let auto_migrate = std::env::var("PASSAGE_DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Session and action-token parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// Shared secret for signing and verifying session JWTs
    #[validate(length(min = 1, message = "JWT secret cannot be empty"))]
    pub jwt_secret: String,

    /// Session token expiry in seconds
    #[validate(range(
        min = 300,
        max = 2592000,
        message = "Session expiry must be between 5 minutes and 30 days"
    ))]
    pub session_expiry_seconds: u64,

    /// Session cookie name (part of the wire contract with browser clients)
    #[validate(length(min = 1, message = "Cookie name cannot be empty"))]
    pub session_cookie_name: String,

    /// Cookie SameSite policy: "strict", or "lax" for cross-site redirect flows
    #[validate(length(min = 1, message = "SameSite cannot be empty"))]
    pub cookie_same_site: String,

    /// Set the Secure flag on session cookies (disable only for local development)
    pub secure_cookies: bool,

    /// Base URL used when rendering action links into outbound mail
    #[validate(length(min = 1, message = "Action base URL cannot be empty"))]
    pub action_base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "passage-default-secret-please-change-in-production".to_string(),
            session_expiry_seconds: 86400, // 24 hours
            session_cookie_name: "passage_session".to_string(),
            cookie_same_site: "strict".to_string(),
            secure_cookies: true,
            action_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_expiry_seconds)
    }

    /// Parsed SameSite policy; None when the configured value is unknown
    pub fn same_site_policy(&self) -> Option<crate::auth::SameSitePolicy> {
        match self.cookie_same_site.to_lowercase().as_str() {
            "strict" => Some(crate::auth::SameSitePolicy::Strict),
            "lax" => Some(crate::auth::SameSitePolicy::Lax),
            "none" => Some(crate::auth::SameSitePolicy::None),
            _ => None,
        }
    }

    /// Read authentication settings from `PASSAGE_*` variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let jwt_secret =
            std::env::var("PASSAGE_JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let session_expiry_seconds = match std::env::var("PASSAGE_SESSION_EXPIRY_SECONDS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                PassageError::config(format!("Invalid session expiry: {}", e))
            })?,
            Err(_) => defaults.session_expiry_seconds,
        };

        let session_cookie_name =
            std::env::var("PASSAGE_SESSION_COOKIE").unwrap_or(defaults.session_cookie_name);

        let cookie_same_site =
            std::env::var("PASSAGE_COOKIE_SAME_SITE").unwrap_or(defaults.cookie_same_site);

        let secure_cookies = std::env::var("PASSAGE_SECURE_COOKIES")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.secure_cookies);

        let action_base_url =
            std::env::var("PASSAGE_ACTION_BASE_URL").unwrap_or(defaults.action_base_url);

        Ok(Self {
            jwt_secret,
            session_expiry_seconds,
            session_cookie_name,
            cookie_same_site,
            secure_cookies,
            action_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_sqlite_url_rejected() {
        let mut config = AppConfig::default();
        config.database.url = "postgresql://localhost/passage".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_same_site_rejected() {
        let mut config = AppConfig::default();
        config.auth.cookie_same_site = "sideways".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn same_site_parsing() {
        let mut auth = AuthConfig::default();
        assert_eq!(auth.same_site_policy(), Some(crate::auth::SameSitePolicy::Strict));
        auth.cookie_same_site = "Lax".to_string();
        assert_eq!(auth.same_site_policy(), Some(crate::auth::SameSitePolicy::Lax));
    }

    #[test]
    fn idle_timeout_zero_means_none() {
        let mut db = DatabaseConfig::default();
        db.idle_timeout_seconds = 0;
        assert!(db.idle_timeout().is_none());
    }
}
