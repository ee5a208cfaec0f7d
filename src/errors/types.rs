//! Error taxonomy for the identity core, built on `thiserror`.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PassageError>;

/// The crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum PassageError {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failures in the backing store
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Payloads that fail to (de)serialize
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors: the caller supplied contradictory or incomplete input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Authentication errors: a session or credential check failed
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        error_type: AuthErrorType,
    },

    /// A presented token fails validation. The message stays generic on purpose:
    /// wrong token, wrong owner, and (usually) expired are indistinguishable to
    /// the caller.
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
    },

    /// A referenced entity is absent
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound {
        resource_type: String,
        id: String,
    },

    /// A precondition was violated (disabled account, uninitialized client)
    #[error("Invalid state: {message}")]
    InvalidState {
        message: String,
    },

    /// Internal errors (resource exhaustion, broken invariants)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// What exactly failed inside an [`PassageError::Auth`] rejection. Carried for
/// logs and metrics; the outward message stays generic.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthErrorType {
    InvalidToken,
    ExpiredToken,
    MissingToken,
    SessionNotFound,
    SessionExpired,
    InvalidCredentials,
    InsufficientPermissions,
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorType::InvalidToken => write!(f, "invalid_token"),
            AuthErrorType::ExpiredToken => write!(f, "expired_token"),
            AuthErrorType::MissingToken => write!(f, "missing_token"),
            AuthErrorType::SessionNotFound => write!(f, "session_not_found"),
            AuthErrorType::SessionExpired => write!(f, "session_expired"),
            AuthErrorType::InvalidCredentials => write!(f, "invalid_credentials"),
            AuthErrorType::InsufficientPermissions => write!(f, "insufficient_permissions"),
        }
    }
}

impl PassageError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Validation error tied to a specific input field.
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState { message: message.into() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// HTTP status code equivalent, for embedding HTTP layers.
    pub fn status_code(&self) -> u16 {
        match self {
            PassageError::Config { .. } => 500,
            PassageError::Database { .. } => 500,
            PassageError::Serialization { .. } => 400,
            PassageError::Validation { .. } => 400,
            PassageError::Auth { .. } => 401,
            PassageError::Forbidden { .. } => 403,
            PassageError::NotFound { .. } => 404,
            PassageError::InvalidState { .. } => 409,
            PassageError::Internal { .. } => 500,
        }
    }

    /// Whether retrying the failed operation can ever help. Validation and
    /// credential failures never qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PassageError::Database { .. })
    }
}

impl From<sqlx::Error> for PassageError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<serde_json::Error> for PassageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for PassageError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = PassageError::config("missing secret");
        assert!(matches!(error, PassageError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: missing secret");
    }

    #[test]
    fn validation_error_carries_field() {
        let error = PassageError::validation_field("Invalid email format", "email");
        assert!(matches!(error, PassageError::Validation { .. }));
        if let PassageError::Validation { field, .. } = error {
            assert_eq!(field, Some("email".to_string()));
        }
    }

    #[test]
    fn auth_error_carries_subtype() {
        let error = PassageError::auth("Invalid token", AuthErrorType::InvalidToken);
        if let PassageError::Auth { error_type, .. } = error {
            assert_eq!(error_type, AuthErrorType::InvalidToken);
        } else {
            panic!("expected auth error");
        }
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(PassageError::validation("test").status_code(), 400);
        assert_eq!(PassageError::auth("test", AuthErrorType::InvalidToken).status_code(), 401);
        assert_eq!(PassageError::forbidden("test").status_code(), 403);
        assert_eq!(PassageError::not_found("session", "test").status_code(), 404);
        assert_eq!(PassageError::invalid_state("test").status_code(), 409);
        assert_eq!(PassageError::internal("test").status_code(), 500);
    }

    #[test]
    fn only_database_errors_retry() {
        assert!(!PassageError::validation("test").is_retryable());
        assert!(!PassageError::not_found("session", "test").is_retryable());
        assert!(!PassageError::forbidden("test").is_retryable());
    }

    #[test]
    fn serde_json_errors_convert() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let passage_error: PassageError = json_error.into();
        assert!(matches!(passage_error, PassageError::Serialization { .. }));
    }

    #[test]
    fn auth_error_type_labels() {
        assert_eq!(AuthErrorType::InvalidToken.to_string(), "invalid_token");
        assert_eq!(AuthErrorType::ExpiredToken.to_string(), "expired_token");
        assert_eq!(AuthErrorType::MissingToken.to_string(), "missing_token");
        assert_eq!(AuthErrorType::SessionNotFound.to_string(), "session_not_found");
        assert_eq!(AuthErrorType::SessionExpired.to_string(), "session_expired");
        assert_eq!(AuthErrorType::InvalidCredentials.to_string(), "invalid_credentials");
        assert_eq!(
            AuthErrorType::InsufficientPermissions.to_string(),
            "insufficient_permissions"
        );
    }
}
