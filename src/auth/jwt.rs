//! JWT utilities for session token signing and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::auth::principal::Principal;
use crate::errors::{AuthErrorType, PassageError, Result};

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the principal id
    pub sub: String,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establishment_id: Option<String>,
    /// Issued at (seconds since epoch)
    pub iat: usize,
    /// Expiration time (seconds since epoch)
    pub exp: usize,
}

/// Signs and verifies session tokens with a shared secret (HS256).
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Create a new signer with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Sign a session token for the given principal.
    pub fn sign(&self, principal: &Principal, expiry: Duration) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| PassageError::internal(format!("System clock error: {}", err)))?
            .as_secs() as usize;

        let claims = Claims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            username: principal.username.clone(),
            roles: principal.roles.clone(),
            organisation_id: principal.organisation_id.as_ref().map(|id| id.to_string()),
            establishment_id: principal.establishment_id.as_ref().map(|id| id.to_string()),
            iat: now,
            exp: now + expiry.as_secs() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| PassageError::internal(format!("Failed to sign token: {}", err)))
    }

    /// Verify a session token and return its claims. Any verification failure
    /// (malformed, bad signature, expired `exp`) maps to the same generic
    /// unauthorized error.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| {
                PassageError::auth("Invalid session token", AuthErrorType::InvalidToken)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::Utc;

    fn sample_principal() -> Principal {
        Principal {
            id: UserId::new(),
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            password_hash: None,
            enabled: true,
            roles: vec!["member".to_string(), "editor".to_string()],
            organisation_id: None,
            establishment_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let signer = TokenSigner::new(b"a-test-secret-that-is-long-enough-123");
        let principal = sample_principal();

        let token = signer.sign(&principal, Duration::from_secs(3600)).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, principal.id.to_string());
        assert_eq!(claims.email, principal.email);
        assert_eq!(claims.roles, principal.roles);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let signer = TokenSigner::new(b"a-test-secret-that-is-long-enough-123");
        let other = TokenSigner::new(b"a-different-secret-that-is-long-456");
        let token = signer.sign(&sample_principal(), Duration::from_secs(3600)).unwrap();

        let err = other.verify(&token).unwrap_err();
        assert!(matches!(
            err,
            PassageError::Auth { error_type: AuthErrorType::InvalidToken, .. }
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let signer = TokenSigner::new(b"a-test-secret-that-is-long-enough-123");
        assert!(signer.verify("not.a.jwt").is_err());
        assert!(signer.verify("").is_err());
    }
}
