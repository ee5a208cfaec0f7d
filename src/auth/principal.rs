//! Principal and role domain models.
//!
//! The identity core does not own principal persistence; these types mirror
//! what the consumed directory capabilities return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EstablishmentId, OrganisationId, RoleId, UserId};

/// A user account as resolved through the directory capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub username: String,
    /// Argon2 hash of the password credential; None until the principal has
    /// completed a create-password flow.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub organisation_id: Option<OrganisationId>,
    pub establishment_id: Option<EstablishmentId>,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// Normalize an email for consistent storage and comparison.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r == name)
    }
}

/// A role as resolved through the role directory capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// Partial update applied through the directory capability.
#[derive(Debug, Clone, Default)]
pub struct PrincipalPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub enabled: Option<bool>,
}

/// Wire representation of a resolved principal, shared by the server's
/// "who am I" endpoint and the client-side cache that consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalInfo {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation_id: Option<OrganisationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establishment_id: Option<EstablishmentId>,
}

impl From<&Principal> for PrincipalInfo {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            email: principal.email.clone(),
            username: principal.username.clone(),
            roles: principal.roles.clone(),
            organisation_id: principal.organisation_id.clone(),
            establishment_id: principal.establishment_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_principal() -> Principal {
        Principal {
            id: UserId::new(),
            email: "user@example.com".to_string(),
            username: "user".to_string(),
            password_hash: None,
            enabled: true,
            roles: vec!["member".to_string()],
            organisation_id: None,
            establishment_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn email_normalization() {
        assert_eq!(Principal::normalize_email("Test@Example.COM"), "test@example.com");
        assert_eq!(Principal::normalize_email("  user@HOST.com  "), "user@host.com");
    }

    #[test]
    fn has_role_checks_by_name() {
        let principal = sample_principal();
        assert!(principal.has_role("member"));
        assert!(!principal.has_role("admin"));
    }

    #[test]
    fn principal_info_conversion() {
        let principal = sample_principal();
        let info = PrincipalInfo::from(&principal);
        assert_eq!(info.id, principal.id);
        assert_eq!(info.email, principal.email);
        assert_eq!(info.roles, principal.roles);
    }

    #[test]
    fn password_hash_never_serialized() {
        let mut principal = sample_principal();
        principal.password_hash = Some("$argon2id$secret".to_string());
        let json = serde_json::to_string(&principal).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
