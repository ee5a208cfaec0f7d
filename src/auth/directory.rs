//! Consumed directory and delivery capabilities.
//!
//! The identity core looks principals and roles up through these seams and
//! hands outbound mail to [`MailSender`]; it never owns their persistence.
//! In-memory implementations are provided for tests and embedding hosts that
//! wire their own stores.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::principal::{Principal, PrincipalPatch, Role};
use crate::domain::{RoleId, UserId};
use crate::errors::{PassageError, Result};

/// Lookup/update capability for principals.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a principal by id; absent → `NotFound`.
    async fn get_by_id(&self, id: &UserId) -> Result<Principal>;

    /// Resolve a principal by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>>;

    /// Apply a partial update and return the updated principal.
    async fn update(&self, id: &UserId, patch: PrincipalPatch) -> Result<Principal>;

    /// Whether a principal with this email exists.
    async fn exists(&self, email: &str) -> Result<bool>;
}

/// Lookup capability for roles.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Resolve roles by name. Returns only the roles that exist; callers
    /// compare against the requested names to detect missing ones.
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>>;
}

/// Outbound mail capability. Fire-and-forget from the token flow's
/// perspective; delivery guarantees are the transport's concern.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// In-memory principal directory.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<UserId, Principal>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.users.lock().unwrap().insert(principal.id.clone(), principal);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get_by_id(&self, id: &UserId) -> Result<Principal> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PassageError::not_found("user", id.as_str()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let email = Principal::normalize_email(email);
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|p| Principal::normalize_email(&p.email) == email)
            .cloned())
    }

    async fn update(&self, id: &UserId, patch: PrincipalPatch) -> Result<Principal> {
        let mut users = self.users.lock().unwrap();
        let principal =
            users.get_mut(id).ok_or_else(|| PassageError::not_found("user", id.as_str()))?;
        if let Some(email) = patch.email {
            principal.email = Principal::normalize_email(&email);
        }
        if let Some(hash) = patch.password_hash {
            principal.password_hash = Some(hash);
        }
        if let Some(enabled) = patch.enabled {
            principal.enabled = enabled;
        }
        Ok(principal.clone())
    }

    async fn exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }
}

/// In-memory role directory.
#[derive(Default)]
pub struct MemoryRoleDirectory {
    roles: Mutex<HashMap<String, Role>>,
}

impl MemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roles(names: &[&str]) -> Self {
        let directory = Self::new();
        for name in names {
            directory.insert(name);
        }
        directory
    }

    pub fn insert(&self, name: &str) {
        self.roles
            .lock()
            .unwrap()
            .insert(name.to_string(), Role { id: RoleId::new(), name: name.to_string() });
    }
}

#[async_trait]
impl RoleDirectory for MemoryRoleDirectory {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>> {
        let roles = self.roles.lock().unwrap();
        Ok(names.iter().filter_map(|name| roles.get(name).cloned()).collect())
    }
}

/// Mail sender that records outbound messages instead of delivering them.
#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn principal(email: &str) -> Principal {
        Principal {
            id: UserId::new(),
            email: email.to_string(),
            username: "someone".to_string(),
            password_hash: None,
            enabled: true,
            roles: vec![],
            organisation_id: None,
            establishment_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_directory_lookup_by_email_is_case_insensitive() {
        let directory = MemoryUserDirectory::new();
        directory.insert(principal("User@Example.com"));

        let found = directory.find_by_email("user@example.COM").await.unwrap();
        assert!(found.is_some());
        assert!(directory.exists("USER@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn memory_directory_get_by_id_not_found() {
        let directory = MemoryUserDirectory::new();
        let err = directory.get_by_id(&UserId::new()).await.unwrap_err();
        assert!(matches!(err, PassageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn memory_directory_update_patch() {
        let directory = MemoryUserDirectory::new();
        let p = principal("old@example.com");
        let id = p.id.clone();
        directory.insert(p);

        let updated = directory
            .update(
                &id,
                PrincipalPatch {
                    email: Some("New@Example.com".to_string()),
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert!(!updated.enabled);
    }

    #[tokio::test]
    async fn role_directory_returns_only_existing_roles() {
        let directory = MemoryRoleDirectory::with_roles(&["member", "admin"]);
        let roles = directory
            .find_by_names(&["member".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "member");
    }

    #[tokio::test]
    async fn recording_mail_sender_captures_messages() {
        let sender = RecordingMailSender::new();
        sender.send("to@example.com", "subject", "body").await.unwrap();
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "to@example.com");
    }
}
