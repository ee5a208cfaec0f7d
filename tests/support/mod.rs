//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use passage::auth::directory::{MemoryRoleDirectory, MemoryUserDirectory};
use passage::auth::{hash_password, Principal};
use passage::config::{AuthConfig, DatabaseConfig};
use passage::domain::UserId;
use passage::storage::{create_pool, run_migrations, DbPool};

/// Fresh in-memory database with all migrations applied.
pub async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        auto_migrate: false,
        ..Default::default()
    };
    let pool = create_pool(&config).await.expect("create test pool");
    run_migrations(&pool).await.expect("run migrations");
    pool
}

/// Auth configuration suitable for tests.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "an-integration-test-secret-of-32-chars!".to_string(),
        session_expiry_seconds: 3600,
        secure_cookies: false,
        ..Default::default()
    }
}

/// A principal with an argon2-hashed password credential.
pub fn principal_with_password(email: &str, password: &str, enabled: bool) -> Principal {
    Principal {
        id: UserId::new(),
        email: email.to_string(),
        username: email.split('@').next().unwrap_or("user").to_string(),
        password_hash: Some(hash_password(password).expect("hash test password")),
        enabled,
        roles: vec!["member".to_string()],
        organisation_id: None,
        establishment_id: None,
        created_at: Utc::now(),
    }
}

/// Directory pair with the given principal and a standard role set.
pub fn directories(
    principals: Vec<Principal>,
) -> (Arc<MemoryUserDirectory>, Arc<MemoryRoleDirectory>) {
    let users = Arc::new(MemoryUserDirectory::new());
    for principal in principals {
        users.insert(principal);
    }
    let roles = Arc::new(MemoryRoleDirectory::with_roles(&["member", "admin"]));
    (users, roles)
}
