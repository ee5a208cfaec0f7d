//! # Passage
//!
//! Passage is an identity core that issues, validates, and revokes single-use
//! **action tokens** gating sensitive account operations (invites, email
//! validation, password creation/reset, terms and privacy acceptance, email
//! change), and manages **sessions**: password verification, JWT issuance
//! bound to a server-side session record, cookie synchronization, and
//! token-to-principal resolution. A client-side cache keeps the access token
//! consistent across memory, persistent storage, and a cookie surface.
//!
//! ## Architecture
//!
//! ```text
//! Caller (HTTP layer, CLI, jobs)
//!      ↓                    ↓
//! ActionTokenService   SessionEngine ── TokenSigner (JWT)
//!      ↓                    ↓
//!   action_tokens        sessions          (sqlx/SQLite)
//!      ↘                    ↙
//!    UserDirectory / RoleDirectory / MailSender   (consumed capabilities)
//! ```
//!
//! The HTTP layer, user/role persistence, and mail transport are external
//! collaborators: passage consumes them through the traits in
//! [`auth::directory`] and exposes validated actions and session decisions
//! back to them.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use passage::auth::{ActionTokenService, ActionType, CreateActionTokenRequest};
//! use passage::auth::directory::{MemoryRoleDirectory, MemoryUserDirectory};
//! use passage::config::AppConfig;
//! use passage::storage;
//!
//! #[tokio::main]
//! async fn main() -> passage::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let pool = storage::create_pool(&config.database).await?;
//!     storage::run_migrations(&pool).await?;
//!
//!     let tokens = ActionTokenService::with_sqlx(
//!         pool,
//!         Arc::new(MemoryUserDirectory::new()),
//!         Arc::new(MemoryRoleDirectory::with_roles(&["member"])),
//!     );
//!
//!     let invite = tokens
//!         .create(CreateActionTokenRequest {
//!             actions: ActionType::INVITE,
//!             email: Some("new@example.com".into()),
//!             user_id: None,
//!             roles: vec!["member".into()],
//!             expires_in_hours: Some(24),
//!         })
//!         .await?;
//!     println!("invite token: {}", invite.token);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};
pub use observability::init_tracing;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
