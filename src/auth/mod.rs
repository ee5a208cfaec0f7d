//! Authentication module entry point.
//!
//! This module exposes the identity stack: bitmask action types, the
//! action-token lifecycle, the session engine with its JWT helpers, and the
//! consumed directory/mail capabilities.

pub mod action_token;
pub mod action_token_service;
pub mod action_type;
pub mod cleanup_service;
pub mod directory;
mod hashing;
pub mod jwt;
pub mod mail;
pub mod principal;
pub mod session;
pub mod session_service;

pub use action_token::{ActionToken, CreateActionTokenRequest, ValidateActionTokenRequest};
pub use action_token_service::ActionTokenService;
pub use action_type::ActionType;
pub use cleanup_service::CleanupService;
pub use directory::{MailSender, RoleDirectory, UserDirectory};
pub use hashing::{hash_password, verify_password};
pub use jwt::{Claims, TokenSigner};
pub use principal::{Principal, PrincipalInfo, PrincipalPatch, Role};
pub use session::{
    CookieUpdate, RequestContext, SameSitePolicy, SessionCookie, SessionRecord, SessionToken,
};
pub use session_service::SessionEngine;
