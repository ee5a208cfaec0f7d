//! Repository modules for data access
//!
//! Repository implementations for the two stores the identity core owns:
//! action tokens and session records. Each module pairs a trait seam with its
//! sqlx-backed implementation.

pub mod action_token;
pub mod session;

pub use action_token::{ActionTokenRepository, SqlxActionTokenRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
