//! Client-side authentication state.
//!
//! A process-wide cache that keeps the access token consistent across memory,
//! a pluggable persistent store, and a cookie surface, restores sessions by
//! asking the server who the token belongs to, and notifies subscribers when
//! the resolved principal changes.

pub mod state;
pub mod surfaces;

pub use state::{AuthStateCache, ClientConfig, SubscriberId};
pub use surfaces::{CookieJar, FileTokenStore, MemoryCookieJar, MemoryTokenStore, TokenStore};
