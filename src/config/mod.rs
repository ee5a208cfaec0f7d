//! Configuration for the identity core: database pool settings and the
//! authentication parameters (JWT secret/expiry, session cookie contract).

pub mod settings;

pub use settings::{AppConfig, AuthConfig, DatabaseConfig};
