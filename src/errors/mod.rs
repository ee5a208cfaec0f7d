//! Error handling. The taxonomy lives in [`types`]; everything downstream
//! works in terms of the re-exported [`Error`] and [`Result`] aliases.

pub mod types;

pub use types::{AuthErrorType, PassageError, Result};

/// Alias used throughout the crate.
pub type Error = PassageError;
