//! Domain layer
//!
//! Pure domain identifiers with zero infrastructure dependencies beyond the
//! sqlx encode/decode glue. Entities themselves live next to the services that
//! own them (see `crate::auth`).

pub mod id;

pub use id::{EstablishmentId, OrganisationId, RoleId, UserId};
