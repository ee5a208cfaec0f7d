//! Bitmask action kinds for single-use action tokens.
//!
//! A single token may authorize several actions at once (for example a sign-up
//! confirmation that validates the email address *and* requires terms
//! acceptance). The flag values are persisted and documented for API clients,
//! so they are part of the wire contract and must never be renumbered.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of actions an action token authorizes together.
    ///
    /// | Flag | Value |
    /// |------|-------|
    /// | [`INVITE`](Self::INVITE) | 1 |
    /// | [`VALIDATE_EMAIL`](Self::VALIDATE_EMAIL) | 2 |
    /// | [`ACCEPT_TERMS`](Self::ACCEPT_TERMS) | 4 |
    /// | [`ACCEPT_PRIVACY`](Self::ACCEPT_PRIVACY) | 8 |
    /// | [`CREATE_PASSWORD`](Self::CREATE_PASSWORD) | 16 |
    /// | [`RESET_PASSWORD`](Self::RESET_PASSWORD) | 32 |
    /// | [`CHANGE_EMAIL`](Self::CHANGE_EMAIL) | 64 |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ActionType: u32 {
        /// Invite a not-yet-existing principal to join.
        const INVITE          = 1;
        /// Confirm ownership of an email address.
        const VALIDATE_EMAIL  = 2;
        /// Accept the terms of service.
        const ACCEPT_TERMS    = 4;
        /// Accept the privacy policy.
        const ACCEPT_PRIVACY  = 8;
        /// Choose an initial password.
        const CREATE_PASSWORD = 16;
        /// Reset a forgotten password.
        const RESET_PASSWORD  = 32;
        /// Confirm a change of email address.
        const CHANGE_EMAIL    = 64;
    }
}

impl ActionType {
    /// Actions that only make sense against an existing principal. A token
    /// carrying any of these must be bound to a user at creation time; INVITE
    /// must not be combined with them since it targets a principal that does
    /// not exist yet.
    pub const REQUIRES_PRINCIPAL: ActionType = ActionType::VALIDATE_EMAIL
        .union(ActionType::ACCEPT_TERMS)
        .union(ActionType::ACCEPT_PRIVACY)
        .union(ActionType::CREATE_PASSWORD)
        .union(ActionType::RESET_PASSWORD)
        .union(ActionType::CHANGE_EMAIL);

    /// Canonical flag order, used wherever the set is rendered for humans
    /// (mail bodies, UI listings) so output stays deterministic.
    pub const CANONICAL_ORDER: [ActionType; 7] = [
        ActionType::INVITE,
        ActionType::VALIDATE_EMAIL,
        ActionType::ACCEPT_TERMS,
        ActionType::ACCEPT_PRIVACY,
        ActionType::CREATE_PASSWORD,
        ActionType::RESET_PASSWORD,
        ActionType::CHANGE_EMAIL,
    ];

    /// Whether every flag in `required` is present in this set.
    pub fn contains_all(self, required: ActionType) -> bool {
        self.contains(required)
    }

    /// Whether at least one flag in `other` is present in this set.
    pub fn contains_any(self, other: ActionType) -> bool {
        self.intersects(other)
    }

    /// The flags of this set in canonical order.
    pub fn to_list(self) -> Vec<ActionType> {
        Self::CANONICAL_ORDER.iter().copied().filter(|flag| self.contains(*flag)).collect()
    }

    /// Human-readable label for a single flag.
    ///
    /// Returns a stable label for each canonical flag; combined sets are
    /// rendered by iterating [`to_list`](Self::to_list).
    pub fn label(self) -> &'static str {
        match self.bits() {
            1 => "accept your invitation",
            2 => "validate your email address",
            4 => "accept the terms of service",
            8 => "accept the privacy policy",
            16 => "create your password",
            32 => "reset your password",
            64 => "confirm your new email address",
            _ => "complete your pending actions",
        }
    }
}
