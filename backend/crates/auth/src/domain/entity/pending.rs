//! Pending Registration Outcome
//!
//! Result of the store's pending-user creation. The store's uniqueness
//! constraint on `(app_id, email_hash)` is the sole arbiter of races
//! between concurrent registrations for the same address; the loser
//! surfaces here as `Duplicate`, which the registration flow treats as
//! success with no side effect - never as an error.

use chrono::{DateTime, Utc};

/// Outcome of creating a pending user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOutcome {
    /// A fresh pending registration was recorded
    Created {
        /// When the verification token expires
        expires_at: DateTime<Utc>,
    },
    /// A live pending or confirmed registration already exists for
    /// this email; silent no-op branch
    Duplicate,
}

impl PendingOutcome {
    /// Expiry timestamp, present only on the fresh-registration branch
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            PendingOutcome::Created { expires_at } => Some(*expires_at),
            PendingOutcome::Duplicate => None,
        }
    }
}
