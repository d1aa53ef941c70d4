//! Session Entities
//!
//! Opaque-token session types. Plaintext tokens exist only in
//! [`IssuedSession`], which lives from the issuing store call to the
//! HTTP response that carries it; the store persists hashes only.

use chrono::{DateTime, Utc};

/// Expiry pair returned by the store's session-creation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpiry {
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// A freshly issued login session.
///
/// The only place plaintext session tokens exist outside the HTTP
/// transport layer. Built by value once the hashes are persisted,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// An authenticated access-token session resolved from its hash
#[derive(Debug, Clone)]
pub struct AccessSession {
    pub user_id: i64,
    pub app_id: i64,
    pub expires_at: DateTime<Utc>,
}
