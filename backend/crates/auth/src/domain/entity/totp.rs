//! TOTP Secret Entities

use chrono::{DateTime, Utc};

/// TOTP secret row resolved via an MFA challenge token hash.
///
/// `secret_encrypted` never leaves this type except through decryption
/// inside the MFA confirmation flow; it is never serialized into a
/// response after the initial setup.
#[derive(Debug, Clone)]
pub struct TotpChallenge {
    /// TOTP secret row id (for enrollment confirmation)
    pub totp_secret_id: i64,
    pub user_id: i64,
    pub app_id: i64,
    /// AES-256-GCM blob of the base32 secret
    pub secret_encrypted: String,
    /// Set on first successful challenge (enrollment complete)
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Carried for the post-login response body
    pub is_email_verified: bool,
}

impl TotpChallenge {
    /// Whether this challenge completes first-time enrollment
    pub fn is_enrollment(&self) -> bool {
        self.confirmed_at.is_none()
    }
}
