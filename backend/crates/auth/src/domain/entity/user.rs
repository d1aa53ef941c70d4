//! User Entity
//!
//! The user row as returned by the store's lookup-by-email-hash
//! operation. Created exactly once, by successful registration
//! confirmation; the core only reads it.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

/// User record for the login path
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Store-assigned user id
    pub id: i64,
    /// Tenant boundary
    pub app_id: i64,
    /// Argon2id PHC hash
    pub password_hash: HashedPassword,
    /// Whether the registration email was confirmed
    pub is_email_verified: bool,
    /// Whether TOTP 2FA is enabled
    pub is_2fa_enabled: bool,
    /// Whether the account is suspended
    pub is_suspended: bool,
    /// Consecutive failed login count (store-maintained)
    pub failed_login_count: i32,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}
