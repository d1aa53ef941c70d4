//! API DTOs (Data Transfer Objects)
//!
//! Typed request/response structs built by value with named fields.
//! Session tokens never appear in response bodies; they travel only in
//! Set-Cookie headers.

use serde::{Deserialize, Serialize};

// ============================================================================
// Registration
// ============================================================================

/// Registration start request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub app_id: i64,
    pub email: String,
    /// Base URL the confirmation link is built from
    pub confirmation_url: String,
    /// Requester's IANA timezone (for the expiry in the email)
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Registration confirmation request (token arrives as a Bearer header)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfirmationRequest {
    pub app_id: i64,
    pub password: String,
}

/// Registration confirmation response
#[derive(Debug, Clone, Serialize)]
pub struct RegisterConfirmationResponse {
    pub user_id: i64,
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct UserLoginRequest {
    pub app_id: i64,
    pub email: String,
    pub password: String,
}

/// Login response (2FA disabled; tokens are in cookies)
#[derive(Debug, Clone, Serialize)]
pub struct UserLoginResponse {
    pub id: i64,
    pub is_email_verified: bool,
    pub is_2fa_enabled: bool,
}

/// Login response when 2FA is enabled (no session yet)
#[derive(Debug, Clone, Serialize)]
pub struct UserLogin2faResponse {
    pub id: i64,
    pub is_email_verified: bool,
    pub is_2fa_enabled: bool,
    /// Short-lived token for the TOTP challenge step
    pub challenge_token: String,
}

// ============================================================================
// MFA
// ============================================================================

/// TOTP setup response.
///
/// The only response that ever carries the plaintext secret.
#[derive(Debug, Clone, Serialize)]
pub struct TotpSetupResponse {
    /// Base32 secret for the authenticator app
    pub secret: String,
    /// Challenge token for the confirmation step
    pub challenge_token: String,
}

/// TOTP challenge request (challenge token arrives as a header)
#[derive(Debug, Clone, Deserialize)]
pub struct TotpChallengeRequest {
    pub code: String,
}
