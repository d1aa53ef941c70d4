//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! The variants form a fixed taxonomy: store-level conditions are
//! mapped to these variants exactly once (in the infra layer, from
//! structured error codes), and nothing downstream ever inspects
//! message text. Unknown store failures stay in `Database`/`Internal`
//! and surface as opaque 500s - the caller never learns the cause.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input caught before reaching crypto or the store
    #[error("{0}")]
    Validation(String),

    /// Wrong password or unknown email at login.
    ///
    /// Deliberately covers both causes: the caller-visible signal is
    /// uniform to prevent account enumeration. The internal cause is
    /// carried for logging only.
    #[error("Invalid credentials")]
    InvalidCredentials {
        /// Internal cause, never serialized into a response
        cause: CredentialFailure,
    },

    /// Account is suspended (distinguishable 403 by product decision)
    #[error("User account is suspended")]
    AccountSuspended,

    /// No pending registration matches the presented token
    #[error("Invalid or expired verification token")]
    PendingUserNotFound,

    /// Verification token does not match the pending registration
    #[error("Invalid verification token")]
    InvalidToken,

    /// Verification token has expired
    #[error("Verification token has expired")]
    TokenExpired,

    /// The pending registration itself has expired
    #[error("Registration has expired")]
    RegistrationExpired,

    /// A confirmed user already exists for this email
    #[error("User account already exists")]
    UserAlreadyExists,

    /// MFA challenge token is unknown or expired
    #[error("TOTP challenge token invalid or expired")]
    ChallengeNotFound,

    /// TOTP code did not verify (challenge stays valid for retry)
    #[error("Invalid TOTP code")]
    InvalidOtp,

    /// Access token missing, malformed, or not found
    #[error("Invalid or expired access token")]
    InvalidAccessToken,

    /// Authorization header missing or not in Bearer format
    #[error("Authorization header missing or invalid format")]
    MissingAuthorization,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Internal cause of an invalid-credentials failure (logging only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownEmail,
    WrongPassword,
}

impl AuthError {
    /// Uniform invalid-credentials error for an unknown email
    pub fn unknown_email() -> Self {
        AuthError::InvalidCredentials {
            cause: CredentialFailure::UnknownEmail,
        }
    }

    /// Uniform invalid-credentials error for a wrong password
    pub fn wrong_password() -> Self {
        AuthError::InvalidCredentials {
            cause: CredentialFailure::WrongPassword,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            AuthError::AccountSuspended => StatusCode::FORBIDDEN,
            AuthError::PendingUserNotFound | AuthError::InvalidToken => StatusCode::NOT_FOUND,
            AuthError::TokenExpired | AuthError::RegistrationExpired => StatusCode::GONE,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
            AuthError::ChallengeNotFound
            | AuthError::InvalidOtp
            | AuthError::InvalidAccessToken
            | AuthError::MissingAuthorization => StatusCode::UNAUTHORIZED,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials { .. }
            | AuthError::ChallengeNotFound
            | AuthError::InvalidOtp
            | AuthError::InvalidAccessToken
            | AuthError::MissingAuthorization => ErrorKind::Unauthorized,
            AuthError::AccountSuspended => ErrorKind::Forbidden,
            AuthError::PendingUserNotFound | AuthError::InvalidToken => ErrorKind::NotFound,
            AuthError::TokenExpired | AuthError::RegistrationExpired => ErrorKind::Gone,
            AuthError::UserAlreadyExists => ErrorKind::Conflict,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials { cause } => {
                // Cause stays internal; the response is uniform
                tracing::warn!(cause = ?cause, "Invalid login attempt");
            }
            AuthError::AccountSuspended => {
                tracing::warn!("Login attempt on suspended account");
            }
            AuthError::InvalidOtp => {
                tracing::warn!("Failed TOTP challenge attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::encryption::EncryptionError> for AuthError {
    fn from(err: platform::encryption::EncryptionError) -> Self {
        // Tag failures on stored ciphertext mean data corruption, not
        // caller fault; surface as opaque internal errors.
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
