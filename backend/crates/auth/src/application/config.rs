//! Application Configuration
//!
//! All three secrets (field encryption key, password pepper, token
//! pepper) are read-only process-wide configuration, loaded exactly
//! once at startup and injected into the use cases. Absence of any
//! secret is a fatal startup error - the service fails closed, it
//! never starts with a missing or malformed secret.

use std::env;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use platform::encryption::FieldCipher;
use platform::token::TokenHasher;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Response-time floor for registration start (timing-attack defense)
pub const MIN_RESPONSE_TIME: Duration = Duration::from_millis(450);

/// Upper bound of the random jitter added to the floor
pub const RESPONSE_JITTER_MAX_MS: u64 = 100;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required secret: {0}")]
    MissingSecret(&'static str),

    #[error("Secret {0} is not valid base64")]
    MalformedSecret(&'static str),

    #[error("Secret {0} must decode to exactly 32 bytes")]
    WrongKeyLength(&'static str),
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// AES-256-GCM key for field encryption (32 bytes)
    pub field_key: [u8; 32],
    /// Server-side pepper appended to passwords before Argon2id
    pub password_pepper: Vec<u8>,
    /// Server-side pepper for HMAC token hashing
    pub token_pepper: Vec<u8>,
    /// Minimum registration response time
    pub response_floor: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// Access-token cookie name (path `/`)
    pub access_cookie_name: String,
    /// Refresh-token cookie name
    pub refresh_cookie_name: String,
    /// Path scope of the refresh-token cookie
    pub refresh_cookie_path: String,
}

impl AuthConfig {
    /// Load configuration from the environment.
    ///
    /// | Variable          | Format              |
    /// |-------------------|---------------------|
    /// | `AES_SECRET_KEY`  | base64, 32 bytes    |
    /// | `PASSWORD_PEPPER` | opaque string       |
    /// | `TOKEN_PEPPER`    | opaque string       |
    ///
    /// Each secret is independent of the others; reuse of one value
    /// across roles is a deployment error this layer cannot detect.
    pub fn from_env() -> Result<Self, ConfigError> {
        let field_key = decode_key("AES_SECRET_KEY")?;
        let password_pepper = require_secret("PASSWORD_PEPPER")?;
        let token_pepper = require_secret("TOKEN_PEPPER")?;

        Ok(Self {
            field_key,
            password_pepper: password_pepper.into_bytes(),
            token_pepper: token_pepper.into_bytes(),
            response_floor: MIN_RESPONSE_TIME,
            cookie_secure: true,
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_path: "/api/auth/refresh".to_string(),
        })
    }

    /// Create config with random secrets (for development and tests)
    pub fn with_random_secrets() -> Self {
        use rand::RngCore;
        let mut rng = rand::rng();
        let mut field_key = [0u8; 32];
        rng.fill_bytes(&mut field_key);
        let mut password_pepper = vec![0u8; 32];
        rng.fill_bytes(&mut password_pepper);
        let mut token_pepper = vec![0u8; 32];
        rng.fill_bytes(&mut token_pepper);

        Self {
            field_key,
            password_pepper,
            token_pepper,
            response_floor: MIN_RESPONSE_TIME,
            cookie_secure: true,
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_path: "/api/auth/refresh".to_string(),
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Field cipher bound to the configured encryption key
    pub fn cipher(&self) -> FieldCipher {
        FieldCipher::new(self.field_key)
    }

    /// Token hasher bound to the configured token pepper
    pub fn token_hasher(&self) -> TokenHasher {
        TokenHasher::new(self.token_pepper.clone())
    }
}

fn require_secret(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}

fn decode_key(name: &'static str) -> Result<[u8; 32], ConfigError> {
    let encoded = require_secret(name)?;
    let bytes = general_purpose::STANDARD
        .decode(&encoded)
        .map_err(|_| ConfigError::MalformedSecret(name))?;

    bytes
        .try_into()
        .map_err(|_| ConfigError::WrongKeyLength(name))
}
