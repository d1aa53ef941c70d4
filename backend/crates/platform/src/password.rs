//! Password Hashing and Verification
//!
//! Argon2id password handling with:
//! - Unicode NFKC normalization before any processing
//! - Server-side pepper appended before hashing
//! - Complexity policy that reports every violated rule at once
//! - Zeroization of clear text material
//!
//! Hash parameters are embedded in the PHC output string, so
//! verification stays parameter-agnostic and future cost increases
//! do not invalidate stored hashes.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length in Unicode code points
pub const MIN_PASSWORD_LENGTH: usize = 12;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation
///
/// Carries the combined list of every rule the candidate password
/// violated, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Password validation failed: {0}")]
pub struct PasswordPolicyError(pub String);

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// The raw password is NFKC-normalized on construction and securely
/// erased from memory on drop.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password, enforcing the complexity policy:
    /// - at least [`MIN_PASSWORD_LENGTH`] characters
    /// - at least one uppercase letter (A-Z)
    /// - at least one lowercase letter (a-z)
    /// - at least one digit (0-9)
    /// - at least one non-alphanumeric character
    ///
    /// Every violated rule is collected into a single combined error.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        let mut violations: Vec<&str> = Vec::new();

        if normalized.chars().count() < MIN_PASSWORD_LENGTH {
            violations.push("must be at least 12 characters long");
        }
        if !normalized.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push("must contain at least one uppercase letter");
        }
        if !normalized.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push("must contain at least one lowercase letter");
        }
        if !normalized.chars().any(|c| c.is_ascii_digit()) {
            violations.push("must contain at least one digit");
        }
        if !normalized.chars().any(|c| !c.is_ascii_alphanumeric()) {
            violations.push("must contain at least one special character");
        }

        if !violations.is_empty() {
            return Err(PasswordPolicyError(violations.join("; ")));
        }

        Ok(Self(normalized))
    }

    /// Create without policy validation (trusted input, e.g. verifying
    /// an existing credential where the stored hash is the authority)
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    /// Get the normalized password bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password with Argon2id over `NFKC(password) || pepper`.
    ///
    /// ## Arguments
    /// * `pepper` - server-side secret, distinct from the field
    ///   encryption key and the token pepper
    pub fn hash(&self, pepper: &[u8]) -> Result<HashedPassword, PasswordHashError> {
        let mut peppered = self.as_bytes().to_vec();
        peppered.extend_from_slice(pepper);

        let salt = SaltString::generate(OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(&peppered, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        peppered.zeroize();

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string carries the algorithm identifier, version,
/// parameters (memory, iterations, parallelism), salt, and hash.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database).
    ///
    /// Malformed strings are accepted here and fail closed in
    /// [`HashedPassword::verify`]; use this for stored values whose
    /// provenance is the database, not user input.
    pub fn from_phc_string(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash.
    ///
    /// Never panics and never errors: malformed or legacy hashes,
    /// wrong peppers, and internal faults all return `false`.
    pub fn verify(&self, password: &ClearTextPassword, pepper: &[u8]) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        let mut peppered = password.as_bytes().to_vec();
        peppered.extend_from_slice(pepper);

        // Argon2 uses constant-time comparison internally
        let ok = Argon2::default()
            .verify_password(&peppered, &parsed_hash)
            .is_ok();

        peppered.zeroize();
        ok
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
