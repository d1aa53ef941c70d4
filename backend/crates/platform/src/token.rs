//! Opaque Security Tokens
//!
//! Random, unguessable tokens with no embedded structure, validated
//! only by server-side lookup of their HMAC hash. Covers verification
//! tokens, access/refresh session tokens, and MFA challenge tokens.
//!
//! Plaintext tokens are request-scoped: generated, hashed for storage,
//! handed to the caller once, then dropped. Only hashes persist.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::crypto::{random_bytes, to_base64_url};

type HmacSha256 = Hmac<Sha256>;

/// Default token entropy in bytes
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// An opaque token in URL-safe base64 form.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken(String);

impl SecurityToken {
    /// Generate a token with [`DEFAULT_TOKEN_BYTES`] of entropy
    pub fn generate() -> Self {
        Self::with_len(DEFAULT_TOKEN_BYTES)
    }

    /// Generate a token from `byte_len` random bytes (CSPRNG)
    pub fn with_len(byte_len: usize) -> Self {
        Self(to_base64_url(&random_bytes(byte_len)))
    }

    /// Wrap a token received from a client (e.g. a Bearer header)
    pub fn from_client(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The URL-safe string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the plaintext string (for the one response that
    /// carries it)
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecurityToken").field(&"[REDACTED]").finish()
    }
}

/// HMAC-SHA256 token hasher bound to the process-wide token pepper.
///
/// The pepper is distinct from both the field encryption key and the
/// password pepper (three independent secrets total).
#[derive(Clone)]
pub struct TokenHasher {
    pepper: Vec<u8>,
}

impl TokenHasher {
    /// Create a hasher from the token pepper
    pub fn new(pepper: impl Into<Vec<u8>>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    /// HMAC-SHA256 of the token under the pepper (the stored form)
    pub fn hash(&self, token: &SecurityToken) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(&self.pepper)
            .expect("HMAC can take key of any size");
        mac.update(token.as_str().as_bytes());
        mac.finalize().into_bytes().into()
    }

    /// Constant-time check of a token against a stored hash.
    ///
    /// No early-exit byte comparison: the whole digest is always
    /// compared so mismatch position cannot leak through timing.
    pub fn verify(&self, token: &SecurityToken, stored_hash: &[u8]) -> bool {
        let computed = self.hash(token);
        computed.ct_eq(stored_hash).into()
    }
}

impl std::fmt::Debug for TokenHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHasher")
            .field("pepper", &"[PEPPER]")
            .finish()
    }
}
