//! Symmetric Field Encryption
//!
//! AES-256-GCM encryption for sensitive fields stored at rest
//! (email addresses, TOTP secrets). The wire format is
//! `base64(nonce || ciphertext || tag)` with a fresh random 96-bit
//! nonce drawn per call. Nonce reuse under the same key breaks GCM,
//! so callers can never supply or cache nonces.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;

use crate::crypto::{from_base64, to_base64};

/// GCM nonce length in bytes (96 bits)
const NONCE_LEN: usize = 12;

/// Field encryption/decryption errors
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Ciphertext is malformed, truncated, or its authentication tag
    /// does not verify. Decryption never yields partial plaintext.
    #[error("Ciphertext authentication failed")]
    AuthTagInvalid,

    /// Decrypted bytes are not valid UTF-8
    #[error("Decrypted value is not valid UTF-8")]
    InvalidPlaintext,

    /// Encryption itself failed (should not happen with a valid key)
    #[error("Field encryption failed")]
    EncryptFailed,
}

/// AES-256-GCM cipher bound to the process-wide field encryption key.
///
/// The key is loaded once at startup; a missing key is a fatal startup
/// error handled by the configuration layer, never here.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl FieldCipher {
    /// Create a cipher from a 256-bit key
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt a string field, returning `base64(nonce || ciphertext || tag)`
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| EncryptionError::EncryptFailed)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(to_base64(&blob))
    }

    /// Decrypt a `base64(nonce || ciphertext || tag)` blob.
    ///
    /// Any malformed input (bad base64, truncated blob, failed tag)
    /// surfaces as [`EncryptionError::AuthTagInvalid`].
    pub fn decrypt(&self, encrypted: &str) -> Result<String, EncryptionError> {
        let blob = from_base64(encrypted).map_err(|_| EncryptionError::AuthTagInvalid)?;

        if blob.len() < NONCE_LEN {
            return Err(EncryptionError::AuthTagInvalid);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| EncryptionError::AuthTagInvalid)?;

        String::from_utf8(plaintext).map_err(|_| EncryptionError::InvalidPlaintext)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").field("key", &"[KEY]").finish()
    }
}
