//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, random bytes)
//! - Symmetric field encryption (AES-256-GCM)
//! - One-way indexable field hashing
//! - Password hashing (Argon2id, peppered)
//! - Opaque security tokens (generation, HMAC hashing, constant-time verify)
//! - One-time password verification (TOTP/HOTP)
//! - Cookie management
//! - Client metadata extraction

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod encryption;
pub mod hashing;
pub mod otp;
pub mod password;
pub mod token;
