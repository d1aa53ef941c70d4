//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store/mailer contracts
//! - `application/` - Use cases and application services
//! - `infra/` - Database and SMTP implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Two-step registration: pending user + token-bound email confirmation
//! - Email/password login with opaque session tokens in secure cookies
//! - TOTP-based 2FA with a single-use challenge bridge
//! - Application-scoped tenancy (hashes namespaced by app id)
//!
//! ## Security Model
//! - Passwords hashed with peppered Argon2id (NFKC-normalized)
//! - Emails encrypted at rest (AES-256-GCM), hashed for lookup
//! - Tokens stored as HMAC-SHA256 hashes, verified in constant time
//! - Registration responses held to a latency floor against
//!   enumeration by timing
//! - Uniform invalid-credentials signal for unknown email and wrong
//!   password

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::email::SmtpMailer;
pub use infra::postgres::PgAuthStore;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
