//! Store and Mailer Contracts
//!
//! The durable store is consumed purely as named operations with fixed
//! argument/return contracts; persistence, expiry arithmetic, and
//! duplicate detection are the store's authority, not the core's. The
//! infra layer maps the store's structured error codes onto the
//! [`AuthError`](crate::error::AuthError) taxonomy exactly once.

use platform::client::ClientMeta;

use crate::domain::entity::{
    pending::PendingOutcome,
    session::{AccessSession, SessionExpiry},
    totp::TotpChallenge,
    user::UserRecord,
};
use crate::error::AuthResult;

/// Durable store operations
///
/// Every write takes the client metadata (IP, user agent) because the
/// store-side procedure records an audit row as part of the same call;
/// the audit write is not skippable by the caller.
#[trait_variant::make(AuthStore: Send)]
pub trait LocalAuthStore {
    /// Create a pending registration.
    ///
    /// A uniqueness violation on `(app_id, email_hash)` returns
    /// [`PendingOutcome::Duplicate`], never an error.
    async fn create_pending_user(
        &self,
        app_id: i64,
        token_hash: &[u8],
        email_encrypted: &str,
        email_hash: &str,
        client: &ClientMeta,
    ) -> AuthResult<PendingOutcome>;

    /// Confirm a pending registration and materialize the user.
    ///
    /// The store is the sole authority on token expiry and duplicate
    /// users; failures arrive as one of the five named registration
    /// conditions (pending-user-not-found, invalid-token,
    /// token-expired, registration-expired, user-already-exists).
    /// Returns the new user id.
    async fn confirm_pending_user(
        &self,
        app_id: i64,
        token_hash: &[u8],
        password_hash: &str,
        client: &ClientMeta,
    ) -> AuthResult<i64>;

    /// Look up a user by namespaced email hash
    async fn find_user_by_email_hash(
        &self,
        email_hash: &str,
        app_id: i64,
    ) -> AuthResult<Option<UserRecord>>;

    /// Persist a new session (hashes only) and return its expiries
    async fn create_session(
        &self,
        app_id: i64,
        user_id: i64,
        access_token_hash: &[u8],
        refresh_token_hash: &[u8],
        client: &ClientMeta,
    ) -> AuthResult<SessionExpiry>;

    /// Persist a new MFA challenge (hash only); short TTL, single use
    async fn create_mfa_challenge(
        &self,
        app_id: i64,
        user_id: i64,
        challenge_token_hash: &[u8],
        client: &ClientMeta,
    ) -> AuthResult<()>;

    /// Resolve the TOTP secret behind a live challenge token hash
    async fn find_totp_secret_by_challenge_hash(
        &self,
        token_hash: &[u8],
    ) -> AuthResult<Option<TotpChallenge>>;

    /// Mark a TOTP secret as confirmed (enrollment complete); idempotent
    async fn confirm_totp_secret(&self, totp_secret_id: i64) -> AuthResult<()>;

    /// Store a freshly generated TOTP secret for a user
    async fn insert_totp_secret(
        &self,
        user_id: i64,
        secret_encrypted: &str,
        secret_hash: &str,
        key_version: i32,
    ) -> AuthResult<()>;

    /// Resolve a live access-token session from its hash
    async fn find_access_session(&self, token_hash: &[u8]) -> AuthResult<Option<AccessSession>>;

    /// Application display name (email personalization)
    async fn application_name(&self, app_id: i64) -> AuthResult<Option<String>>;
}

/// Outbound email message
///
/// Built by value with named fields; the template variables are typed
/// per template rather than passed as a loose map.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub template: EmailTemplate,
}

/// Known email templates and their variables
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    /// Registration verification email
    RegistrationVerification {
        /// Application display name
        app_name: String,
        /// Confirmation URL carrying the plaintext verification token
        confirmation_url: String,
        /// Human-readable expiry in the requester's timezone
        expires_at: String,
    },
}

/// Outbound email capability.
///
/// Fire-and-forget: `enqueue` returns immediately and the core never
/// awaits delivery confirmation.
pub trait Mailer: Send + Sync {
    fn enqueue(&self, message: EmailMessage);
}
