//! Session & Challenge Issuer
//!
//! Mints opaque access/refresh/challenge tokens. Ordering is always
//! persist-hash-first, return-plaintext-second: a store call that
//! fails or is cancelled can never leave a usable half-issued session,
//! because the plaintext is only released after the hashes are
//! durable. The store-side procedures write the audit record (IP,
//! user agent, timestamp) within the same call.

use std::sync::Arc;

use platform::client::ClientMeta;
use platform::token::SecurityToken;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::IssuedSession;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

/// Issues login sessions and MFA challenge sessions
pub struct SessionIssuer<S>
where
    S: AuthStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SessionIssuer<S>
where
    S: AuthStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Create a full login session.
    ///
    /// Generates two independent tokens, persists only their HMAC
    /// hashes with client metadata, and returns the plaintext pair -
    /// the only point plaintext session tokens exist outside the HTTP
    /// transport layer.
    pub async fn create_login_session(
        &self,
        app_id: i64,
        user_id: i64,
        client: &ClientMeta,
    ) -> AuthResult<IssuedSession> {
        let hasher = self.config.token_hasher();

        let access_token = SecurityToken::generate();
        let refresh_token = SecurityToken::generate();

        let expiry = self
            .store
            .create_session(
                app_id,
                user_id,
                &hasher.hash(&access_token),
                &hasher.hash(&refresh_token),
                client,
            )
            .await?;

        tracing::info!(user_id, app_id, "Login session created");

        Ok(IssuedSession {
            access_token: access_token.into_string(),
            refresh_token: refresh_token.into_string(),
            access_expires_at: expiry.access_expires_at,
            refresh_expires_at: expiry.refresh_expires_at,
        })
    }

    /// Create an MFA challenge session and return the challenge token.
    ///
    /// Single-use semantics are enforced by the store; the challenge
    /// is consumed through `confirm_totp_secret` only after a TOTP
    /// code verifies, never before.
    pub async fn create_mfa_challenge(
        &self,
        app_id: i64,
        user_id: i64,
        client: &ClientMeta,
    ) -> AuthResult<String> {
        let hasher = self.config.token_hasher();
        let challenge_token = SecurityToken::generate();

        self.store
            .create_mfa_challenge(app_id, user_id, &hasher.hash(&challenge_token), client)
            .await?;

        tracing::info!(user_id, app_id, "MFA challenge session created");

        Ok(challenge_token.into_string())
    }
}
