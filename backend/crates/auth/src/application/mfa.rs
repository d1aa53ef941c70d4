//! MFA Use Cases
//!
//! TOTP enrollment (setup + first confirmation) and the challenge that
//! bridges a verified-password login to a verified-TOTP login.

use std::sync::Arc;

use platform::client::ClientMeta;
use platform::hashing::hash_field;
use platform::otp::{generate_otp_secret, verify_otp};
use platform::token::SecurityToken;

use crate::application::config::AuthConfig;
use crate::application::login::AuthenticatedUser;
use crate::application::session::SessionIssuer;
use crate::domain::entity::session::IssuedSession;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

/// TOTP secret schema version written on enrollment
const TOTP_KEY_VERSION: i32 = 1;

/// TOTP setup output.
///
/// The only response that ever carries the plaintext secret; after
/// this it exists only encrypted at rest.
pub struct TotpSetupOutput {
    /// Base32 secret for the authenticator app
    pub secret: String,
    /// Challenge token for the confirmation step
    pub challenge_token: String,
}

/// TOTP setup use case
pub struct SetupTotpUseCase<S>
where
    S: AuthStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SetupTotpUseCase<S>
where
    S: AuthStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Generate a secret, store it encrypted (unconfirmed), and mint
    /// the challenge the user answers to complete enrollment.
    pub async fn execute(
        &self,
        app_id: i64,
        user_id: i64,
        client: ClientMeta,
    ) -> AuthResult<TotpSetupOutput> {
        let secret = generate_otp_secret();

        self.store
            .insert_totp_secret(
                user_id,
                &self.config.cipher().encrypt(&secret)?,
                &hash_field(&secret, &app_id.to_string()),
                TOTP_KEY_VERSION,
            )
            .await?;

        let challenge_token = SessionIssuer::new(self.store.clone(), self.config.clone())
            .create_mfa_challenge(app_id, user_id, &client)
            .await?;

        tracing::info!(user_id, app_id, "TOTP setup initiated");

        Ok(TotpSetupOutput {
            secret,
            challenge_token,
        })
    }
}

/// MFA confirmation use case
pub struct ConfirmMfaUseCase<S>
where
    S: AuthStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> ConfirmMfaUseCase<S>
where
    S: AuthStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Verify a TOTP code against the challenge's secret and issue the
    /// full login session.
    ///
    /// A wrong code leaves the challenge untouched so the user can
    /// retry within its TTL. The first successful check marks the
    /// secret confirmed - exactly once, and only after verification.
    pub async fn execute(
        &self,
        challenge_token: SecurityToken,
        totp_code: String,
        client: ClientMeta,
    ) -> AuthResult<(AuthenticatedUser, IssuedSession)> {
        let challenge = self
            .store
            .find_totp_secret_by_challenge_hash(&self.config.token_hasher().hash(&challenge_token))
            .await?
            .ok_or(AuthError::ChallengeNotFound)?;

        // A tag failure here is stored-data corruption, surfaced as an
        // opaque internal error via From<EncryptionError>
        let secret = self.config.cipher().decrypt(&challenge.secret_encrypted)?;

        let code_valid =
            tokio::task::spawn_blocking(move || verify_otp(&secret, &totp_code, "TOTP", 0))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?;

        if !code_valid {
            return Err(AuthError::InvalidOtp);
        }

        if challenge.is_enrollment() {
            self.store
                .confirm_totp_secret(challenge.totp_secret_id)
                .await?;

            tracing::info!(
                user_id = challenge.user_id,
                app_id = challenge.app_id,
                "TOTP enrollment confirmed"
            );
        }

        let session = SessionIssuer::new(self.store.clone(), self.config.clone())
            .create_login_session(challenge.app_id, challenge.user_id, &client)
            .await?;

        tracing::info!(
            user_id = challenge.user_id,
            app_id = challenge.app_id,
            "User logged in via MFA"
        );

        Ok((
            AuthenticatedUser {
                id: challenge.user_id,
                is_email_verified: challenge.is_email_verified,
                is_2fa_enabled: true,
            },
            session,
        ))
    }
}
