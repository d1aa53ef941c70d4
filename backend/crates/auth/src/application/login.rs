//! Login Use Case
//!
//! Password verification with an optional branch into an MFA
//! challenge. Unknown email and wrong password produce the same
//! caller-visible failure; only logging sees the difference.

use std::sync::Arc;

use platform::client::ClientMeta;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session::SessionIssuer;
use crate::domain::entity::session::IssuedSession;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub app_id: i64,
    pub email: String,
    pub password: String,
}

/// Non-sensitive user fields echoed in login responses
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub is_email_verified: bool,
    pub is_2fa_enabled: bool,
}

/// Outcome of a successful password verification
#[derive(Debug)]
pub enum LoginOutcome {
    /// 2FA disabled: a full session was issued
    Session {
        user: AuthenticatedUser,
        session: IssuedSession,
    },
    /// 2FA enabled: a challenge must be answered first, no session yet
    MfaRequired {
        user: AuthenticatedUser,
        challenge_token: String,
    },
}

/// Login use case
pub struct LoginUseCase<S>
where
    S: AuthStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> LoginUseCase<S>
where
    S: AuthStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub async fn execute(&self, input: LoginInput, client: ClientMeta) -> AuthResult<LoginOutcome> {
        // A malformed address cannot match any user; same uniform failure
        let email = Email::new(input.email).map_err(|_| AuthError::unknown_email())?;

        let user = self
            .store
            .find_user_by_email_hash(&email.lookup_hash(input.app_id), input.app_id)
            .await?
            .ok_or_else(AuthError::unknown_email)?;

        // Argon2id verification is memory-hard; keep it off the async runtime
        let password = ClearTextPassword::new_unchecked(input.password);
        let stored_hash = user.password_hash.clone();
        let pepper = self.config.password_pepper.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || stored_hash.verify(&password, &pepper))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?;

        if !password_valid {
            return Err(AuthError::wrong_password());
        }

        if user.is_suspended {
            return Err(AuthError::AccountSuspended);
        }

        let authenticated = AuthenticatedUser {
            id: user.id,
            is_email_verified: user.is_email_verified,
            is_2fa_enabled: user.is_2fa_enabled,
        };

        let issuer = SessionIssuer::new(self.store.clone(), self.config.clone());

        if user.is_2fa_enabled {
            let challenge_token = issuer
                .create_mfa_challenge(input.app_id, user.id, &client)
                .await?;

            tracing::info!(user_id = user.id, app_id = input.app_id, "Login pending MFA");

            return Ok(LoginOutcome::MfaRequired {
                user: authenticated,
                challenge_token,
            });
        }

        let session = issuer
            .create_login_session(input.app_id, user.id, &client)
            .await?;

        tracing::info!(user_id = user.id, app_id = input.app_id, "User logged in");

        Ok(LoginOutcome::Session {
            user: authenticated,
            session,
        })
    }
}
