//! Registration Use Cases
//!
//! Two-step registration: start (pending user + verification email)
//! and confirm (token-bound user materialization).
//!
//! The start path always answers with a content-less success and holds
//! its response to a latency floor, so neither the response body nor
//! the response time reveals whether an email is already registered.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use platform::client::ClientMeta;
use platform::password::ClearTextPassword;
use platform::token::SecurityToken;
use rand::Rng;
use tokio::time::Instant;

use crate::application::config::{AuthConfig, RESPONSE_JITTER_MAX_MS};
use crate::domain::repository::{AuthStore, EmailMessage, EmailTemplate, Mailer};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Registration start input
pub struct RegisterInput {
    pub app_id: i64,
    pub email: String,
    /// Base URL the confirmation link is built from
    pub confirmation_url: String,
    /// Requester's IANA timezone for expiry formatting
    pub timezone: Option<String>,
}

/// Start-registration use case
pub struct StartRegistrationUseCase<S, M>
where
    S: AuthStore,
    M: Mailer,
{
    store: Arc<S>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<S, M> StartRegistrationUseCase<S, M>
where
    S: AuthStore,
    M: Mailer,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Create a pending registration and enqueue the verification
    /// email. Returns `Ok(())` on both the fresh and the duplicate
    /// branch; only unexpected store failures error out.
    pub async fn execute(&self, input: RegisterInput, client: ClientMeta) -> AuthResult<()> {
        let started = Instant::now();
        let floor = self.config.response_floor
            + Duration::from_millis(rand::rng().random_range(0..=RESPONSE_JITTER_MAX_MS));

        let email = Email::new(input.email)?;
        let verification_token = SecurityToken::generate();

        let outcome = self
            .store
            .create_pending_user(
                input.app_id,
                &self.config.token_hasher().hash(&verification_token),
                &self.config.cipher().encrypt(email.original())?,
                &email.lookup_hash(input.app_id),
                &client,
            )
            .await?;

        // Latency floor: the duplicate no-op branch must be
        // indistinguishable by timing from the fresh write + email
        // branch. The sleep yields; it never blocks the runtime.
        let elapsed = started.elapsed();
        if elapsed < floor {
            tokio::time::sleep(floor - elapsed).await;
        }

        let Some(expires_at) = outcome.expires_at() else {
            tracing::info!(app_id = input.app_id, "Duplicate registration suppressed");
            return Ok(());
        };

        let expires_at_formatted = format_expiry(expires_at, input.timezone.as_deref());

        let app_name = self
            .store
            .application_name(input.app_id)
            .await?
            .unwrap_or_else(|| "Application".to_string());

        self.mailer.enqueue(EmailMessage {
            recipients: vec![email.original().to_string()],
            subject: format!("{app_name} - Email Verification"),
            template: EmailTemplate::RegistrationVerification {
                app_name,
                confirmation_url: format!(
                    "{}?token={}",
                    input.confirmation_url,
                    verification_token.as_str()
                ),
                expires_at: expires_at_formatted,
            },
        });

        tracing::info!(app_id = input.app_id, "Pending registration created");

        Ok(())
    }
}

/// Format the token expiry for the requester's timezone, falling back
/// to UTC when the timezone is absent or unknown.
fn format_expiry(expires_at: DateTime<Utc>, timezone: Option<&str>) -> String {
    match timezone.and_then(|name| name.parse::<Tz>().ok()) {
        Some(tz) => expires_at
            .with_timezone(&tz)
            .format("%B %d, %Y at %I:%M %p %Z")
            .to_string(),
        None => expires_at.format("%B %d, %Y at %I:%M %p UTC").to_string(),
    }
}

/// Confirm-registration use case
pub struct ConfirmRegistrationUseCase<S>
where
    S: AuthStore,
{
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> ConfirmRegistrationUseCase<S>
where
    S: AuthStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    /// Validate and hash the new password, then hand the token hash to
    /// the store's confirm operation. The store alone decides token
    /// expiry and duplicate users; this layer only relays its verdict.
    /// Returns the new user id.
    pub async fn execute(
        &self,
        app_id: i64,
        token: SecurityToken,
        password: String,
        client: ClientMeta,
    ) -> AuthResult<i64> {
        let password = ClearTextPassword::new(password)?;

        // Argon2id is memory-hard by design; keep it off the async runtime
        let pepper = self.config.password_pepper.clone();
        let password_hash = tokio::task::spawn_blocking(move || password.hash(&pepper))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))??;

        let user_id = self
            .store
            .confirm_pending_user(
                app_id,
                &self.config.token_hasher().hash(&token),
                password_hash.as_phc_string(),
                &client,
            )
            .await?;

        tracing::info!(user_id, app_id, "Registration confirmed, user created");

        Ok(user_id)
    }
}
