//! Application-layer scenario tests against an in-memory store double.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use platform::client::ClientMeta;
use platform::password::ClearTextPassword;
use platform::token::SecurityToken;
use tokio::time::Instant;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::application::config::AuthConfig;
use crate::application::login::{LoginInput, LoginOutcome, LoginUseCase};
use crate::application::mfa::{ConfirmMfaUseCase, SetupTotpUseCase};
use crate::application::register::{
    ConfirmRegistrationUseCase, RegisterInput, StartRegistrationUseCase,
};
use crate::application::session::SessionIssuer;
use crate::domain::entity::{
    pending::PendingOutcome,
    session::{AccessSession, SessionExpiry},
    totp::TotpChallenge,
    user::UserRecord,
};
use crate::domain::repository::{AuthStore, EmailMessage, Mailer};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// In-memory store double
// ============================================================================

#[derive(Default)]
struct MemStoreState {
    /// (app_id, email_hash) -> pending expiry
    pending: HashMap<(i64, String), chrono::DateTime<Utc>>,
    /// (app_id, email_hash) -> user
    users: HashMap<(i64, String), UserRecord>,
    /// persisted session token hash pairs
    sessions: Vec<(Vec<u8>, Vec<u8>)>,
    /// challenge token hash -> secret row
    challenges: HashMap<Vec<u8>, TotpChallenge>,
    /// ids passed to confirm_totp_secret, in call order
    confirmed_secret_ids: Vec<i64>,
    /// rows written by insert_totp_secret
    totp_secrets: Vec<(i64, String, String, i32)>,
}

#[derive(Default)]
struct MemStore {
    state: Mutex<MemStoreState>,
}

impl MemStore {
    fn with_user(self, app_id: i64, email_hash: &str, user: UserRecord) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert((app_id, email_hash.to_string()), user);
        self
    }

    fn with_challenge(self, token_hash: Vec<u8>, challenge: TotpChallenge) -> Self {
        self.state.lock().unwrap().challenges.insert(token_hash, challenge);
        self
    }

    fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    fn confirmed_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().confirmed_secret_ids.clone()
    }
}

impl AuthStore for MemStore {
    async fn create_pending_user(
        &self,
        app_id: i64,
        _token_hash: &[u8],
        _email_encrypted: &str,
        email_hash: &str,
        _client: &ClientMeta,
    ) -> AuthResult<PendingOutcome> {
        let mut state = self.state.lock().unwrap();
        let key = (app_id, email_hash.to_string());
        if state.pending.contains_key(&key) || state.users.contains_key(&key) {
            return Ok(PendingOutcome::Duplicate);
        }
        let expires_at = Utc::now() + ChronoDuration::hours(24);
        state.pending.insert(key, expires_at);
        Ok(PendingOutcome::Created { expires_at })
    }

    async fn confirm_pending_user(
        &self,
        _app_id: i64,
        _token_hash: &[u8],
        _password_hash: &str,
        _client: &ClientMeta,
    ) -> AuthResult<i64> {
        Ok(42)
    }

    async fn find_user_by_email_hash(
        &self,
        email_hash: &str,
        app_id: i64,
    ) -> AuthResult<Option<UserRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&(app_id, email_hash.to_string())).cloned())
    }

    async fn create_session(
        &self,
        _app_id: i64,
        _user_id: i64,
        access_token_hash: &[u8],
        refresh_token_hash: &[u8],
        _client: &ClientMeta,
    ) -> AuthResult<SessionExpiry> {
        let mut state = self.state.lock().unwrap();
        state
            .sessions
            .push((access_token_hash.to_vec(), refresh_token_hash.to_vec()));
        Ok(SessionExpiry {
            access_expires_at: Utc::now() + ChronoDuration::minutes(15),
            refresh_expires_at: Utc::now() + ChronoDuration::days(7),
        })
    }

    async fn create_mfa_challenge(
        &self,
        app_id: i64,
        user_id: i64,
        challenge_token_hash: &[u8],
        _client: &ClientMeta,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        state.challenges.insert(
            challenge_token_hash.to_vec(),
            TotpChallenge {
                totp_secret_id: 1,
                user_id,
                app_id,
                secret_encrypted: String::new(),
                confirmed_at: None,
                is_email_verified: true,
            },
        );
        Ok(())
    }

    async fn find_totp_secret_by_challenge_hash(
        &self,
        token_hash: &[u8],
    ) -> AuthResult<Option<TotpChallenge>> {
        let state = self.state.lock().unwrap();
        Ok(state.challenges.get(token_hash).cloned())
    }

    async fn confirm_totp_secret(&self, totp_secret_id: i64) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        state.confirmed_secret_ids.push(totp_secret_id);
        for challenge in state.challenges.values_mut() {
            if challenge.totp_secret_id == totp_secret_id {
                challenge.confirmed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn insert_totp_secret(
        &self,
        user_id: i64,
        secret_encrypted: &str,
        secret_hash: &str,
        key_version: i32,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().unwrap();
        state.totp_secrets.push((
            user_id,
            secret_encrypted.to_string(),
            secret_hash.to_string(),
            key_version,
        ));
        Ok(())
    }

    async fn find_access_session(&self, _token_hash: &[u8]) -> AuthResult<Option<AccessSession>> {
        Ok(None)
    }

    async fn application_name(&self, _app_id: i64) -> AuthResult<Option<String>> {
        Ok(Some("Acme Notes".to_string()))
    }
}

#[derive(Default)]
struct MemMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemMailer {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Mailer for MemMailer {
    fn enqueue(&self, message: EmailMessage) {
        self.sent.lock().unwrap().push(message);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::with_random_secrets())
}

fn client() -> ClientMeta {
    ClientMeta::new(Some("203.0.113.9".parse().unwrap()), Some("test-agent".to_string()))
}

fn register_input(email: &str) -> RegisterInput {
    RegisterInput {
        app_id: 1,
        email: email.to_string(),
        confirmation_url: "https://app.example.com/confirm".to_string(),
        timezone: None,
    }
}

fn user_record(config: &AuthConfig, password: &str, is_2fa: bool, suspended: bool) -> UserRecord {
    let clear = ClearTextPassword::new_unchecked(password.to_string());
    UserRecord {
        id: 7,
        app_id: 1,
        password_hash: clear.hash(&config.password_pepper).unwrap(),
        is_email_verified: true,
        is_2fa_enabled: is_2fa,
        is_suspended: suspended,
        failed_login_count: 0,
        last_login_at: None,
        created_at: Utc::now(),
    }
}

fn current_code(secret_base32: &str) -> String {
    let secret = Secret::Encoded(secret_base32.to_string()).to_bytes().unwrap();
    TOTP::new(Algorithm::SHA1, 6, 1, 30, secret, None, String::new())
        .unwrap()
        .generate_current()
        .unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_fresh_email_enqueues_one_email_and_holds_floor() {
    let store = Arc::new(MemStore::default());
    let mailer = Arc::new(MemMailer::default());
    let use_case = StartRegistrationUseCase::new(store.clone(), mailer.clone(), config());

    let started = Instant::now();
    use_case
        .execute(register_input("a@x.com"), client())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(450));
    assert_eq!(mailer.sent_count(), 1);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent[0].recipients, vec!["a@x.com".to_string()]);
    assert_eq!(sent[0].subject, "Acme Notes - Email Verification");
}

#[tokio::test]
async fn register_duplicate_is_silent_and_holds_floor() {
    let store = Arc::new(MemStore::default());
    let mailer = Arc::new(MemMailer::default());
    let use_case = StartRegistrationUseCase::new(store.clone(), mailer.clone(), config());

    use_case
        .execute(register_input("a@x.com"), client())
        .await
        .unwrap();
    assert_eq!(mailer.sent_count(), 1);

    // Same address again, before confirmation: same success, no email
    let started = Instant::now();
    let second = use_case.execute(register_input("a@x.com"), client()).await;

    assert!(second.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(450));
    assert_eq!(mailer.sent_count(), 1);
}

#[tokio::test]
async fn register_alias_counts_as_duplicate() {
    let store = Arc::new(MemStore::default());
    let mailer = Arc::new(MemMailer::default());
    let use_case = StartRegistrationUseCase::new(store.clone(), mailer.clone(), config());

    use_case
        .execute(register_input("user@example.com"), client())
        .await
        .unwrap();
    use_case
        .execute(register_input("User+promo@example.com"), client())
        .await
        .unwrap();

    assert_eq!(mailer.sent_count(), 1);
}

#[tokio::test]
async fn register_confirmation_url_carries_plaintext_token() {
    let store = Arc::new(MemStore::default());
    let mailer = Arc::new(MemMailer::default());
    let use_case = StartRegistrationUseCase::new(store.clone(), mailer.clone(), config());

    use_case
        .execute(register_input("a@x.com"), client())
        .await
        .unwrap();

    let sent = mailer.sent.lock().unwrap();
    let crate::domain::repository::EmailTemplate::RegistrationVerification {
        confirmation_url,
        ..
    } = &sent[0].template;
    assert!(confirmation_url.starts_with("https://app.example.com/confirm?token="));
    let token = confirmation_url.rsplit('=').next().unwrap();
    assert_eq!(token.len(), 43);
}

#[tokio::test]
async fn confirm_registration_rejects_weak_password() {
    let store = Arc::new(MemStore::default());
    let use_case = ConfirmRegistrationUseCase::new(store, config());

    let err = use_case
        .execute(1, SecurityToken::generate(), "weak".to_string(), client())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn confirm_registration_returns_new_user_id() {
    let store = Arc::new(MemStore::default());
    let use_case = ConfirmRegistrationUseCase::new(store, config());

    let user_id = use_case
        .execute(
            1,
            SecurityToken::generate(),
            "Sufficiently#Strong9Pass".to_string(),
            client(),
        )
        .await
        .unwrap();

    assert_eq!(user_id, 42);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_unknown_email_and_wrong_password_are_uniform() {
    let config = config();
    let email = crate::domain::value_object::email::Email::new("known@x.com").unwrap();
    let store = Arc::new(MemStore::default().with_user(
        1,
        &email.lookup_hash(1),
        user_record(&config, "Correct#Horse7Battery", false, false),
    ));
    let use_case = LoginUseCase::new(store, config);

    let unknown = use_case
        .execute(
            LoginInput {
                app_id: 1,
                email: "nobody@x.com".to_string(),
                password: "Correct#Horse7Battery".to_string(),
            },
            client(),
        )
        .await
        .unwrap_err();

    let wrong = use_case
        .execute(
            LoginInput {
                app_id: 1,
                email: "known@x.com".to_string(),
                password: "Wrong#Horse7Battery".to_string(),
            },
            client(),
        )
        .await
        .unwrap_err();

    // Same caller-visible condition for both causes
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.status_code(), wrong.status_code());
}

#[tokio::test]
async fn login_suspended_account_is_forbidden() {
    let config = config();
    let email = crate::domain::value_object::email::Email::new("sus@x.com").unwrap();
    let store = Arc::new(MemStore::default().with_user(
        1,
        &email.lookup_hash(1),
        user_record(&config, "Correct#Horse7Battery", false, true),
    ));
    let use_case = LoginUseCase::new(store, config);

    let err = use_case
        .execute(
            LoginInput {
                app_id: 1,
                email: "sus@x.com".to_string(),
                password: "Correct#Horse7Battery".to_string(),
            },
            client(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AccountSuspended));
}

#[tokio::test]
async fn login_without_2fa_issues_session() {
    let config = config();
    let email = crate::domain::value_object::email::Email::new("user@x.com").unwrap();
    let store = Arc::new(MemStore::default().with_user(
        1,
        &email.lookup_hash(1),
        user_record(&config, "Correct#Horse7Battery", false, false),
    ));
    let use_case = LoginUseCase::new(store.clone(), config.clone());

    let outcome = use_case
        .execute(
            LoginInput {
                app_id: 1,
                email: "user@x.com".to_string(),
                password: "Correct#Horse7Battery".to_string(),
            },
            client(),
        )
        .await
        .unwrap();

    let LoginOutcome::Session { user, session } = outcome else {
        panic!("expected full session");
    };
    assert_eq!(user.id, 7);
    assert!(user.is_email_verified);
    assert!(!user.is_2fa_enabled);
    assert_ne!(session.access_token, session.refresh_token);
    assert!(session.refresh_expires_at > session.access_expires_at);

    // Only hashes were persisted, and they match the plaintext tokens
    assert_eq!(store.session_count(), 1);
    let state = store.state.lock().unwrap();
    let (access_hash, refresh_hash) = &state.sessions[0];
    let hasher = config.token_hasher();
    assert!(hasher.verify(&SecurityToken::from_client(session.access_token.clone()), access_hash));
    assert!(hasher.verify(&SecurityToken::from_client(session.refresh_token.clone()), refresh_hash));
}

#[tokio::test]
async fn login_with_2fa_returns_challenge_without_session() {
    let config = config();
    let email = crate::domain::value_object::email::Email::new("user@x.com").unwrap();
    let store = Arc::new(MemStore::default().with_user(
        1,
        &email.lookup_hash(1),
        user_record(&config, "Correct#Horse7Battery", true, false),
    ));
    let use_case = LoginUseCase::new(store.clone(), config);

    let outcome = use_case
        .execute(
            LoginInput {
                app_id: 1,
                email: "user@x.com".to_string(),
                password: "Correct#Horse7Battery".to_string(),
            },
            client(),
        )
        .await
        .unwrap();

    let LoginOutcome::MfaRequired { user, challenge_token } = outcome else {
        panic!("expected MFA challenge");
    };
    assert!(user.is_2fa_enabled);
    assert!(!challenge_token.is_empty());
    assert_eq!(store.session_count(), 0);
}

// ============================================================================
// MFA confirmation
// ============================================================================

fn seeded_challenge(
    config: &AuthConfig,
    secret_base32: &str,
    confirmed: bool,
) -> (Arc<MemStore>, SecurityToken) {
    let token = SecurityToken::generate();
    let token_hash = config.token_hasher().hash(&token).to_vec();
    let store = MemStore::default().with_challenge(
        token_hash,
        TotpChallenge {
            totp_secret_id: 11,
            user_id: 7,
            app_id: 1,
            secret_encrypted: config.cipher().encrypt(secret_base32).unwrap(),
            confirmed_at: confirmed.then(Utc::now),
            is_email_verified: true,
        },
    );
    (Arc::new(store), token)
}

#[tokio::test]
async fn confirm_mfa_unknown_challenge_fails() {
    let config = config();
    let store = Arc::new(MemStore::default());
    let use_case = ConfirmMfaUseCase::new(store, config);

    let err = use_case
        .execute(SecurityToken::generate(), "123456".to_string(), client())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ChallengeNotFound));
}

#[tokio::test]
async fn confirm_mfa_wrong_code_keeps_challenge_alive() {
    let config = config();
    let secret = platform::otp::generate_otp_secret();
    let (store, token) = seeded_challenge(&config, &secret, true);
    let use_case = ConfirmMfaUseCase::new(store.clone(), config.clone());

    let code = current_code(&secret);
    let wrong = if code == "000000" { "000001" } else { "000000" };

    let err = use_case
        .execute(
            SecurityToken::from_client(token.as_str().to_string()),
            wrong.to_string(),
            client(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOtp));
    assert_eq!(store.session_count(), 0);

    // The challenge was not consumed; a retry with the right code works
    let (_, session) = use_case
        .execute(token, current_code(&secret), client())
        .await
        .unwrap();
    assert!(!session.access_token.is_empty());
    assert_eq!(store.session_count(), 1);
}

#[tokio::test]
async fn confirm_mfa_first_success_confirms_enrollment_once() {
    let config = config();
    let secret = platform::otp::generate_otp_secret();
    let (store, token) = seeded_challenge(&config, &secret, false);
    let use_case = ConfirmMfaUseCase::new(store.clone(), config);

    let (user, _session) = use_case
        .execute(token.clone(), current_code(&secret), client())
        .await
        .unwrap();

    assert!(user.is_2fa_enabled);
    assert_eq!(store.confirmed_ids(), vec![11]);

    // A later confirmation against the now-confirmed secret does not
    // re-confirm
    let _ = use_case
        .execute(token, current_code(&secret), client())
        .await
        .unwrap();
    assert_eq!(store.confirmed_ids(), vec![11]);
}

#[tokio::test]
async fn confirm_mfa_already_confirmed_skips_confirm_call() {
    let config = config();
    let secret = platform::otp::generate_otp_secret();
    let (store, token) = seeded_challenge(&config, &secret, true);
    let use_case = ConfirmMfaUseCase::new(store.clone(), config);

    use_case
        .execute(token, current_code(&secret), client())
        .await
        .unwrap();

    assert!(store.confirmed_ids().is_empty());
    assert_eq!(store.session_count(), 1);
}

// ============================================================================
// TOTP setup
// ============================================================================

#[tokio::test]
async fn setup_totp_stores_encrypted_secret_and_mints_challenge() {
    let config = config();
    let store = Arc::new(MemStore::default());
    let use_case = SetupTotpUseCase::new(store.clone(), config.clone());

    let output = use_case.execute(1, 7, client()).await.unwrap();

    assert!(!output.secret.is_empty());
    assert!(!output.challenge_token.is_empty());

    let state = store.state.lock().unwrap();
    assert_eq!(state.totp_secrets.len(), 1);
    let (user_id, secret_encrypted, secret_hash, key_version) = &state.totp_secrets[0];
    assert_eq!(*user_id, 7);
    assert_eq!(*key_version, 1);
    // Secret is stored encrypted, never in the clear
    assert_ne!(secret_encrypted, &output.secret);
    assert_eq!(config.cipher().decrypt(secret_encrypted).unwrap(), output.secret);
    assert_eq!(
        secret_hash,
        &platform::hashing::hash_field(&output.secret, "1")
    );
    // The challenge row exists for the confirmation step
    assert_eq!(state.challenges.len(), 1);
}

// ============================================================================
// Session issuer
// ============================================================================

#[tokio::test]
async fn issuer_persists_hashes_before_returning_plaintext() {
    let config = config();
    let store = Arc::new(MemStore::default());
    let issuer = SessionIssuer::new(store.clone(), config.clone());

    let session = issuer
        .create_login_session(1, 7, &client())
        .await
        .unwrap();

    let state = store.state.lock().unwrap();
    assert_eq!(state.sessions.len(), 1);
    let hasher = config.token_hasher();
    assert!(hasher.verify(
        &SecurityToken::from_client(session.access_token),
        &state.sessions[0].0
    ));
}
