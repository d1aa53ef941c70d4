//! PostgreSQL Store Implementation
//!
//! The durable store is a set of stored procedures; this adapter only
//! calls them with named arguments and maps their outcomes. Procedures
//! signal business conditions with custom SQLSTATE codes (class `AU`),
//! which are translated to the error taxonomy exactly once, here.
//! Message text is never inspected. Codes this adapter does not know
//! stay as opaque database errors.

use chrono::{DateTime, Utc};
use platform::client::ClientMeta;
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::{
    pending::PendingOutcome,
    session::{AccessSession, SessionExpiry},
    totp::TotpChallenge,
    user::UserRecord,
};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};

// SQLSTATE codes raised by the auth procedures (custom class "AU")
const SQLSTATE_PENDING_NOT_FOUND: &str = "AU001";
const SQLSTATE_INVALID_TOKEN: &str = "AU002";
const SQLSTATE_TOKEN_EXPIRED: &str = "AU003";
const SQLSTATE_REGISTRATION_EXPIRED: &str = "AU004";
const SQLSTATE_USER_EXISTS: &str = "AU005";
// Standard integrity-constraint violation (duplicate key)
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed auth store
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// SQLSTATE of a sqlx error, when it carries one
fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.to_string())
}

/// Translate the confirm-registration procedure's named conditions.
/// Unknown codes propagate unchanged as opaque database errors.
fn map_confirm_error(err: sqlx::Error) -> AuthError {
    match sqlstate(&err).as_deref() {
        Some(SQLSTATE_PENDING_NOT_FOUND) => AuthError::PendingUserNotFound,
        Some(SQLSTATE_INVALID_TOKEN) => AuthError::InvalidToken,
        Some(SQLSTATE_TOKEN_EXPIRED) => AuthError::TokenExpired,
        Some(SQLSTATE_REGISTRATION_EXPIRED) => AuthError::RegistrationExpired,
        Some(SQLSTATE_USER_EXISTS) => AuthError::UserAlreadyExists,
        _ => AuthError::Database(err),
    }
}

impl AuthStore for PgAuthStore {
    async fn create_pending_user(
        &self,
        app_id: i64,
        token_hash: &[u8],
        email_encrypted: &str,
        email_hash: &str,
        client: &ClientMeta,
    ) -> AuthResult<PendingOutcome> {
        let result = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT register_pending_user(
                p_app_id => $1,
                p_token_hash => $2,
                p_email_encrypted => $3,
                p_email_hash => $4,
                p_ip_address => $5,
                p_user_agent => $6
            )
            "#,
        )
        .bind(app_id)
        .bind(token_hash)
        .bind(email_encrypted)
        .bind(email_hash)
        .bind(client.ip_string())
        .bind(client.user_agent_or_empty())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(expires_at) => Ok(PendingOutcome::Created { expires_at }),
            // The uniqueness constraint on (app_id, email_hash) is the
            // arbiter of duplicate registrations; the loser's write is
            // the silent no-op branch, not an error
            Err(err) if sqlstate(&err).as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION) => {
                Ok(PendingOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn confirm_pending_user(
        &self,
        app_id: i64,
        token_hash: &[u8],
        password_hash: &str,
        client: &ClientMeta,
    ) -> AuthResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT confirm_pending_user(
                p_app_id => $1,
                p_token_hash => $2,
                p_password_hash => $3,
                p_ip_address => $4,
                p_user_agent => $5
            )
            "#,
        )
        .bind(app_id)
        .bind(token_hash)
        .bind(password_hash)
        .bind(client.ip_string())
        .bind(client.user_agent_or_empty())
        .fetch_one(&self.pool)
        .await
        .map_err(map_confirm_error)
    }

    async fn find_user_by_email_hash(
        &self,
        email_hash: &str,
        app_id: i64,
    ) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                app_id,
                password_hash,
                is_email_verified,
                is_2fa_enabled,
                is_suspended,
                failed_login_count,
                last_login_at,
                created_at
            FROM get_user_by_email_hash(
                p_email_hash => $1,
                p_app_id => $2
            )
            "#,
        )
        .bind(email_hash)
        .bind(app_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn create_session(
        &self,
        app_id: i64,
        user_id: i64,
        access_token_hash: &[u8],
        refresh_token_hash: &[u8],
        client: &ClientMeta,
    ) -> AuthResult<SessionExpiry> {
        let (access_expires_at, refresh_expires_at) =
            sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
                r#"
                SELECT access_expires_at, refresh_expires_at
                FROM create_session(
                    p_app_id => $1,
                    p_user_id => $2,
                    p_access_token_hash => $3,
                    p_refresh_token_hash => $4,
                    p_ip_address => $5,
                    p_user_agent => $6
                )
                "#,
            )
            .bind(app_id)
            .bind(user_id)
            .bind(access_token_hash)
            .bind(refresh_token_hash)
            .bind(client.ip_string())
            .bind(client.user_agent_or_empty())
            .fetch_one(&self.pool)
            .await?;

        Ok(SessionExpiry {
            access_expires_at,
            refresh_expires_at,
        })
    }

    async fn create_mfa_challenge(
        &self,
        app_id: i64,
        user_id: i64,
        challenge_token_hash: &[u8],
        client: &ClientMeta,
    ) -> AuthResult<()> {
        sqlx::query(
            r#"
            CALL create_mfa_challenge_session(
                p_app_id => $1,
                p_user_id => $2,
                p_challenge_token_hash => $3,
                p_ip_address => $4,
                p_user_agent => $5
            )
            "#,
        )
        .bind(app_id)
        .bind(user_id)
        .bind(challenge_token_hash)
        .bind(client.ip_string())
        .bind(client.user_agent_or_empty())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_totp_secret_by_challenge_hash(
        &self,
        token_hash: &[u8],
    ) -> AuthResult<Option<TotpChallenge>> {
        let row = sqlx::query_as::<_, TotpChallengeRow>(
            r#"
            SELECT
                totp_secret_id,
                user_id,
                app_id,
                secret_encrypted,
                confirmed_at,
                is_email_verified
            FROM get_totp_secret(p_token_hash => $1)
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TotpChallengeRow::into_challenge))
    }

    async fn confirm_totp_secret(&self, totp_secret_id: i64) -> AuthResult<()> {
        sqlx::query("CALL confirm_totp_secret(p_totp_secret_id => $1)")
            .bind(totp_secret_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_totp_secret(
        &self,
        user_id: i64,
        secret_encrypted: &str,
        secret_hash: &str,
        key_version: i32,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            CALL insert_totp_secret(
                p_user_id => $1,
                p_secret_encrypted => $2,
                p_secret_hash => $3,
                p_key_version => $4
            )
            "#,
        )
        .bind(user_id)
        .bind(secret_encrypted)
        .bind(secret_hash)
        .bind(key_version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if sqlstate(&err).as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION) => {
                Err(AuthError::Validation("TOTP setup failed".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_access_session(&self, token_hash: &[u8]) -> AuthResult<Option<AccessSession>> {
        let row = sqlx::query_as::<_, AccessSessionRow>(
            r#"
            SELECT user_id, app_id, expires_at
            FROM get_access_token(p_token_hash => $1)
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccessSessionRow::into_session))
    }

    async fn application_name(&self, app_id: i64) -> AuthResult<Option<String>> {
        let name = sqlx::query_scalar::<_, Option<String>>(
            "SELECT get_application_name(p_app_id => $1)",
        )
        .bind(app_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(name)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    app_id: i64,
    password_hash: String,
    is_email_verified: bool,
    is_2fa_enabled: bool,
    is_suspended: bool,
    failed_login_count: i32,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> UserRecord {
        UserRecord {
            id: self.id,
            app_id: self.app_id,
            password_hash: HashedPassword::from_phc_string(self.password_hash),
            is_email_verified: self.is_email_verified,
            is_2fa_enabled: self.is_2fa_enabled,
            is_suspended: self.is_suspended,
            failed_login_count: self.failed_login_count,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TotpChallengeRow {
    totp_secret_id: i64,
    user_id: i64,
    app_id: i64,
    secret_encrypted: String,
    confirmed_at: Option<DateTime<Utc>>,
    is_email_verified: bool,
}

impl TotpChallengeRow {
    fn into_challenge(self) -> TotpChallenge {
        TotpChallenge {
            totp_secret_id: self.totp_secret_id,
            user_id: self.user_id,
            app_id: self.app_id,
            secret_encrypted: self.secret_encrypted,
            confirmed_at: self.confirmed_at,
            is_email_verified: self.is_email_verified,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccessSessionRow {
    user_id: i64,
    app_id: i64,
    expires_at: DateTime<Utc>,
}

impl AccessSessionRow {
    fn into_session(self) -> AccessSession {
        AccessSession {
            user_id: self.user_id,
            app_id: self.app_id,
            expires_at: self.expires_at,
        }
    }
}
