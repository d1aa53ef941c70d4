//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use std::sync::Arc;

use platform::client::extract_client_meta;
use platform::cookie::{CookieConfig, SameSite};
use platform::token::SecurityToken;

use crate::application::config::AuthConfig;
use crate::application::{
    ConfirmMfaUseCase, ConfirmRegistrationUseCase, LoginInput, LoginOutcome, LoginUseCase,
    RegisterInput, SetupTotpUseCase, StartRegistrationUseCase,
};
use crate::domain::entity::session::{AccessSession, IssuedSession};
use crate::domain::repository::{AuthStore, Mailer};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    RegisterConfirmationRequest, RegisterConfirmationResponse, RegisterRequest,
    TotpChallengeRequest, TotpSetupResponse, UserLogin2faResponse, UserLoginRequest,
    UserLoginResponse,
};

/// Header carrying the MFA challenge token
const CHALLENGE_HEADER: &str = "x-totp-challenge";

/// Shared state for auth handlers
pub struct AuthAppState<S, M>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    pub store: Arc<S>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

impl<S, M> Clone for AuthAppState<S, M>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/auth/register
///
/// Always answers 204 No Content, for the fresh and the duplicate
/// branch alike - the response carries no signal about whether the
/// email was already registered.
pub async fn register<S, M>(
    State(state): State<AuthAppState<S, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<StatusCode>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let client = extract_client_meta(&headers, Some(addr.ip()));

    let use_case = StartRegistrationUseCase::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        app_id: req.app_id,
        email: req.email,
        confirmation_url: req.confirmation_url,
        timezone: req.timezone,
    };

    use_case.execute(input, client).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/register/confirm
pub async fn confirm_registration<S, M>(
    State(state): State<AuthAppState<S, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<RegisterConfirmationRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let token = bearer_token(&headers, header::AUTHORIZATION.as_str())?;
    let client = extract_client_meta(&headers, Some(addr.ip()));

    let use_case = ConfirmRegistrationUseCase::new(state.store.clone(), state.config.clone());

    let user_id = use_case
        .execute(req.app_id, token, req.password, client)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterConfirmationResponse { user_id }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<S, M>(
    State(state): State<AuthAppState<S, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<UserLoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let client = extract_client_meta(&headers, Some(addr.ip()));

    let use_case = LoginUseCase::new(state.store.clone(), state.config.clone());

    let input = LoginInput {
        app_id: req.app_id,
        email: req.email,
        password: req.password,
    };

    match use_case.execute(input, client).await? {
        LoginOutcome::MfaRequired {
            user,
            challenge_token,
        } => Ok((
            StatusCode::OK,
            Json(UserLogin2faResponse {
                id: user.id,
                is_email_verified: user.is_email_verified,
                is_2fa_enabled: user.is_2fa_enabled,
                challenge_token,
            }),
        )
            .into_response()),
        LoginOutcome::Session { user, session } => Ok((
            StatusCode::OK,
            session_cookies(&state.config, &session),
            Json(UserLoginResponse {
                id: user.id,
                is_email_verified: user.is_email_verified,
                is_2fa_enabled: user.is_2fa_enabled,
            }),
        )
            .into_response()),
    }
}

// ============================================================================
// MFA
// ============================================================================

/// POST /api/auth/mfa/totp/setup
///
/// Requires a valid access token; enrolls a TOTP secret for the
/// authenticated user.
pub async fn totp_setup<S, M>(
    State(state): State<AuthAppState<S, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> AuthResult<Json<TotpSetupResponse>>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let session = require_access_session(&state, &headers).await?;
    let client = extract_client_meta(&headers, Some(addr.ip()));

    let use_case = SetupTotpUseCase::new(state.store.clone(), state.config.clone());

    let output = use_case
        .execute(session.app_id, session.user_id, client)
        .await?;

    Ok(Json(TotpSetupResponse {
        secret: output.secret,
        challenge_token: output.challenge_token,
    }))
}

/// POST /api/auth/mfa/totp/challenge
///
/// Completes the MFA step: verifies the TOTP code behind the challenge
/// token and issues the full session.
pub async fn totp_challenge<S, M>(
    State(state): State<AuthAppState<S, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<TotpChallengeRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let challenge_token = bearer_token(&headers, CHALLENGE_HEADER)?;
    let client = extract_client_meta(&headers, Some(addr.ip()));

    let use_case = ConfirmMfaUseCase::new(state.store.clone(), state.config.clone());

    let (user, session) = use_case.execute(challenge_token, req.code, client).await?;

    Ok((
        StatusCode::OK,
        session_cookies(&state.config, &session),
        Json(UserLoginResponse {
            id: user.id,
            is_email_verified: user.is_email_verified,
            is_2fa_enabled: user.is_2fa_enabled,
        }),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract a `Bearer <token>` value from the named header
fn bearer_token(headers: &HeaderMap, name: &str) -> AuthResult<SecurityToken> {
    let value = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingAuthorization)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }

    Ok(SecurityToken::from_client(token))
}

/// Resolve the access-token session behind the Authorization header
async fn require_access_session<S, M>(
    state: &AuthAppState<S, M>,
    headers: &HeaderMap,
) -> AuthResult<AccessSession>
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let token = bearer_token(headers, header::AUTHORIZATION.as_str())?;
    let token_hash = state.config.token_hasher().hash(&token);

    state
        .store
        .find_access_session(&token_hash)
        .await?
        .ok_or(AuthError::InvalidAccessToken)
}

/// Build the secure cookie pair carrying the session tokens.
///
/// The access cookie spans the whole API; the refresh cookie is scoped
/// to the refresh endpoint so the longer-lived token is only ever sent
/// there.
fn session_cookies(
    config: &AuthConfig,
    session: &IssuedSession,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let access = CookieConfig {
        name: config.access_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: SameSite::Strict,
        path: "/".to_string(),
    };
    let refresh = CookieConfig {
        name: config.refresh_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: SameSite::Strict,
        path: config.refresh_cookie_path.clone(),
    };

    AppendHeaders([
        (
            header::SET_COOKIE,
            access.build_set_cookie(&session.access_token, session.access_expires_at),
        ),
        (
            header::SET_COOKIE,
            refresh.build_set_cookie(&session.refresh_token, session.refresh_expires_at),
        ),
    ])
}
