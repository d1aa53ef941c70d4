//! Auth Router

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AuthStore, Mailer};
use crate::infra::email::SmtpMailer;
use crate::infra::postgres::PgAuthStore;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with the PostgreSQL store and SMTP mailer
pub fn auth_router(store: PgAuthStore, mailer: SmtpMailer, config: AuthConfig) -> Router {
    auth_router_generic(store, mailer, config)
}

/// Create a generic Auth router for any store/mailer implementation
pub fn auth_router_generic<S, M>(store: S, mailer: M, config: AuthConfig) -> Router
where
    S: AuthStore + Send + Sync + 'static,
    M: Mailer + 'static,
{
    let state = AuthAppState {
        store: Arc::new(store),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/register", post(handlers::register::<S, M>))
        .route("/register/confirm", post(handlers::confirm_registration::<S, M>))
        .route("/login", post(handlers::login::<S, M>))
        .route("/mfa/totp/setup", post(handlers::totp_setup::<S, M>))
        .route("/mfa/totp/challenge", post(handlers::totp_challenge::<S, M>))
        .with_state(state)
}
