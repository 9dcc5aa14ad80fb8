//! Warden Auth API
//!
//! HTTP service for signup, login, sessions and API keys.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use warden_axum::{GateConfig, RequestGateLayer, SharedAuthenticator};

use crate::state::{AppState, Backend};

/// Build the application router.
///
/// Everything except the gate's exempt paths requires a bearer credential.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
    let authenticator: SharedAuthenticator = state.auth.clone();
    let gate = RequestGateLayer::new(authenticator, GateConfig::default());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready::<B>))
        .route("/api/auth/signup", post(handlers::signup::<B>))
        .route("/api/auth/login", post(handlers::login::<B>))
        .route("/api/auth/logout", post(handlers::logout::<B>))
        .route("/api/auth/me", get(handlers::me))
        .route(
            "/api/api-keys",
            post(handlers::create_api_key::<B>).get(handlers::list_api_keys::<B>),
        )
        .route("/api/api-keys/usage", get(handlers::usage_stats::<B>))
        .route("/api/api-keys/{id}", delete(handlers::revoke_api_key::<B>))
        .layer(gate)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
