//! Authentication handlers (signup, login, logout, me)

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_auth_core::SignupRequest;
use warden_axum::{bearer_token, RequireAuth};
use warden_types::{CredentialKind, UserProfile};

use crate::error::ApiResult;
use crate::state::{AppState, Backend};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    /// Email address or username
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserProfile,
    pub credential_type: CredentialKind,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
pub async fn signup<B: Backend>(
    State(state): State<AppState<B>>,
    Json(body): Json<SignupBody>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .auth
        .signup(SignupRequest {
            email: body.email,
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/auth/login
///
/// Verify a password and start a session
pub async fn login<B: Backend>(
    State(state): State<AppState<B>>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state.auth.login(&body.identifier, &body.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at,
        user: outcome.profile,
    }))
}

/// POST /api/auth/logout
///
/// Delete the session held by the presented token
pub async fn logout<B: Backend>(
    State(state): State<AppState<B>>,
    auth: RequireAuth,
    headers: HeaderMap,
) -> ApiResult<Json<LogoutResponse>> {
    if let Some(token) = bearer_token(&headers) {
        state.auth.logout(&token).await?;
    }

    tracing::info!(user_id = %auth.user_id(), "Logged out");
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/auth/me
pub async fn me(auth: RequireAuth) -> Json<MeResponse> {
    let RequireAuth(context) = auth;
    Json(MeResponse {
        user: context.profile,
        credential_type: context.kind,
    })
}
