//! API key management for the calling user

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use warden_axum::RequireAuth;
use warden_types::{ApiKeyId, ApiKeySummary, UsagePoint};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, Backend};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApiKey {
    pub id: ApiKeyId,
    /// Shown once; only a digest of its secret is kept
    pub key: String,
    pub created_at: DateTime<Utc>,
}

/// POST /api/api-keys
pub async fn create_api_key<B: Backend>(
    State(state): State<AppState<B>>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let generated = state.auth.generate_api_key(auth.user_id()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedApiKey {
            id: generated.id,
            key: generated.key,
            created_at: generated.created_at,
        }),
    ))
}

/// GET /api/api-keys
pub async fn list_api_keys<B: Backend>(
    State(state): State<AppState<B>>,
    auth: RequireAuth,
) -> ApiResult<Json<Vec<ApiKeySummary>>> {
    Ok(Json(state.auth.list_api_keys(auth.user_id()).await?))
}

/// DELETE /api/api-keys/{id}
pub async fn revoke_api_key<B: Backend>(
    State(state): State<AppState<B>>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let key_id = ApiKeyId::parse(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.auth.revoke_api_key(auth.user_id(), key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/api-keys/usage
pub async fn usage_stats<B: Backend>(
    State(state): State<AppState<B>>,
    auth: RequireAuth,
) -> ApiResult<Json<Vec<UsagePoint>>> {
    Ok(Json(state.auth.api_key_usage_stats(auth.user_id()).await?))
}
