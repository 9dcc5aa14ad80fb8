//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use crate::state::{AppState, Backend};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadyChecks {
    pub database: CheckResult,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    pub latency_ms: u64,
}

/// GET /health - Liveness probe (fast, no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "auth-api",
    })
}

/// GET /ready - Readiness probe (checks DB connectivity)
pub async fn ready<B: Backend>(
    State(state): State<AppState<B>>,
) -> (StatusCode, Json<ReadyResponse>) {
    let start = Instant::now();
    let database_ok = state.readiness.is_ready().await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (status, code) = if database_ok {
        ("ready", StatusCode::OK)
    } else {
        ("unavailable", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(ReadyResponse {
            status,
            service: "auth-api",
            checks: ReadyChecks {
                database: CheckResult {
                    status: if database_ok { "ok" } else { "error" },
                    latency_ms,
                },
            },
        }),
    )
}
