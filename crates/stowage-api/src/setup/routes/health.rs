//! Health check handlers and response types.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Key probed on the object store; its absence is a healthy answer.
const PROBE_KEY: &str = "health-check-non-existent-key";

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

async fn check_dependencies(state: &AppState) -> HealthCheckResponse {
    let database = run_check(TIMEOUT, state.repository.ping(), "unhealthy").await;
    let storage = run_check(
        TIMEOUT,
        async { state.storage.exists(PROBE_KEY).await.map(drop) },
        "unhealthy",
    )
    .await;

    let healthy = database == "healthy" && storage == "healthy";
    HealthCheckResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        database,
        storage,
    }
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Health check of the metadata store and the object store.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = check_dependencies(&state).await;
    let status_code = if response.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response))
}

/// Readiness probe - both stores must answer.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = check_dependencies(&state).await;
    let ready = checks.status == "healthy";
    if !ready {
        tracing::error!(
            database = %checks.database,
            storage = %checks.storage,
            "Readiness check failed"
        );
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "database": checks.database,
            "storage": checks.storage,
        })),
    )
}
