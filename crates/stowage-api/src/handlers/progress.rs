use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use stowage_core::FileProgress;

#[utoipa::path(
    get,
    path = "/progress/{key}",
    tag = "progress",
    params(("key" = String, Path, description = "File ID or filename")),
    responses(
        (status = 200, description = "Upload progress", body = FileProgress),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_progress"))]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FileProgress>, HttpAppError> {
    Ok(Json(state.retrieval.get_progress(&key).await?))
}

#[utoipa::path(
    get,
    path = "/progress",
    tag = "progress",
    responses(
        (status = 200, description = "Progress of every file", body = Vec<FileProgress>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_progress(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileProgress>>, HttpAppError> {
    Ok(Json(state.retrieval.list_progress().await?))
}
