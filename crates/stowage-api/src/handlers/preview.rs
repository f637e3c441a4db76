use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use stowage_core::constants::DEFAULT_PREVIEW_LINES;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PreviewQuery {
    /// Number of leading lines to return (default 5, at most 100)
    pub lines: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/preview/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "File ID or filename"),
        PreviewQuery
    ),
    responses(
        (status = 200, description = "Leading lines of the file", body = Vec<String>),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "preview_file"))]
pub async fn preview_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Vec<String>>, HttpAppError> {
    let lines = query.lines.unwrap_or(DEFAULT_PREVIEW_LINES);
    Ok(Json(state.retrieval.preview(&key, lines).await?))
}
