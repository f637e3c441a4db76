use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use stowage_core::FileSummary;

#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Every known file", body = Vec<FileSummary>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileSummary>>, HttpAppError> {
    let records = state.retrieval.list_files().await?;
    Ok(Json(records.into_iter().map(FileSummary::from).collect()))
}
