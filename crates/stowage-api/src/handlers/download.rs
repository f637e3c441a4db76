use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use futures::StreamExt;
use stowage_core::AppError;

#[utoipa::path(
    get,
    path = "/download/{key}",
    tag = "files",
    params(("key" = String, Path, description = "File ID or filename")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 502, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "download_file"))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let download = state.retrieval.download(&key).await?;
    let record = download.record;

    // Wrap storage stream for axum Body
    let body_stream = download.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&record.filename),
        )
        .header(header::CONTENT_LENGTH, record.uploaded_size)
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// `attachment` disposition with the stored name, quoted-string escaped.
fn content_disposition(filename: &str) -> String {
    let escaped: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    format!("attachment; filename=\"{}\"", escaped)
}
