//! Multipart upload handler
//!
//! Each file part is spooled to an anonymous temporary file so its size is
//! known before the transfer engine starts, and memory stays bounded no matter
//! how large the part is.
//!
//! Parts are processed in order. The first failing part ends the request with
//! its error, while parts before it stay committed.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::{AppState, UploadLimits};
use axum::{
    extract::{multipart::Field, Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use stowage_core::validation::{
    normalize_content_type, validate_file_extension, validate_file_size, validate_filename,
};
use stowage_core::{AppError, FileSummary};
use stowage_services::{InboundFile, UploadRequest};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use utoipa::IntoParams;

/// Multipart field names that carry file data.
const FILE_FIELDS: [&str; 2] = ["files", "file"];

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// File offset of the first byte in each part (resume from an earlier attempt)
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    params(UploadQuery),
    description = "Parts are stored in order. If a part fails, the request returns that part's \
        error and earlier parts stay committed; check `/progress/{filename}` to see what was stored.",
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 200, description = "State of every uploaded file", body = Vec<FileSummary>),
        (status = 400, description = "Invalid file name or type", body = ErrorResponse),
        (status = 409, description = "Upload conflicts with recorded progress", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Storage write failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_files"))]
pub async fn upload_files(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<FileSummary>>, HttpAppError> {
    let offset = query.offset.unwrap_or(0);
    let mut results = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let is_file = field
            .name()
            .is_some_and(|name| FILE_FIELDS.contains(&name));
        if !is_file {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        validate_filename(&filename)?;
        validate_file_extension(&filename, &state.limits.allowed_extensions)?;
        let content_type = normalize_content_type(field.content_type());

        let (spool, part_size) = spool_field(field, &state.limits).await?;

        let total_size = offset.checked_add(part_size).ok_or_else(|| {
            AppError::InvalidInput(format!("Offset {} is out of range", offset))
        })?;
        validate_file_size(total_size, state.limits.max_file_size)?;

        tracing::info!(
            filename = %filename,
            size_bytes = part_size,
            total_size,
            "Handing file to transfer engine"
        );

        let record = state
            .transfer
            .upload(
                UploadRequest {
                    filename,
                    content_type,
                    total_size,
                },
                InboundFile {
                    reader: spool,
                    starts_at: offset,
                },
            )
            .await?;

        results.push(FileSummary::from(record));
    }

    if results.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()).into());
    }

    Ok(Json(results))
}

/// Copy a multipart field into a temporary file and rewind it.
async fn spool_field(
    mut field: Field<'_>,
    limits: &UploadLimits,
) -> Result<(tokio::fs::File, u64), HttpAppError> {
    let std_file = tempfile::tempfile()
        .map_err(|e| AppError::Internal(format!("Failed to create spool file: {}", e)))?;
    let mut spool = tokio::fs::File::from_std(std_file);
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await? {
        written += chunk.len() as u64;
        validate_file_size(written, limits.max_file_size)?;
        spool.write_all(&chunk).await.map_err(AppError::from)?;
    }

    spool.flush().await.map_err(AppError::from)?;
    spool.rewind().await.map_err(AppError::from)?;
    Ok((spool, written))
}
