//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use stowage_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stowage API",
        version = "0.1.0",
        description = "Resumable chunked file uploads with progress tracking, download and preview."
    ),
    paths(
        handlers::root::root,
        handlers::upload::upload_files,
        handlers::files::list_files,
        handlers::download::download_file,
        handlers::preview::preview_file,
        handlers::progress::get_progress,
        handlers::progress::list_progress,
    ),
    components(schemas(
        models::FileSummary,
        models::FileProgress,
        models::UploadStatus,
        handlers::root::RootResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "files", description = "Upload, list, download and preview files"),
        (name = "progress", description = "Upload progress"),
        (name = "service", description = "Service information")
    )
)]
pub struct ApiDoc;
