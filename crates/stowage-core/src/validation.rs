//! Input validation shared by the HTTP surface, the CLI and the transfer engine

use crate::constants::{MAX_ENCODED_FILENAME_LENGTH, MAX_FILENAME_LENGTH};
use crate::error::AppError;

/// Client message returned when an extension is not on the allow-list.
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";

/// Content type recorded when the client does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Validate a filename used as the natural key of a file record.
///
/// Filenames are stored verbatim, so only names that cannot be mapped to a
/// single object key are rejected.
pub fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.trim().is_empty() {
        return Err(AppError::InvalidInput("Filename must not be empty".to_string()));
    }

    if filename == "." || filename == ".." {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    if filename.contains(['/', '\\', '\0']) {
        return Err(AppError::InvalidInput(
            "Filename must not contain path separators".to_string(),
        ));
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Filename exceeds {} bytes",
            MAX_FILENAME_LENGTH
        )));
    }

    // Non-ASCII bytes triple in size once encoded into the storage key.
    if urlencoding::encode(filename).len() > MAX_ENCODED_FILENAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Filename is too long once encoded for storage (limit {} bytes)",
            MAX_ENCODED_FILENAME_LENGTH
        )));
    }

    Ok(())
}

/// Lowercased extension of `filename`, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Validate file extension against the allow-list. An empty list accepts anything.
pub fn validate_file_extension(filename: &str, allowed_extensions: &[String]) -> Result<(), AppError> {
    if allowed_extensions.is_empty() {
        return Ok(());
    }

    match file_extension(filename) {
        Some(ext) if allowed_extensions.iter().any(|allowed| *allowed == ext) => Ok(()),
        _ => Err(AppError::InvalidInput(FILE_TYPE_NOT_ALLOWED.to_string())),
    }
}

/// Validate file size
pub fn validate_file_size(file_size: u64, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size as u64 {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Normalize a declared content type, falling back to `application/octet-stream`.
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    match content_type.map(str::trim) {
        Some(ct) if !ct.is_empty() => ct.to_string(),
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
