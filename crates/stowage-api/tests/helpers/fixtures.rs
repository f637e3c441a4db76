//! Request builders and sample file contents.

use axum_test::multipart::{MultipartForm, Part};

/// 18 bytes, uploaded in one shot by most scenarios.
pub const SAMPLE_CONTENT: &[u8] = b"Test file content\n";

pub const SIX_LINES: &[u8] = b"Line 1\nLine 2\nLine 3\nLine 4\nLine 5\nLine 6\n";

pub fn file_part(filename: &str, content: &[u8]) -> Part {
    Part::bytes(content.to_vec())
        .file_name(filename.to_string())
        .mime_type("text/csv")
}

/// Multipart form with one `files` part per `(filename, content)` pair.
pub fn upload_form(files: &[(&str, &[u8])]) -> MultipartForm {
    files
        .iter()
        .fold(MultipartForm::new(), |form, (filename, content)| {
            form.add_part("files", file_part(filename, content))
        })
}
