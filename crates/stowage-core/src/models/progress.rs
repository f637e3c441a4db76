use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::file_record::{FileRecord, UploadStatus};

/// Progress view derived from a [`FileRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileProgress {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_size: u64,
    pub file_size: u64,
    /// Percentage of bytes durably written, always within `0..=100`.
    pub percentage: f64,
    pub status: UploadStatus,
}

/// `uploaded / total * 100`, or `0` for an empty file.
pub fn progress_percentage(uploaded_size: u64, file_size: u64) -> f64 {
    if file_size == 0 {
        return 0.0;
    }
    let pct = (uploaded_size as f64 / file_size as f64) * 100.0;
    pct.clamp(0.0, 100.0)
}

impl From<&FileRecord> for FileProgress {
    fn from(record: &FileRecord) -> Self {
        FileProgress {
            id: record.id,
            filename: record.filename.clone(),
            uploaded_size: record.uploaded_size,
            file_size: record.file_size,
            percentage: progress_percentage(record.uploaded_size, record.file_size),
            status: record.status,
        }
    }
}
