use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Transfer state of a file record.
///
/// Only ever moves forward: `in_progress -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    InProgress,
    Completed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::InProgress => "in_progress",
            UploadStatus::Completed => "completed",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(UploadStatus::InProgress),
            "completed" => Ok(UploadStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Metadata tracking one logical file's transfer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
    pub uploaded_size: u64,
    pub storage_path: String,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_completed(&self) -> bool {
        self.status == UploadStatus::Completed
    }
}

/// Values supplied when a record is first created.
///
/// `uploaded_size` and `status` are not part of it: every new record starts
/// at zero bytes, in progress.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
    pub storage_path: String,
}

/// Listing entry returned by `GET /files` and by upload responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileSummary {
    pub id: Uuid,
    pub filename: String,
    pub status: UploadStatus,
    pub uploaded_size: u64,
    pub file_size: u64,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        FileSummary {
            id: record.id,
            filename: record.filename.clone(),
            status: record.status,
            uploaded_size: record.uploaded_size,
            file_size: record.file_size,
        }
    }
}

impl From<FileRecord> for FileSummary {
    fn from(record: FileRecord) -> Self {
        FileSummary::from(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [UploadStatus::InProgress, UploadStatus::Completed] {
            assert_eq!(status.as_str().parse::<UploadStatus>().unwrap(), status);
        }
        assert!("failed".parse::<UploadStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&UploadStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
