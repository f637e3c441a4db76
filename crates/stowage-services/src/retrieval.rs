//! Progress reporting, listing, download and preview of stored files

use futures::StreamExt;
use std::sync::Arc;
use stowage_core::constants::MAX_PREVIEW_LINES;
use stowage_core::models::{FileProgress, FileRecord};
use stowage_core::AppError;
use stowage_db::FileRecordRepository;
use stowage_storage::{ByteStream, Storage, StorageError};
use uuid::Uuid;

/// A record together with a lazily read stream of its stored bytes.
pub struct FileDownload {
    pub record: FileRecord,
    pub stream: ByteStream,
}

#[derive(Clone)]
pub struct RetrievalService {
    repository: Arc<dyn FileRecordRepository>,
    storage: Arc<dyn Storage>,
    preview_max_bytes: u64,
}

impl RetrievalService {
    pub fn new(
        repository: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn Storage>,
        preview_max_bytes: u64,
    ) -> Self {
        Self {
            repository,
            storage,
            preview_max_bytes,
        }
    }

    /// Look up a record by id (when `key` parses as a UUID) or by filename.
    pub async fn find(&self, key: &str) -> Result<FileRecord, AppError> {
        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(record) = self.repository.find_by_id(id).await? {
                return Ok(record);
            }
        }

        self.repository
            .find_by_filename(key)
            .await?
            .ok_or_else(|| AppError::NotFound(key.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_progress(&self, key: &str) -> Result<FileProgress, AppError> {
        let record = self.find(key).await?;
        Ok(FileProgress::from(&record))
    }

    /// Progress of every file. Each record is read independently.
    pub async fn list_progress(&self) -> Result<Vec<FileProgress>, AppError> {
        let records = self.repository.list().await?;
        Ok(records.iter().map(FileProgress::from).collect())
    }

    pub async fn list_files(&self) -> Result<Vec<FileRecord>, AppError> {
        self.repository.list().await
    }

    /// Stream the durable bytes of a file.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, key: &str) -> Result<FileDownload, AppError> {
        let record = self.find(key).await?;

        let stream = self
            .storage
            .read_stream(&record.storage_path, Some(record.uploaded_size))
            .await
            .map_err(|e| object_error(&record, e))?;

        let file_id = record.id;
        let stream = stream
            .map(move |item| {
                if let Err(ref e) = item {
                    tracing::warn!(error = %e, file_id = %file_id, "Download stream interrupted");
                }
                item
            })
            .boxed();

        tracing::info!(
            file_id = %record.id,
            storage_path = %record.storage_path,
            size_bytes = record.uploaded_size,
            "Streaming file"
        );

        Ok(FileDownload { record, stream })
    }

    /// First `max_lines` lines of a file, read from a bounded prefix.
    #[tracing::instrument(skip(self))]
    pub async fn preview(&self, key: &str, max_lines: usize) -> Result<Vec<String>, AppError> {
        let record = self.find(key).await?;
        let max_lines = max_lines.min(MAX_PREVIEW_LINES);
        let limit = self.preview_max_bytes.min(record.uploaded_size);

        let bytes = self
            .storage
            .read_range(&record.storage_path, 0..limit)
            .await
            .map_err(|e| object_error(&record, e))?;

        let truncated = limit < record.uploaded_size;
        Ok(split_preview(&bytes, max_lines, truncated))
    }
}

fn object_error(record: &FileRecord, e: StorageError) -> AppError {
    if e.is_not_found() {
        tracing::warn!(
            file_id = %record.id,
            storage_path = %record.storage_path,
            "Record exists but object is missing"
        );
        AppError::ObjectNotFound(record.storage_path.clone())
    } else {
        AppError::Storage(e.to_string())
    }
}

/// Decode `bytes` leniently and return up to `max_lines` lines.
///
/// When the prefix was cut short, a trailing line without its terminator is
/// incomplete and dropped (unless it is the only line).
fn split_preview(bytes: &[u8], max_lines: usize, truncated: bool) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    if truncated && !text.ends_with('\n') && lines.len() > 1 {
        lines.pop();
    }

    lines.truncate(max_lines);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use stowage_core::models::{NewFileRecord, UploadStatus};
    use stowage_db::InMemoryFileRecordRepository;
    use stowage_storage::LocalStorage;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        repo: InMemoryFileRecordRepository,
        storage: Arc<LocalStorage>,
        service: RetrievalService,
    }

    async fn fixture(preview_max_bytes: u64) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let repo = InMemoryFileRecordRepository::new();
        let service =
            RetrievalService::new(Arc::new(repo.clone()), storage.clone(), preview_max_bytes);
        Fixture {
            _dir: dir,
            repo,
            storage,
            service,
        }
    }

    /// Store `content` and record `uploaded` of `total` bytes as done.
    async fn seed(f: &Fixture, filename: &str, content: &[u8], total: u64) -> FileRecord {
        let record = f
            .repo
            .create(NewFileRecord {
                filename: filename.to_string(),
                content_type: "text/csv".to_string(),
                file_size: total,
                storage_path: format!("uploads/{}", filename),
            })
            .await
            .unwrap();
        f.storage
            .write_chunk(&record.storage_path, 0, Bytes::copy_from_slice(content))
            .await
            .unwrap();
        let record = f
            .repo
            .advance_progress(record.id, 0, content.len() as u64)
            .await
            .unwrap();
        f.repo.mark_completed(record.id).await.unwrap().unwrap_or(record)
    }

    #[tokio::test]
    async fn progress_of_completed_file_is_hundred_percent() {
        let f = fixture(1024).await;
        seed(&f, "test.csv", b"Test file content\n", 18).await;

        let progress = f.service.get_progress("test.csv").await.unwrap();
        assert_eq!(progress.percentage, 100.0);
        assert_eq!(progress.status, UploadStatus::Completed);
        assert_eq!(progress.uploaded_size, progress.file_size);
    }

    #[tokio::test]
    async fn progress_by_id_and_partial_percentage() {
        let f = fixture(1024).await;
        let record = seed(&f, "half.csv", b"abcde", 10).await;

        let progress = f.service.get_progress(&record.id.to_string()).await.unwrap();
        assert_eq!(progress.filename, "half.csv");
        assert_eq!(progress.percentage, 50.0);
        assert_eq!(progress.status, UploadStatus::InProgress);
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let f = fixture(1024).await;
        let random_id = Uuid::new_v4().to_string();

        for key in ["nope.csv", random_id.as_str()] {
            assert!(matches!(
                f.service.get_progress(key).await,
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(
                f.service.download(key).await,
                Err(AppError::NotFound(_))
            ));
            assert!(matches!(
                f.service.preview(key, 5).await,
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_object_is_distinguished_from_missing_record() {
        let f = fixture(1024).await;
        let record = seed(&f, "gone.csv", b"data", 4).await;
        f.storage.delete(&record.storage_path).await.unwrap();

        assert!(matches!(
            f.service.download("gone.csv").await,
            Err(AppError::ObjectNotFound(_))
        ));
        assert!(matches!(
            f.service.preview("gone.csv", 5).await,
            Err(AppError::ObjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn download_streams_only_durable_bytes() {
        let f = fixture(1024).await;
        let record = seed(&f, "d.csv", b"0123456789", 20).await;
        // stale tail beyond the recorded progress
        f.storage
            .write_chunk(&record.storage_path, 10, Bytes::from_static(b"XYZ"))
            .await
            .unwrap();

        let mut download = f.service.download("d.csv").await.unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = download.stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(body, b"0123456789");
        assert_eq!(download.record.filename, "d.csv");
    }

    #[tokio::test]
    async fn preview_returns_first_five_lines() {
        let f = fixture(1024).await;
        let content = b"Line 1\nLine 2\nLine 3\nLine 4\nLine 5\nLine 6\n";
        seed(&f, "lines.csv", content, content.len() as u64).await;

        let lines = f.service.preview("lines.csv", 5).await.unwrap();
        assert_eq!(lines, ["Line 1", "Line 2", "Line 3", "Line 4", "Line 5"]);
    }

    #[tokio::test]
    async fn preview_reads_a_bounded_prefix() {
        let f = fixture(16).await;
        let content = b"aaaa\nbbbb\ncccccccccccccccc\ndddd\n";
        seed(&f, "wide.csv", content, content.len() as u64).await;

        // 16 bytes cover "aaaa\nbbbb\ncccccc"; the cut line is dropped
        let lines = f.service.preview("wide.csv", 5).await.unwrap();
        assert_eq!(lines, ["aaaa", "bbbb"]);
    }

    #[tokio::test]
    async fn list_progress_covers_every_file() {
        let f = fixture(1024).await;
        seed(&f, "one.csv", b"1", 1).await;
        seed(&f, "two.csv", b"2", 4).await;

        let all = f.service.list_progress().await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, ["one.csv", "two.csv"]);
        assert_eq!(all[1].percentage, 25.0);

        assert_eq!(f.service.list_files().await.unwrap().len(), 2);
    }

    #[test]
    fn split_preview_handles_crlf_and_invalid_utf8() {
        let lines = split_preview(b"a,b\r\nc,\xffd\r\n", 5, false);
        assert_eq!(lines, ["a,b", "c,\u{fffd}d"]);
        assert!(split_preview(b"", 5, false).is_empty());
        assert_eq!(split_preview(b"x\ny\n", 0, false).len(), 0);
    }
}
