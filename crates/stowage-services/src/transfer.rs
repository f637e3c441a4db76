//! Chunked transfer engine
//!
//! Moves an inbound byte stream into the object store one chunk at a time and
//! records progress after every chunk, so an interrupted upload can resume from
//! the last durable byte.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use stowage_core::models::{FileRecord, NewFileRecord};
use stowage_core::validation::validate_filename;
use stowage_core::AppError;
use stowage_db::FileRecordRepository;
use stowage_storage::{storage_path_for, Storage};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::locks::FilenameLocks;

/// What the caller declares about the file being uploaded.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    /// Total byte length of the complete file.
    pub total_size: u64,
}

/// Source of upload bytes.
pub struct InboundFile<R> {
    pub reader: R,
    /// File offset of the first byte `reader` yields.
    pub starts_at: u64,
}

impl<R> InboundFile<R> {
    /// A stream carrying the whole file from its first byte.
    pub fn whole(reader: R) -> Self {
        Self {
            reader,
            starts_at: 0,
        }
    }
}

#[derive(Clone)]
pub struct TransferEngine {
    repository: Arc<dyn FileRecordRepository>,
    storage: Arc<dyn Storage>,
    chunk_size: usize,
    locks: FilenameLocks,
}

impl TransferEngine {
    pub fn new(
        repository: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn Storage>,
        chunk_size: usize,
    ) -> Self {
        Self {
            repository,
            storage,
            chunk_size: chunk_size.max(1),
            locks: FilenameLocks::new(),
        }
    }

    /// Upload (or resume uploading) `request.filename` from `inbound`.
    ///
    /// Returns the record as it stands after the call: `completed` when every
    /// byte is stored, otherwise `in_progress` at the last durable offset.
    #[tracing::instrument(
        skip(self, request, inbound),
        fields(
            filename = %request.filename,
            total_size = request.total_size,
            starts_at = inbound.starts_at
        )
    )]
    pub async fn upload<R>(
        &self,
        request: UploadRequest,
        mut inbound: InboundFile<R>,
    ) -> Result<FileRecord, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        validate_filename(&request.filename)?;

        let _guard = self.locks.acquire(&request.filename).await;
        let start = Instant::now();

        let mut record = match self.repository.find_by_filename(&request.filename).await? {
            Some(existing) => existing,
            None => self.create_record(&request).await?,
        };

        if record.is_completed() {
            tracing::info!(file_id = %record.id, "File already uploaded, nothing to do");
            return Ok(record);
        }

        if record.file_size != request.total_size {
            return Err(AppError::Conflict(format!(
                "{} is being uploaded with a size of {} bytes, not {}",
                record.filename, record.file_size, request.total_size
            )));
        }

        if inbound.starts_at > record.uploaded_size {
            return Err(AppError::InvalidInput(format!(
                "Upload data starts at byte {} but only {} bytes of {} are stored",
                inbound.starts_at, record.uploaded_size, record.filename
            )));
        }

        let already_stored = record.uploaded_size - inbound.starts_at;
        if already_stored > 0 {
            let skipped = tokio::io::copy(
                &mut (&mut inbound.reader).take(already_stored),
                &mut tokio::io::sink(),
            )
            .await
            .map_err(read_error)?;

            if skipped < already_stored {
                tracing::info!(
                    file_id = %record.id,
                    uploaded_size = record.uploaded_size,
                    "Upload data ended before the stored offset"
                );
                return Ok(record);
            }
        }

        let resumed_from = record.uploaded_size;

        if record.file_size == 0 {
            self.write(&record, Bytes::new()).await?;
        }

        while record.uploaded_size < record.file_size {
            let want = (record.file_size - record.uploaded_size).min(self.chunk_size as u64) as usize;
            let data = read_chunk(&mut inbound.reader, want).await?;
            if data.is_empty() {
                break;
            }

            let len = data.len();
            let offset = record.uploaded_size;
            self.write(&record, data).await?;

            record = self
                .repository
                .advance_progress(record.id, offset, offset + len as u64)
                .await
                .map_err(|e| match e {
                    AppError::Conflict(_) | AppError::NotFound(_) => e,
                    other => {
                        tracing::error!(
                            error = %other,
                            file_id = %record.id,
                            offset = offset,
                            size_bytes = len,
                            "Chunk stored but progress update failed"
                        );
                        AppError::MetadataWriteFailure(other.to_string())
                    }
                })?;

            if len < want {
                break;
            }
        }

        if record.uploaded_size >= record.file_size {
            record = self.complete(record).await?;
        }

        tracing::info!(
            file_id = %record.id,
            status = %record.status,
            uploaded_size = record.uploaded_size,
            size_bytes = record.uploaded_size - resumed_from,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload call finished"
        );

        Ok(record)
    }

    async fn create_record(&self, request: &UploadRequest) -> Result<FileRecord, AppError> {
        let new = NewFileRecord {
            filename: request.filename.clone(),
            content_type: request.content_type.clone(),
            file_size: request.total_size,
            storage_path: storage_path_for(&request.filename),
        };

        match self.repository.create(new).await {
            Ok(record) => {
                tracing::info!(
                    file_id = %record.id,
                    storage_path = %record.storage_path,
                    "Created file record"
                );
                Ok(record)
            }
            // Another process created it first.
            Err(AppError::Conflict(_)) => self
                .repository
                .find_by_filename(&request.filename)
                .await?
                .ok_or_else(|| {
                    AppError::Conflict(format!("{} was created and removed concurrently", request.filename))
                }),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, record: &FileRecord, data: Bytes) -> Result<(), AppError> {
        let offset = record.uploaded_size;
        let len = data.len();
        self.storage
            .write_chunk(&record.storage_path, offset, data)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    file_id = %record.id,
                    storage_path = %record.storage_path,
                    offset = offset,
                    size_bytes = len,
                    "Chunk write failed"
                );
                AppError::StorageWriteFailure(e.to_string())
            })
    }

    async fn complete(&self, record: FileRecord) -> Result<FileRecord, AppError> {
        let completed = self
            .repository
            .mark_completed(record.id)
            .await
            .map_err(|e| AppError::MetadataWriteFailure(e.to_string()))?;

        match completed {
            Some(done) => {
                tracing::info!(file_id = %done.id, file_size = done.file_size, "Upload completed");
                Ok(done)
            }
            None => Ok(self.repository.find_by_id(record.id).await?.unwrap_or(record)),
        }
    }
}

/// Upload bytes come from a spooled file or a local path, so a failed read is
/// a server fault rather than bad client data.
fn read_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Failed to read upload data: {}", e))
}

/// Read up to `want` bytes, stopping early only at end of input.
async fn read_chunk<R>(reader: &mut R, want: usize) -> Result<Bytes, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; want];
    let mut filled = 0;
    while filled < want {
        let n = reader.read(&mut buf[filled..]).await.map_err(read_error)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}
