//! In-process repository with the same compare-and-set semantics as Postgres.
//!
//! Used by tests and by single-process development setups.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::models::{FileRecord, NewFileRecord, UploadStatus};
use stowage_core::AppError;
use uuid::Uuid;

use super::file_record::FileRecordRepository;

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, FileRecord>,
    // insertion order, standing in for ORDER BY created_at
    order: Vec<Uuid>,
}

#[derive(Clone, Default)]
pub struct InMemoryFileRecordRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryFileRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileRecordRepository for InMemoryFileRecordRepository {
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError> {
        let mut inner = self.lock();

        if inner.records.values().any(|r| r.filename == new.filename) {
            return Err(AppError::Conflict(format!(
                "File {} already exists",
                new.filename
            )));
        }

        let now = Utc::now();
        let record = FileRecord {
            id: Uuid::new_v4(),
            filename: new.filename,
            content_type: new.content_type,
            file_size: new.file_size,
            uploaded_size: 0,
            storage_path: new.storage_path,
            status: UploadStatus::InProgress,
            created_at: now,
            updated_at: now,
        };

        inner.order.push(record.id);
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .lock()
            .records
            .values()
            .find(|r| r.filename == filename)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.lock().records.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<FileRecord>, AppError> {
        let inner = self.lock();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }

    async fn advance_progress(
        &self,
        id: Uuid,
        expected_uploaded: u64,
        new_uploaded: u64,
    ) -> Result<FileRecord, AppError> {
        let mut inner = self.lock();
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        if record.status != UploadStatus::InProgress
            || record.uploaded_size != expected_uploaded
            || new_uploaded < expected_uploaded
            || new_uploaded > record.file_size
        {
            return Err(AppError::Conflict(format!(
                "Progress of {} changed concurrently (expected {}, found {})",
                record.filename, expected_uploaded, record.uploaded_size
            )));
        }

        record.uploaded_size = new_uploaded;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn mark_completed(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let mut inner = self.lock();
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(None);
        };

        if record.status != UploadStatus::InProgress || record.uploaded_size < record.file_size {
            return Ok(None);
        }

        record.status = UploadStatus::Completed;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
