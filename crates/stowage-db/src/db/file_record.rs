use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stowage_core::models::{FileRecord, NewFileRecord, UploadStatus};
use stowage_core::AppError;
use uuid::Uuid;

/// Persistent store of [`FileRecord`]s.
///
/// Progress updates are compare-and-set so concurrent writers can never move
/// `uploaded_size` backwards or past `file_size`.
#[async_trait]
pub trait FileRecordRepository: Send + Sync {
    /// Insert a new in-progress record with zero bytes uploaded.
    ///
    /// Fails with [`AppError::Conflict`] when the filename is already taken.
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError>;

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<FileRecord>, AppError>;

    /// Set `uploaded_size` to `new_uploaded` if it currently equals `expected_uploaded`.
    ///
    /// Returns [`AppError::Conflict`] when the stored value moved, the record is
    /// completed, or `new_uploaded` would exceed `file_size`.
    async fn advance_progress(
        &self,
        id: Uuid,
        expected_uploaded: u64,
        new_uploaded: u64,
    ) -> Result<FileRecord, AppError>;

    /// Flip an in-progress record whose bytes are all written to `completed`.
    ///
    /// Returns `None` when no transition happened, so at most one caller ever
    /// observes `Some`.
    async fn mark_completed(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Row type for the file_metadata table
#[derive(Debug, sqlx::FromRow)]
struct FileRecordRow {
    id: Uuid,
    filename: String,
    content_type: String,
    file_size: i64,
    uploaded_size: i64,
    storage_path: String,
    upload_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FileRecordRow {
    fn into_domain(self) -> Result<FileRecord, AppError> {
        let status: UploadStatus = self.upload_status.parse().map_err(|e| {
            AppError::Internal(format!("Corrupt status for file {}: {}", self.id, e))
        })?;

        Ok(FileRecord {
            id: self.id,
            filename: self.filename,
            content_type: self.content_type,
            file_size: self.file_size.max(0) as u64,
            uploaded_size: self.uploaded_size.max(0) as u64,
            storage_path: self.storage_path,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const COLUMNS: &str = "id, filename, content_type, file_size, uploaded_size, storage_path, \
                       upload_status, created_at, updated_at";

fn to_i64(value: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(value)
        .map_err(|_| AppError::InvalidInput(format!("{} is too large: {}", field, value)))
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgFileRecordRepository {
    pool: PgPool,
}

impl PgFileRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordRepository for PgFileRecordRepository {
    #[tracing::instrument(skip(self, new), fields(
        db.table = "file_metadata",
        db.operation = "insert",
        filename = %new.filename
    ))]
    async fn create(&self, new: NewFileRecord) -> Result<FileRecord, AppError> {
        let result = sqlx::query_as::<_, FileRecordRow>(&format!(
            r#"
            INSERT INTO file_metadata (
                id, filename, content_type, file_size, uploaded_size,
                storage_path, upload_status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, $5, 'in_progress', NOW(), NOW())
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.filename)
        .bind(&new.content_type)
        .bind(to_i64(new.file_size, "file_size")?)
        .bind(&new.storage_path)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.into_domain(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict(format!("File {} already exists", new.filename)),
            ),
            Err(e) => {
                tracing::error!(error = ?e, "Failed to insert file record");
                Err(AppError::Database(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_metadata", db.operation = "select"))]
    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<_, FileRecordRow>(&format!(
            "SELECT {COLUMNS} FROM file_metadata WHERE filename = $1"
        ))
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRecordRow::into_domain).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_metadata", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<_, FileRecordRow>(&format!(
            "SELECT {COLUMNS} FROM file_metadata WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRecordRow::into_domain).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_metadata", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<FileRecord>, AppError> {
        let rows = sqlx::query_as::<_, FileRecordRow>(&format!(
            "SELECT {COLUMNS} FROM file_metadata ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(FileRecordRow::into_domain).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_metadata", db.operation = "update"))]
    async fn advance_progress(
        &self,
        id: Uuid,
        expected_uploaded: u64,
        new_uploaded: u64,
    ) -> Result<FileRecord, AppError> {
        if new_uploaded < expected_uploaded {
            return Err(AppError::Conflict(format!(
                "uploaded_size cannot move backwards ({} -> {})",
                expected_uploaded, new_uploaded
            )));
        }

        let row = sqlx::query_as::<_, FileRecordRow>(&format!(
            r#"
            UPDATE file_metadata
            SET uploaded_size = $3, updated_at = NOW()
            WHERE id = $1
              AND uploaded_size = $2
              AND upload_status = 'in_progress'
              AND $3 <= file_size
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to_i64(expected_uploaded, "uploaded_size")?)
        .bind(to_i64(new_uploaded, "uploaded_size")?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_domain(),
            None => match self.find_by_id(id).await? {
                Some(current) => Err(AppError::Conflict(format!(
                    "Progress of {} changed concurrently (expected {}, found {})",
                    current.filename, expected_uploaded, current.uploaded_size
                ))),
                None => Err(AppError::NotFound(id.to_string())),
            },
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_metadata", db.operation = "update"))]
    async fn mark_completed(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<_, FileRecordRow>(&format!(
            r#"
            UPDATE file_metadata
            SET upload_status = 'completed', updated_at = NOW()
            WHERE id = $1
              AND upload_status = 'in_progress'
              AND uploaded_size >= file_size
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FileRecordRow::into_domain).transpose()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
