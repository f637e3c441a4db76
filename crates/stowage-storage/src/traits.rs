//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::ops::Range;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// A chunk would leave a hole between the stored bytes and its offset.
    #[error("Invalid offset {offset} for {key}: object holds {current} bytes")]
    InvalidOffset { key: String, offset: u64, current: u64 },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lazily produced object bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Keys are produced by [`crate::keys::storage_path_for`]. Objects are built
/// up one chunk at a time and read back either as a bounded range or as a
/// stream.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` so that it occupies `[offset, offset + data.len())`.
    ///
    /// Anything previously stored at or beyond `offset` is discarded, so a
    /// retried chunk replaces whatever a failed attempt left behind. Fails with
    /// [`StorageError::InvalidOffset`] when `offset` is past the current end.
    /// Writing an empty chunk at offset 0 creates an empty object.
    async fn write_chunk(&self, storage_key: &str, offset: u64, data: Bytes) -> StorageResult<()>;

    /// Read the bytes in `range`, clamped to the object's length.
    async fn read_range(&self, storage_key: &str, range: Range<u64>) -> StorageResult<Bytes>;

    /// Stream the object from the start, stopping after `limit` bytes when given.
    async fn read_stream(&self, storage_key: &str, limit: Option<u64>)
        -> StorageResult<ByteStream>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of an object, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
