//! Stowage Core Library
//!
//! This crate provides the domain model, error taxonomy, configuration and
//! input validation shared by every Stowage component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileProgress, FileRecord, FileSummary, NewFileRecord, UploadStatus};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in the stowage-storage crate
