//! Stowage Services Layer
//!
//! Business logic shared by the HTTP API and the CLI: the chunked transfer
//! engine that writes uploads, and the retrieval service that reports progress
//! and reads files back. Keep thin request handling in stowage-api.

pub mod locks;
pub mod retrieval;
pub mod transfer;

pub use locks::FilenameLocks;
pub use retrieval::{FileDownload, RetrievalService};
pub use transfer::{InboundFile, TransferEngine, UploadRequest};

pub use stowage_storage::{
    create_storage, storage_path_for, LocalStorage, S3Storage, Storage, StorageBackend,
    StorageError, StorageResult,
};
