//! Stowage Storage Library
//!
//! Object store abstraction used by the chunked transfer engine, with a local
//! filesystem backend and an S3-compatible backend.
//!
//! # Storage key format
//!
//! Every file record owns exactly one logical object whose key is derived from
//! the filename: `uploads/{percent-encoded filename}`. Key generation lives in
//! the `keys` module so all callers agree on the layout.
//!
//! Objects grow through [`Storage::write_chunk`]. The local backend writes in
//! place; the S3 backend stores each chunk as a separate segment object, since
//! S3 objects cannot be appended to.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::storage_path_for;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stowage_core::StorageBackend;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
