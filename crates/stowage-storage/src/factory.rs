#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use stowage_core::Config;

/// Region assumed for S3-compatible endpoints that ignore it (e.g. MinIO).
#[cfg(feature = "storage-s3")]
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config.s3_bucket().to_string();
            if bucket.is_empty() {
                return Err(StorageError::ConfigError(
                    "S3_BUCKET not configured".to_string(),
                ));
            }
            let endpoint = config.s3_endpoint().map(String::from);
            let region = match (config.s3_region(), endpoint.is_some()) {
                (Some(region), _) => region.to_string(),
                (None, true) => DEFAULT_S3_REGION.to_string(),
                (None, false) => {
                    return Err(StorageError::ConfigError(
                        "S3_REGION or AWS_REGION not configured".to_string(),
                    ))
                }
            };

            tracing::info!(bucket = %bucket, region = %region, endpoint = ?endpoint, "Using S3 storage");
            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path();
            if base_path.is_empty() {
                return Err(StorageError::ConfigError(
                    "LOCAL_STORAGE_PATH not configured".to_string(),
                ));
            }

            tracing::info!(path = %base_path, "Using local storage");
            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
