//! Application state shared by every handler.

use std::sync::Arc;
use stowage_core::Config;
use stowage_db::FileRecordRepository;
use stowage_services::{RetrievalService, TransferEngine};
use stowage_storage::Storage;

/// Limits applied to inbound uploads.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size: config.max_upload_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FileRecordRepository>,
    pub storage: Arc<dyn Storage>,
    pub transfer: TransferEngine,
    pub retrieval: RetrievalService,
    pub limits: UploadLimits,
}

impl AppState {
    /// Wire the engine and retrieval service over the given adapters.
    pub fn new(
        config: &Config,
        repository: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let transfer = TransferEngine::new(
            repository.clone(),
            storage.clone(),
            config.chunk_size_bytes(),
        );
        let retrieval = RetrievalService::new(
            repository.clone(),
            storage.clone(),
            config.preview_max_bytes(),
        );

        Self {
            repository,
            storage,
            transfer,
            retrieval,
            limits: UploadLimits::from_config(config),
        }
    }
}
