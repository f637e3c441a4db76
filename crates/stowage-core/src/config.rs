//! Configuration module
//!
//! Settings are read from the process environment (after loading `.env` with
//! `dotenvy`). Every optional variable has a default; `DATABASE_URL` is required.

use std::env;

use crate::constants::{DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_PREVIEW_MAX_BYTES};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 1024;
const DEFAULT_S3_BUCKET: &str = "uploads";
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data/uploads";

/// HTTP server and database pool settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub log_format: Option<String>,
}

/// Object store settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: String,
}

/// Chunked transfer and preview settings
#[derive(Clone, Debug)]
pub struct TransferConfig {
    pub chunk_size_bytes: usize,
    pub preview_max_bytes: u64,
    pub max_upload_size_bytes: usize,
    /// Lowercase extensions without the dot. Empty means any extension.
    pub allowed_extensions: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database_url: String,
    pub storage: StorageConfig,
    pub transfer: TransferConfig,
}

impl Config {
    /// Load configuration from the environment and validate it.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server = ServerConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            log_format: lookup("LOG_FORMAT")
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Local,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: lookup("S3_BUCKET").unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
            s3_region: lookup("S3_REGION")
                .or_else(|| lookup("AWS_REGION"))
                .filter(|s| !s.is_empty()),
            s3_endpoint: lookup("S3_ENDPOINT").filter(|s| !s.is_empty()),
            local_storage_path: lookup("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
        };

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large: {}", max_upload_size_mb)
            })?;

        let transfer = TransferConfig {
            chunk_size_bytes: lookup("CHUNK_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE_BYTES),
            preview_max_bytes: lookup("PREVIEW_MAX_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PREVIEW_MAX_BYTES),
            max_upload_size_bytes,
            allowed_extensions: lookup("ALLOWED_EXTENSIONS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        Ok(Config {
            server,
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage,
            transfer,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.transfer.chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("CHUNK_SIZE_BYTES must be greater than zero"));
        }

        if self.transfer.preview_max_bytes == 0 {
            return Err(anyhow::anyhow!("PREVIEW_MAX_BYTES must be greater than zero"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() && self.storage.s3_endpoint.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or S3_ENDPOINT must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.server.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.server.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.server.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.server.db_timeout_seconds
    }

    pub fn json_logs(&self) -> bool {
        self.server.log_format.as_deref() == Some("json")
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.backend
    }

    pub fn s3_bucket(&self) -> &str {
        &self.storage.s3_bucket
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.storage.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.storage.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.storage.local_storage_path
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.transfer.chunk_size_bytes
    }

    pub fn preview_max_bytes(&self) -> u64 {
        self.transfer.preview_max_bytes
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.transfer.max_upload_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.transfer.allowed_extensions
    }
}
