//! Application setup and initialization
//!
//! Adapters are built once here and injected into [`AppState`]; handlers never
//! construct clients of their own.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use stowage_core::Config;
use stowage_db::PgFileRecordRepository;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.json_logs())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = AppState::new(
        &config,
        Arc::new(PgFileRecordRepository::new(pool)),
        storage,
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
