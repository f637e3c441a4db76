//! Database setup and initialization

use anyhow::{Context, Result};
use sqlx::PgPool;
use stowage_core::Config;

/// Connect to Postgres and bring the schema up to date.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = stowage_db::connect(config)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    stowage_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    Ok(pool)
}
