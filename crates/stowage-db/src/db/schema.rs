//! Connection pool setup and schema management

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use stowage_core::Config;

/// Open a connection pool sized from configuration.
pub async fn connect(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    Ok(pool)
}

async fn migrator() -> Result<Migrator> {
    // workspace migrations/ relative to this crate
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")
}

/// Apply pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    migrator()
        .await?
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Drop the file_metadata table and recreate it from the migrations.
///
/// Every file record is lost. Stored objects are left untouched.
pub async fn reset_schema(pool: &PgPool) -> Result<()> {
    tracing::warn!("Dropping file_metadata table");
    sqlx::query("DROP TABLE IF EXISTS file_metadata")
        .execute(pool)
        .await
        .context("Failed to drop file_metadata")?;
    sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
        .execute(pool)
        .await
        .context("Failed to drop migration history")?;

    run_migrations(pool).await
}
