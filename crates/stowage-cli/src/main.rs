//! Stowage CLI: operator commands against the configured metadata and object stores.
//!
//! Reads the same environment as the API server (DATABASE_URL, STORAGE_BACKEND, ...).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stowage_cli::{init_tracing, progress_table};
use stowage_core::validation::normalize_content_type;
use stowage_core::{Config, FileProgress, FileSummary};
use stowage_db::{FileRecordRepository, PgFileRecordRepository};
use stowage_services::{InboundFile, RetrievalService, TransferEngine, UploadRequest};
use stowage_storage::create_storage;
use tokio::io::AsyncSeekExt;

#[derive(Parser)]
#[command(name = "stowage", about = "Stowage operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate the file metadata table (stored objects are kept)
    ResetDb {
        /// Required confirmation; every upload record is lost
        #[arg(long)]
        yes: bool,
    },
    /// Show upload progress of every file
    List {
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Upload a local file, resuming a previous partial upload of the same name
    Upload {
        /// Path to the file to upload
        path: PathBuf,
        /// Stored filename (defaults to the file's own name)
        #[arg(long)]
        name: Option<String>,
        /// Declared content type
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = stowage_db::connect(&config).await?;

    match cli.command {
        Commands::ResetDb { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset the database without --yes");
            }
            stowage_db::reset_schema(&pool).await?;
            println!("file_metadata table recreated");
        }
        Commands::List { format } => {
            stowage_db::run_migrations(&pool).await?;
            let repository = Arc::new(PgFileRecordRepository::new(pool));
            let storage = create_storage(&config).await?;
            let retrieval =
                RetrievalService::new(repository, storage, config.preview_max_bytes());

            let progress: Vec<FileProgress> = retrieval.list_progress().await?;
            match format.as_str() {
                "json" => print_json(&progress)?,
                "table" => print!("{}", progress_table(&progress)),
                other => anyhow::bail!("Unknown format {}: use json or table", other),
            }
        }
        Commands::Upload {
            path,
            name,
            content_type,
        } => {
            stowage_db::run_migrations(&pool).await?;
            let repository: Arc<dyn FileRecordRepository> =
                Arc::new(PgFileRecordRepository::new(pool));
            let storage = create_storage(&config).await?;
            let engine = TransferEngine::new(
                repository.clone(),
                storage,
                config.chunk_size_bytes(),
            );

            let summary = upload_file(&engine, repository.as_ref(), &path, name, content_type)
                .await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

/// Upload `path`, skipping straight to the recorded offset when resuming.
async fn upload_file(
    engine: &TransferEngine,
    repository: &dyn FileRecordRepository,
    path: &Path,
    name: Option<String>,
    content_type: Option<String>,
) -> anyhow::Result<FileSummary> {
    let filename = match name {
        Some(name) => name,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .with_context(|| format!("{} has no usable file name", path.display()))?,
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let total_size = file.metadata().await?.len();

    let starts_at = match repository.find_by_filename(&filename).await? {
        Some(record) if !record.is_completed() && record.uploaded_size <= total_size => {
            record.uploaded_size
        }
        _ => 0,
    };
    if starts_at > 0 {
        file.seek(std::io::SeekFrom::Start(starts_at)).await?;
        tracing::info!(filename = %filename, offset = starts_at, "Resuming upload");
    }

    let record = engine
        .upload(
            UploadRequest {
                filename,
                content_type: normalize_content_type(content_type.as_deref()),
                total_size,
            },
            InboundFile {
                reader: file,
                starts_at,
            },
        )
        .await?;

    Ok(FileSummary::from(record))
}
