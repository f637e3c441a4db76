//! Metadata store for file records
//!
//! `file_record` holds the repository trait and its PostgreSQL implementation,
//! `memory` an in-process implementation with identical semantics, and
//! `schema` pool creation plus migrations.

pub mod file_record;
pub mod memory;
pub mod schema;

pub use file_record::{FileRecordRepository, PgFileRecordRepository};
pub use memory::InMemoryFileRecordRepository;
pub use schema::{connect, reset_schema, run_migrations};
