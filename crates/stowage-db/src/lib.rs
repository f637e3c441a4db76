//! Stowage database layer
//!
//! Repositories for the `file_metadata` table.

pub mod db;

pub use db::*;
