//! Stowage API Library
//!
//! This crate provides the HTTP handlers, error presentation and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
pub use telemetry::init_telemetry;
