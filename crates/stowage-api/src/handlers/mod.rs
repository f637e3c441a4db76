pub mod download;
pub mod files;
pub mod preview;
pub mod progress;
pub mod root;
pub mod upload;
