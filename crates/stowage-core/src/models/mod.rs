pub mod file_record;
pub mod progress;

pub use file_record::{FileRecord, FileSummary, NewFileRecord, UploadStatus};
pub use progress::{progress_percentage, FileProgress};
