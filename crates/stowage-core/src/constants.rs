//! Shared constants

/// Default size of a single chunk written to the object store (1 MiB).
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 1024 * 1024;

/// Default number of leading bytes read for a text preview (64 KiB).
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 64 * 1024;

/// Number of lines returned by a preview when the caller does not ask for more.
pub const DEFAULT_PREVIEW_LINES: usize = 5;

/// Upper bound on lines a single preview request may ask for.
pub const MAX_PREVIEW_LINES: usize = 100;

/// Prefix under which uploaded objects are stored.
pub const STORAGE_PREFIX: &str = "uploads";

/// Maximum accepted filename length, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum length of a filename once percent-encoded into its storage key
/// component. Leaves room for the `.segments` suffix of S3 segment prefixes
/// below the usual 255 byte file name limit.
pub const MAX_ENCODED_FILENAME_LENGTH: usize = 240;
