//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{filename}`, with the filename percent-encoded so the
//! key is always a single path segment below the prefix.

use stowage_core::constants::STORAGE_PREFIX;

/// Generate the storage key for a filename.
///
/// Deterministic: the same filename always maps to the same key.
pub fn storage_path_for(filename: &str) -> String {
    format!("{}/{}", STORAGE_PREFIX, urlencoding::encode(filename))
}

/// Directory under which the S3 backend keeps the segments of `storage_key`.
#[cfg(feature = "storage-s3")]
pub(crate) fn segment_prefix(storage_key: &str) -> String {
    format!("{}.segments", storage_key)
}

/// Key of the segment covering `[start, end)`.
///
/// Names sort by end offset first, so listing past [`segment_listing_offset`]
/// finds the segments that reach a given byte without walking the whole object.
/// Zero padding keeps lexical and numeric order identical.
#[cfg(feature = "storage-s3")]
pub(crate) fn segment_key(storage_key: &str, start: u64, end: u64) -> String {
    format!("{}/{:020}-{:020}", segment_prefix(storage_key), end, start)
}

/// Listing offset after which every segment ending at or past `offset` sorts.
#[cfg(feature = "storage-s3")]
pub(crate) fn segment_listing_offset(storage_key: &str, offset: u64) -> String {
    format!("{}/{:020}", segment_prefix(storage_key), offset)
}

/// Parse `(start, end)` out of a segment object's final path component.
#[cfg(feature = "storage-s3")]
pub(crate) fn parse_segment_name(name: &str) -> Option<(u64, u64)> {
    let (end, start) = name.split_once('-')?;
    let end = parse_padded(end)?;
    let start = parse_padded(start)?;
    (start <= end).then_some((start, end))
}

#[cfg(feature = "storage-s3")]
fn parse_padded(digits: &str) -> Option<u64> {
    if digits.len() != 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
