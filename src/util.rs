//! Utility functions for Letter Venture.

use std::fs;
use std::path::Path;

use crate::error::{Result, VentureError};

/// Maximum content pack size that can be read into memory (2 MB).
///
/// A full pack of stories and word lists is a few dozen kilobytes.
pub const MAX_CONTENT_SIZE: u64 = 2 * 1024 * 1024;

/// Read a file into a string, refusing files above `max_size` bytes.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| VentureError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(VentureError::content(format!(
            "File {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| VentureError::storage(path, e))
}

/// Read a content file with the default size limit.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_CONTENT_SIZE)
}

/// Truncate a string with ellipsis, counting characters rather than bytes.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else {
        let truncate_at = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(truncate_at).collect();
        format!("{}...", truncated)
    }
}
