//! Utility functions shared across growtrack modules.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{GrowError, Result};

/// Maximum file size that can be read into memory (10 MB).
///
/// Applies to legacy import blobs, catalog files and manifests. A journal
/// record is a few kilobytes even with hundreds of entries.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string, refusing files larger than `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| GrowError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(GrowError::invalid_input(format!(
            "file {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| GrowError::storage(path, e))
}

/// Write `contents` to `path` atomically.
///
/// Writes a dot-prefixed temp file next to the target, syncs it and renames
/// it over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| GrowError::invalid_input(format!("no parent for {}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    {
        let mut file = fs::File::create(&temp_path).map_err(|e| GrowError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| GrowError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| GrowError::storage(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| GrowError::storage(path, e))?;
    Ok(())
}

/// Current time truncated to millisecond precision.
///
/// Timestamps are persisted as epoch milliseconds, so truncating up front
/// keeps in-memory values equal to what a reload produces.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Check that an id can be used as a file name.
///
/// Ids are opaque, but they become file names in the file store, so path
/// separators, leading dots and control characters are rejected.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(GrowError::invalid_input("id must not be empty"));
    }
    if id.len() > 128 {
        return Err(GrowError::invalid_input(format!(
            "id is too long ({} chars, max 128)",
            id.len()
        )));
    }
    if id.starts_with('.') {
        return Err(GrowError::invalid_input(format!(
            "id must not start with '.': {}",
            id
        )));
    }
    if id
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(GrowError::invalid_input(format!(
            "id contains invalid characters: {}",
            id
        )));
    }
    Ok(())
}

/// Plant id reserved for the plant order file.
pub const RESERVED_PLANT_ID: &str = "index";

/// Check a plant id: a valid file name that is not the order file's stem.
pub fn validate_plant_id(id: &str) -> Result<()> {
    validate_id(id)?;
    if id == RESERVED_PLANT_ID {
        return Err(GrowError::invalid_input(format!(
            "'{}' is reserved and cannot be used as a plant id",
            RESERVED_PLANT_ID
        )));
    }
    Ok(())
}

/// Extract a decimal number from free text such as "5 L", "2,5 ml/L" or "20%".
///
/// Everything except digits, '.' and ',' is dropped and ',' is read as a
/// decimal point.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Upper bound of a potency string like "19-25", "<1" or "22".
pub fn potency_upper_bound(text: &str) -> Option<f64> {
    text.split('-').filter_map(parse_decimal).reduce(f64::max)
}
