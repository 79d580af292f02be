//! Content hashing for derived table names.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a serializable value.
///
/// The value is serialized to JSON before hashing, ensuring deterministic output.
/// Returns a 64-character lowercase hexadecimal string.
///
/// # Errors
/// Returns an error if the value cannot be serialized to JSON.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// First `len` hex characters of [`compute_hash`], for use inside table names.
///
/// Values that fail to serialize hash as an empty string.
pub fn short_hash<T: Serialize>(value: &T, len: usize) -> String {
    let mut digest = compute_hash(value).unwrap_or_default();
    digest.truncate(len);
    digest
}
