//! Canonical JSON encoding for deterministic hashing.
//!
//! Semantically identical data must always hash identically, so every hash
//! in Audex is computed over this encoding:
//!
//! - Object keys sorted lexicographically by UTF-8 bytes
//! - No incidental whitespace
//! - Non-finite floats encode as `null` (serde_json cannot represent them);
//!   payload producers must not rely on NaN/Infinity surviving a roundtrip
//!
//! Sorting comes from routing through [`serde_json::Value`], whose object
//! map is a `BTreeMap` when the `preserve_order` feature is off. That
//! feature must never be enabled in this workspace: it would silently change
//! every hash in the system.

use serde::Serialize;

/// Errors from canonical encoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("value cannot be canonically encoded: {0}")]
    Encoding(String),
}

/// Encode a serializable value as canonical JSON bytes.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    // Route through Value so struct field order never leaks into the bytes.
    let value =
        serde_json::to_value(value).map_err(|e| CanonicalError::Encoding(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| CanonicalError::Encoding(e.to_string()))
}
