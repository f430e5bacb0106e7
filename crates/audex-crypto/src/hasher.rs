use audex_types::ContentHash;
use serde::Serialize;

use crate::canonical::{to_canonical_json, CanonicalError};

/// SHA-256 hash of raw bytes.
///
/// This is the content-address function: `sha256(content)` is the identity
/// of a blob, exactly as stored and exported.
pub fn sha256(data: &[u8]) -> ContentHash {
    ContentHash::of(data)
}

/// Hash a serializable value over its canonical JSON encoding.
///
/// Used for ledger record hashes, rule-pack content hashes, and replay
/// output hashes — anywhere structure, not raw bytes, is being addressed.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<ContentHash, CanonicalError> {
    Ok(ContentHash::of(&to_canonical_json(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"payload"), sha256(b"payload"));
        assert_ne!(sha256(b"payload"), sha256(b"payload2"));
    }

    #[test]
    fn hash_canonical_ignores_key_order() {
        let a = serde_json::json!({"x": 1, "y": 2});
        let b = serde_json::json!({"y": 2, "x": 1});
        assert_eq!(hash_canonical(&a).unwrap(), hash_canonical(&b).unwrap());
    }

    #[test]
    fn hash_canonical_differs_from_raw_text_hash() {
        let value = serde_json::json!({"x": 1});
        // Pretty-printed text of the same value hashes differently; only the
        // canonical bytes are authoritative.
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        assert_ne!(hash_canonical(&value).unwrap(), sha256(pretty.as_bytes()));
    }
}
