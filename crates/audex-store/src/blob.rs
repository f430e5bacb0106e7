use std::collections::BTreeMap;

use audex_types::ContentHash;
use serde::{Deserialize, Serialize};

/// Reference to a stored blob: address plus the small metadata record
/// persisted alongside it.
///
/// Immutable once written. The hash is always the SHA-256 of the stored
/// bytes; `store(content).hash == sha256(content)` holds for every write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Content address of the blob.
    pub hash: ContentHash,
    /// MIME-style content type supplied by the writer.
    pub content_type: String,
    /// Size of the blob in bytes.
    pub size: u64,
    /// Free-form metadata supplied by the writer (sorted for determinism).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl BlobRef {
    /// Build a reference for content about to be stored.
    pub fn for_content(content: &[u8], content_type: impl Into<String>) -> Self {
        Self {
            hash: ContentHash::of(content),
            content_type: content_type.into(),
            size: content.len() as u64,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
