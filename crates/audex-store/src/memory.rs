use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use audex_types::ContentHash;

use crate::blob::BlobRef;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ContentHash, (BlobRef, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|(blob_ref, _)| blob_ref.size)
            .sum()
    }

    /// Directly overwrite a stored blob's bytes, bypassing every invariant.
    ///
    /// Test-only hook for simulating storage corruption; integrity checks
    /// must detect what this does.
    #[doc(hidden)]
    pub fn corrupt_for_test(&self, hash: &ContentHash, bytes: Vec<u8>) -> bool {
        let mut map = self.blobs.write().expect("lock poisoned");
        match map.get_mut(hash) {
            Some((_, stored)) => {
                *stored = bytes;
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn write_with_metadata(
        &self,
        content: &[u8],
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<BlobRef> {
        let hash = ContentHash::of(content);
        let mut map = self.blobs.write().expect("lock poisoned");

        if let Some((existing_ref, existing_bytes)) = map.get(&hash) {
            // Bit-for-bit verification before treating as a dedup hit.
            if existing_bytes.as_slice() != content {
                return Err(StoreError::ContentCollision { hash });
            }
            return Ok(existing_ref.clone());
        }

        let blob_ref = BlobRef {
            hash,
            content_type: content_type.to_string(),
            size: content.len() as u64,
            metadata,
        };
        map.insert(hash, (blob_ref.clone(), content.to_vec()));
        Ok(blob_ref)
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().expect("lock poisoned");
        let (_, bytes) = map.get(hash).ok_or(StoreError::NotFound(*hash))?;
        let computed = ContentHash::of(bytes);
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        Ok(bytes.clone())
    }

    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobRef> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(hash)
            .map(|(blob_ref, _)| blob_ref.clone())
            .ok_or(StoreError::NotFound(*hash))
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.blobs.read().expect("lock poisoned").contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
