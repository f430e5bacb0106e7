use std::collections::BTreeMap;

use audex_types::ContentHash;

use crate::blob::BlobRef;
use crate::error::StoreResult;

/// Content-addressed, write-once blob store.
///
/// All implementations must satisfy these invariants:
/// - `write(content).hash == sha256(content)`, always.
/// - `write` is idempotent: identical content maps to the same hash and is
///   stored once. A hash hit is compared bit-for-bit against the stored
///   copy before being treated as a hit.
/// - `read` never returns bytes that do not hash to the requested address.
/// - There is no update or delete. The store is WORM.
/// - Concurrent writes are safe; content addressing makes them
///   conflict-free.
pub trait BlobStore: Send + Sync {
    /// Store content and return its reference.
    ///
    /// A duplicate write returns the existing reference unchanged
    /// (including the originally recorded content type and metadata).
    fn write(&self, content: &[u8], content_type: &str) -> StoreResult<BlobRef> {
        self.write_with_metadata(content, content_type, BTreeMap::new())
    }

    /// Store content with writer-supplied metadata attached to the
    /// reference.
    fn write_with_metadata(
        &self,
        content: &[u8],
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<BlobRef>;

    /// Read a blob's bytes. Fails with [`StoreError::NotFound`] if absent.
    ///
    /// [`StoreError::NotFound`]: crate::error::StoreError::NotFound
    fn read(&self, hash: &ContentHash) -> StoreResult<Vec<u8>>;

    /// Read a blob's metadata record without its bytes.
    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobRef>;

    /// Check whether a blob exists.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;
}
