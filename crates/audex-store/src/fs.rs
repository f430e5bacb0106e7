use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use audex_types::ContentHash;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::blob::BlobRef;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Filesystem blob store: one file per blob keyed by hex hash.
///
/// Layout under the root directory:
///
/// ```text
/// objects/<hh>/<full-hex>        blob bytes (hh = first two hex chars)
/// meta/<hh>/<full-hex>.json      BlobRef metadata record
/// ```
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so a crashed write never leaves a partial object at its final
/// path. Safe for multi-process use over shared storage: concurrent writers
/// of the same content race to an identical rename target.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (creating directories as needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("objects"))?;
        fs::create_dir_all(root.join("meta"))?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join("objects").join(&hex[..2]).join(&hex)
    }

    fn meta_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root
            .join("meta")
            .join(&hex[..2])
            .join(format!("{hex}.json"))
    }

    fn write_file_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let dir = path.parent().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "object path has no parent directory",
            ))
        })?;
        fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        fs::write(tmp.path(), bytes)?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn read_meta(&self, hash: &ContentHash) -> StoreResult<BlobRef> {
        let bytes = match fs::read(self.meta_path(hash)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*hash))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptMetadata {
            hash: *hash,
            reason: e.to_string(),
        })
    }

    fn write_meta(&self, blob_ref: &BlobRef) -> StoreResult<()> {
        let bytes = serde_json::to_vec(blob_ref).map_err(|e| StoreError::CorruptMetadata {
            hash: blob_ref.hash,
            reason: e.to_string(),
        })?;
        Self::write_file_atomic(&self.meta_path(&blob_ref.hash), &bytes)
    }
}

impl BlobStore for FsBlobStore {
    fn write_with_metadata(
        &self,
        content: &[u8],
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> StoreResult<BlobRef> {
        let hash = ContentHash::of(content);
        let object_path = self.object_path(&hash);
        let blob_ref = BlobRef {
            hash,
            content_type: content_type.to_string(),
            size: content.len() as u64,
            metadata,
        };

        match fs::read(&object_path) {
            Ok(existing) => {
                // Hash hit: verify bit-for-bit before treating as dedup.
                if existing.as_slice() != content {
                    return Err(StoreError::ContentCollision { hash });
                }
                return match self.read_meta(&hash) {
                    Ok(existing_ref) => Ok(existing_ref),
                    Err(StoreError::NotFound(_)) => {
                        // Object without sidecar: an interrupted earlier
                        // write. Heal it from this write's metadata so the
                        // hash does not stay wedged.
                        self.write_meta(&blob_ref)?;
                        debug!(hash = %hash.short_hex(), "metadata sidecar regenerated");
                        Ok(blob_ref)
                    }
                    Err(e) => Err(e),
                };
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        // Sidecar before object: if the write is interrupted between the
        // two, the hash reads as absent and the next write retries cleanly.
        self.write_meta(&blob_ref)?;
        Self::write_file_atomic(&object_path, content)?;
        debug!(hash = %hash.short_hex(), size = content.len(), "blob written");
        Ok(blob_ref)
    }

    fn read(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let bytes = match fs::read(self.object_path(hash)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*hash))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let computed = ContentHash::of(&bytes);
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        Ok(bytes)
    }

    fn stat(&self, hash: &ContentHash) -> StoreResult<BlobRef> {
        self.read_meta(hash)
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.object_path(hash).exists())
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn write_and_read_roundtrip() {
        let (_dir, store) = open_temp();
        let r = store.write(b"filesystem blob", "text/plain").unwrap();
        assert_eq!(store.read(&r.hash).unwrap(), b"filesystem blob");
        assert_eq!(store.stat(&r.hash).unwrap(), r);
    }

    #[test]
    fn write_is_idempotent_on_disk() {
        let (_dir, store) = open_temp();
        let r1 = store.write(b"dup", "text/plain").unwrap();
        let r2 = store.write(b"dup", "application/json").unwrap();
        // First write's record wins.
        assert_eq!(r2, r1);
        assert_eq!(r2.content_type, "text/plain");
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = open_temp();
        assert!(matches!(
            store.read(&ContentHash::of(b"missing")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn corrupted_object_file_fails_read() {
        let (_dir, store) = open_temp();
        let r = store.write(b"original", "text/plain").unwrap();
        fs::write(store.object_path(&r.hash), b"tampered").unwrap();
        assert!(matches!(
            store.read(&r.hash),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn corrupted_object_file_collides_on_rewrite() {
        let (_dir, store) = open_temp();
        let r = store.write(b"original", "text/plain").unwrap();
        fs::write(store.object_path(&r.hash), b"tampered").unwrap();
        assert!(matches!(
            store.write(b"original", "text/plain"),
            Err(StoreError::ContentCollision { .. })
        ));
    }

    #[test]
    fn rewrite_heals_missing_metadata_sidecar() {
        let (_dir, store) = open_temp();
        let r = store.write(b"doc", "application/pdf").unwrap();
        fs::remove_file(store.meta_path(&r.hash)).unwrap();

        // The object is intact but its sidecar is gone (interrupted write).
        // An identical re-write must succeed and restore the sidecar.
        let healed = store.write(b"doc", "application/pdf").unwrap();
        assert_eq!(healed.hash, r.hash);
        assert_eq!(store.stat(&r.hash).unwrap().content_type, "application/pdf");
        assert_eq!(store.read(&r.hash).unwrap(), b"doc");
    }

    #[test]
    fn corrupted_metadata_is_reported() {
        let (_dir, store) = open_temp();
        let r = store.write(b"blob", "text/plain").unwrap();
        fs::write(store.meta_path(&r.hash), b"not json").unwrap();
        assert!(matches!(
            store.stat(&r.hash),
            Err(StoreError::CorruptMetadata { .. })
        ));
    }

    #[test]
    fn exists_reflects_disk_state() {
        let (_dir, store) = open_temp();
        assert!(!store.exists(&ContentHash::of(b"nope")).unwrap());
        let r = store.write(b"yes", "text/plain").unwrap();
        assert!(store.exists(&r.hash).unwrap());
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let hash = {
            let store = FsBlobStore::open(dir.path()).unwrap();
            store.write(b"persistent", "text/plain").unwrap().hash
        };
        let reopened = FsBlobStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read(&hash).unwrap(), b"persistent");
    }

    #[test]
    fn metadata_survives_roundtrip() {
        let (_dir, store) = open_temp();
        let mut meta = BTreeMap::new();
        meta.insert("period".to_string(), "2025-07".to_string());
        let r = store
            .write_with_metadata(b"doc", "application/pdf", meta)
            .unwrap();
        let stat = store.stat(&r.hash).unwrap();
        assert_eq!(stat.metadata.get("period").map(String::as_str), Some("2025-07"));
    }
}
