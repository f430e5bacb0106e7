//! Content-addressed blob storage for Audex evidence artifacts.
//!
//! Every artifact handed to the core — source documents, JSON payloads,
//! images — is stored as an immutable blob identified by the SHA-256 hash of
//! its bytes. The store is WORM: there is no update and no delete operation,
//! by design. Garbage collection is explicitly out of scope.
//!
//! # Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] — `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] — one file per blob under hex fan-out directories
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written; content addressing guarantees this.
//! 2. `write` is idempotent. A hash hit is verified bit-for-bit against the
//!    stored copy before being treated as a hit, to guard against
//!    hash-truncation bugs.
//! 3. The store never returns bytes that do not match the requested hash.
//! 4. Concurrent writes are conflict-free; a duplicate write is a no-op.
//! 5. I/O errors are propagated, never retried internally — retry policy is
//!    an external concern.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use blob::BlobRef;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
