use audex_types::ContentHash;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(ContentHash),

    /// Stored bytes no longer hash to their address (data corruption).
    #[error("hash mismatch for {expected}: stored bytes hash to {computed}")]
    HashMismatch {
        expected: ContentHash,
        computed: ContentHash,
    },

    /// A write hit an existing hash whose stored bytes differ bit-for-bit
    /// from the incoming content. Either a hash-truncation bug upstream or
    /// store corruption; never silently deduplicated.
    #[error("content collision at {hash}: existing blob bytes differ")]
    ContentCollision { hash: ContentHash },

    /// Metadata record is malformed or cannot be decoded.
    #[error("corrupt metadata for {hash}: {reason}")]
    CorruptMetadata { hash: ContentHash, reason: String },

    /// I/O error from the underlying storage backend. Bubbled, not retried.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
