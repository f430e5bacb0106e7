use audex_crypto::CanonicalError;
use audex_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No record chain exists for the given key.
    #[error("no records for key {0:?}")]
    KeyNotFound(String),

    /// Blob store failure while writing or re-fetching a payload.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A record could not be canonically encoded for hashing.
    #[error("canonical encoding error: {0}")]
    Canonical(#[from] CanonicalError),

    /// Bundle export/import JSON failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// `seal_bundle` was handed the same record more than once.
    #[error("duplicate record in bundle range: key {key:?} seq {seq}")]
    DuplicateRecord { key: String, seq: u64 },
}
