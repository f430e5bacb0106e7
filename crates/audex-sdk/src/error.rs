use audex_types::{EvidenceUri, RecordId, TypeError};

/// Errors surfaced by the [`EvidenceCore`] facade.
///
/// [`EvidenceCore`]: crate::core::EvidenceCore
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// No evidence registered under the given URI.
    #[error("evidence not registered: {0}")]
    EvidenceNotFound(EvidenceUri),

    /// The URI is already registered and points at a different target.
    #[error("evidence URI {0} already registered with a different target")]
    EvidenceConflict(EvidenceUri),

    /// An evidence target references a record this core never appended.
    #[error("record {0} is not known to this core")]
    UnknownRecord(RecordId),

    /// A record was requested for a URI that resolves to a blob.
    #[error("evidence URI {0} resolves to a blob, not a record")]
    NotARecord(EvidenceUri),

    /// A signing operation was requested but no signer is configured.
    #[error("no signer configured")]
    NoSigner,

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("store error: {0}")]
    Store(#[from] audex_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] audex_ledger::LedgerError),

    #[error("pack error: {0}")]
    Pack(#[from] audex_pack::PackError),

    #[error("replay error: {0}")]
    Replay(#[from] audex_replay::ReplayError),
}

pub type SdkResult<T> = Result<T, SdkError>;
