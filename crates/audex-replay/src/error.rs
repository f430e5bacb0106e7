use audex_crypto::CanonicalError;
use audex_types::TypeError;

/// Errors from replay operations.
///
/// An expected-vs-observed hash mismatch is deliberately absent: that is a
/// soft result ([`ReplayResult`]), not an error.
///
/// [`ReplayResult`]: crate::engine::ReplayResult
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The pluggable computation failed (the report module raised).
    #[error("computation failed: {0}")]
    Computation(String),

    /// The recomputed output could not be canonically encoded.
    #[error("canonical encoding error: {0}")]
    Canonical(#[from] CanonicalError),

    /// A fixture file is missing or malformed.
    #[error("invalid fixture: {0}")]
    Fixture(String),

    /// The frozen expected hash is not valid hex.
    #[error("invalid expected hash: {0}")]
    ExpectedHash(#[from] TypeError),

    /// I/O failure reading or freezing a fixture.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
