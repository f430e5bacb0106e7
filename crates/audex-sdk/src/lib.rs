//! High-level facade for Audex.
//!
//! [`EvidenceCore`] wires the content-addressed store, the hash-chained
//! ledger, the rule-pack resolver, the optional signer and the evidence
//! registry into one object. This is the entry point for applications
//! embedding Audex; the underlying crates remain available for anything
//! the facade does not cover.

pub mod core;
pub mod error;

pub use crate::core::EvidenceCore;
pub use error::{SdkError, SdkResult};

// Re-export the types callers hold when talking to the facade.
pub use audex_crypto::{LocalHmacSigner, Signature, Signer};
pub use audex_ledger::{Bundle, BundlePolicy, LedgerRecord};
pub use audex_pack::{RulePack, RulePackVersion};
pub use audex_replay::{ReplayCase, ReplayComputer, ReplayResult};
pub use audex_store::{BlobRef, BlobStore, FsBlobStore, InMemoryBlobStore};
pub use audex_types::{ContentHash, EvidenceTarget, EvidenceUri, RecordId};
