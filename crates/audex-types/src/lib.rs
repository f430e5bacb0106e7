//! Foundation types for Audex, the evidence and compliance-versioning core.
//!
//! This crate provides the identity and addressing types used throughout the
//! Audex workspace. Every other Audex crate depends on `audex-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] — Content-addressed identifier (SHA-256 hash)
//! - [`RecordId`] — UUID v7 ledger record identifier
//! - [`EvidenceUri`] — `evidence://` node identifier attached to computed figures

pub mod error;
pub mod evidence;
pub mod hash;
pub mod record_id;

pub use error::TypeError;
pub use evidence::{EvidenceTarget, EvidenceUri};
pub use hash::ContentHash;
pub use record_id::RecordId;
