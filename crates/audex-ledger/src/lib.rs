//! Append-only, hash-chained evidence ledger.
//!
//! This crate is the heart of Audex. It provides:
//! - Immutable [`LedgerRecord`]s chained per key by canonical record hash
//! - [`Ledger`] append/read operations (single writer per key, concurrent
//!   across keys)
//! - Full-chain integrity verification, including blob re-fetch
//! - Merkle-rooted, optionally signed [`Bundle`]s with JSON export/import
//!
//! Records have exactly one transition: proposed → written. There is no
//! delete and no amend; corrections are new records that supersede earlier
//! ones by key.

pub mod bundle;
pub mod error;
pub mod ledger;
pub mod record;

pub use bundle::{Bundle, BundlePolicy};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use record::LedgerRecord;
