//! Replay verification for Audex.
//!
//! A closed accounting period freezes its inputs, the rule-pack versions
//! that were active, and the hash of the canonical output. Replay
//! recomputes the output from exactly those frozen parts and compares
//! hashes, proving (or disproving) that history is byte-for-byte
//! reproducible.
//!
//! The computation itself lives with the report modules, behind
//! [`ReplayComputer`]; this crate fixes only canonicalization, hashing,
//! comparison, and the frozen fixture layout. A mismatch is an expected,
//! informative outcome — it is a result value with diff context, never an
//! error.

pub mod engine;
pub mod error;
pub mod fixture;

pub use engine::{ReplayCase, ReplayComputer, ReplayEngine, ReplayResult, ResolvedPackVersion};
pub use error::ReplayError;
pub use fixture::{CaseManifest, FixtureDir};
