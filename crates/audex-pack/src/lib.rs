//! Versioned, effective-dated rule configuration for Audex.
//!
//! Rule packs carry the regulatory/configuration data that closed-period
//! computations depend on (tax tables, report layouts, validation rules).
//! Each pack is a set of versions with non-overlapping effective-date
//! windows; loading fails closed on any ambiguity, and resolution for a
//! date is deterministic or an explicit gap error — never a silent
//! fallback to "latest".
//!
//! Window semantics: `effective_to` is **inclusive**, `null` means
//! open-ended. Adjacent windows (next `effective_from` is exactly the day
//! after the previous `effective_to`) are legal.

pub mod error;
pub mod resolver;
pub mod version;

pub use error::PackError;
pub use resolver::{PackSnapshot, RulePackResolver};
pub use version::{EffectiveWindow, RulePack, RulePackVersion};
