use chrono::NaiveDate;

/// Errors from rule-pack loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The pack body is malformed (schema, dates, duplicate versions).
    /// Raised at load; the pack is not installed.
    #[error("invalid pack {pack:?}: {reason}")]
    Validation { pack: String, reason: String },

    /// Two versions of one pack have intersecting effective-date windows.
    /// Fail-closed: the entire pack is rejected at load.
    #[error("overlapping windows in pack {pack:?}: {left} and {right}")]
    Overlap {
        pack: String,
        left: String,
        right: String,
    },

    /// No pack with the given name is installed.
    #[error("unknown pack {0:?}")]
    UnknownPack(String),

    /// The date falls into a configuration gap: no version's window
    /// contains it.
    #[error("no active version of pack {pack:?} for {date}")]
    NoActiveVersion { pack: String, date: NaiveDate },

    /// The pack source could not be parsed as JSON or YAML.
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O failure reading a pack file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
