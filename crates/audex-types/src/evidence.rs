use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::record_id::RecordId;

const SCHEME: &str = "evidence";

/// Opaque evidence node identifier: `evidence://<source>/<type>/<period>/<node-id>`.
///
/// External collaborators store these strings alongside computed figures.
/// The URI carries no ownership — it is a lookup key that the core resolves
/// back to a blob or ledger record. Serializes as the URI string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvidenceUri {
    /// Originating system (e.g., `bank-feed`, `invoice-ocr`).
    pub source: String,
    /// Artifact type within the source (e.g., `statement`, `receipt`).
    pub kind: String,
    /// Accounting period the figure belongs to (e.g., `2025-07`).
    pub period: String,
    /// Node identifier within the period, unique per `(source, kind, period)`.
    pub node_id: String,
}

impl EvidenceUri {
    /// Build a URI from its four segments.
    ///
    /// Fails if any segment is empty or contains `/`.
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        period: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let uri = Self {
            source: source.into(),
            kind: kind.into(),
            period: period.into(),
            node_id: node_id.into(),
        };
        uri.validate()?;
        Ok(uri)
    }

    /// Parse from the `evidence://...` string form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidEvidenceUri {
            uri: s.to_string(),
            reason: reason.to_string(),
        };

        let rest = s
            .strip_prefix("evidence://")
            .ok_or_else(|| invalid("missing evidence:// scheme"))?;
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() != 4 {
            return Err(invalid("expected <source>/<type>/<period>/<node-id>"));
        }

        let uri = Self {
            source: segments[0].to_string(),
            kind: segments[1].to_string(),
            period: segments[2].to_string(),
            node_id: segments[3].to_string(),
        };
        uri.validate()?;
        Ok(uri)
    }

    fn validate(&self) -> Result<(), TypeError> {
        for (name, segment) in [
            ("source", &self.source),
            ("type", &self.kind),
            ("period", &self.period),
            ("node-id", &self.node_id),
        ] {
            if segment.is_empty() {
                return Err(TypeError::InvalidEvidenceUri {
                    uri: self.to_string(),
                    reason: format!("empty {name} segment"),
                });
            }
            if segment.contains('/') {
                return Err(TypeError::InvalidEvidenceUri {
                    uri: self.to_string(),
                    reason: format!("{name} segment contains '/'"),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for EvidenceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}://{}/{}/{}/{}",
            self.source, self.kind, self.period, self.node_id
        )
    }
}

impl FromStr for EvidenceUri {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EvidenceUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EvidenceUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

/// What an [`EvidenceUri`] resolves to inside the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceTarget {
    /// A content-addressed blob.
    Blob(ContentHash),
    /// A ledger record.
    Record(RecordId),
}
