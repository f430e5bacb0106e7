use audex_crypto::hash_canonical;
use audex_types::{ContentHash, RecordId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// One immutable entry in a key's record chain.
///
/// `prev_record_hash` is the canonical hash of the previous record for the
/// same key, or the all-zero sentinel for the genesis record. Any
/// retroactive edit to an earlier record breaks every later link, which is
/// what makes the chain tamper-evident.
///
/// Corrections never mutate: a superseding record is appended with
/// `supersedes` pointing at the record it logically replaces, preserving
/// full audit history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Unique identifier of this record.
    pub record_id: RecordId,
    /// Chain key (e.g., a ledger-account/period identifier).
    pub key: String,
    /// 1-based position within the key's chain.
    pub seq: u64,
    /// Content address of the payload in the blob store.
    pub blob_hash: ContentHash,
    /// Canonical hash of the previous record; zero sentinel at genesis.
    pub prev_record_hash: ContentHash,
    /// Record this one logically supersedes, if it is a correction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<RecordId>,
}

impl LedgerRecord {
    /// Canonical hash of this record: SHA-256 over its canonical JSON.
    ///
    /// This is the value the next record in the chain embeds as its
    /// `prev_record_hash`, and the leaf value bundles are built from.
    pub fn record_hash(&self) -> Result<ContentHash, LedgerError> {
        Ok(hash_canonical(self)?)
    }

    /// Whether this is the first record of its chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_record_hash.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64, prev: ContentHash) -> LedgerRecord {
        LedgerRecord {
            record_id: RecordId::new(),
            key: "L-001:2025-07".to_string(),
            seq,
            blob_hash: ContentHash::of(b"payload"),
            prev_record_hash: prev,
            supersedes: None,
        }
    }

    #[test]
    fn record_hash_is_deterministic() {
        let r = record(1, ContentHash::zero());
        assert_eq!(r.record_hash().unwrap(), r.record_hash().unwrap());
    }

    #[test]
    fn record_hash_covers_every_field() {
        let base = record(1, ContentHash::zero());
        let mut changed = base.clone();
        changed.seq = 2;
        assert_ne!(
            base.record_hash().unwrap(),
            changed.record_hash().unwrap()
        );

        let mut changed = base.clone();
        changed.blob_hash = ContentHash::of(b"other payload");
        assert_ne!(
            base.record_hash().unwrap(),
            changed.record_hash().unwrap()
        );

        let mut changed = base.clone();
        changed.supersedes = Some(RecordId::new());
        assert_ne!(
            base.record_hash().unwrap(),
            changed.record_hash().unwrap()
        );
    }

    #[test]
    fn genesis_detection() {
        assert!(record(1, ContentHash::zero()).is_genesis());
        assert!(!record(2, ContentHash::of(b"prev")).is_genesis());
    }

    #[test]
    fn serde_roundtrip() {
        let r = record(3, ContentHash::of(b"prev"));
        let json = serde_json::to_string(&r).unwrap();
        let parsed: LedgerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, parsed);
    }
}
