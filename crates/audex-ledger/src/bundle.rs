use audex_crypto::{to_canonical_json, MerkleProof, MerkleTree, Signature, Signer};
use audex_types::ContentHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::record::LedgerRecord;

/// Sealed, Merkle-rooted snapshot of a closed record range.
///
/// Record hashes are ordered by `(key, seq)` — not arrival time — so the
/// root is deterministic under concurrent writes. The optional signature is
/// stored alongside the root, never fused into it: integrity
/// (`verify_root`) and authenticity (`verify_signature`) stay independently
/// checkable.
///
/// Serializes to exactly the bundle export wire format:
/// `{"bundle_id", "record_hashes", "merkle_root", "signature"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Unique bundle identifier.
    pub bundle_id: Uuid,
    /// Canonical record hashes, sorted by `(key, seq)`.
    pub record_hashes: Vec<ContentHash>,
    /// Merkle root over `record_hashes` in order.
    pub merkle_root: ContentHash,
    /// Detached signature over the unsigned export body, if signed.
    pub signature: Option<Signature>,
}

impl Bundle {
    /// Seal a closed range of records into a bundle.
    ///
    /// The caller is responsible for quiescence: no writer may still be
    /// appending into the range being sealed. Records may span multiple
    /// keys; they are sorted by `(key, seq)` before hashing so the same set
    /// always yields the same root. Handing in the same record twice is an
    /// error.
    pub fn seal(records: &[LedgerRecord]) -> Result<Self, LedgerError> {
        let mut sorted: Vec<&LedgerRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.key.cmp(&b.key).then(a.seq.cmp(&b.seq)));
        for pair in sorted.windows(2) {
            if pair[0].key == pair[1].key && pair[0].seq == pair[1].seq {
                return Err(LedgerError::DuplicateRecord {
                    key: pair[1].key.clone(),
                    seq: pair[1].seq,
                });
            }
        }

        let record_hashes = sorted
            .iter()
            .map(|r| r.record_hash())
            .collect::<Result<Vec<_>, _>>()?;
        let merkle_root = MerkleTree::from_leaves(record_hashes.clone()).root();

        Ok(Self {
            bundle_id: Uuid::now_v7(),
            record_hashes,
            merkle_root,
            signature: None,
        })
    }

    /// Sign the bundle with the given signer.
    ///
    /// The signature covers the canonical JSON of the unsigned export body,
    /// binding the id, the full ordered hash list and the root.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), LedgerError> {
        let message = self.signable_bytes()?;
        self.signature = Some(signer.sign(&message));
        Ok(())
    }

    /// Recompute the Merkle root from the record hashes and compare.
    pub fn verify_root(&self) -> bool {
        MerkleTree::from_leaves(self.record_hashes.clone()).root() == self.merkle_root
    }

    /// Build an inclusion proof for one sealed record hash.
    ///
    /// Returns `None` if the hash is not part of this bundle. The proof
    /// carries this bundle's root, so an auditor holding only the record
    /// hash and the exported root can check membership without the rest of
    /// the bundle.
    pub fn prove_inclusion(&self, record_hash: &ContentHash) -> Option<MerkleProof> {
        let index = self.record_hashes.iter().position(|h| h == record_hash)?;
        MerkleTree::from_leaves(self.record_hashes.clone()).proof(index)
    }

    /// Verify the detached signature, if present.
    ///
    /// Returns `false` for an unsigned bundle or any verification failure.
    pub fn verify_signature(&self, signer: &dyn Signer) -> Result<bool, LedgerError> {
        match &self.signature {
            Some(signature) => {
                let message = self.signable_bytes()?;
                Ok(signer.verify(&message, signature))
            }
            None => Ok(false),
        }
    }

    /// Export as the JSON wire format.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Import from the JSON wire format. Shape only; call [`verify_root`]
    /// and [`verify_signature`] to check the content.
    ///
    /// [`verify_root`]: Bundle::verify_root
    /// [`verify_signature`]: Bundle::verify_signature
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    fn signable_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let unsigned = Self {
            bundle_id: self.bundle_id,
            record_hashes: self.record_hashes.clone(),
            merkle_root: self.merkle_root,
            signature: None,
        };
        Ok(to_canonical_json(&unsigned)?)
    }
}

/// Sealing-cadence policy. When to seal is an external decision; the core
/// only offers the simple size-based default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundlePolicy {
    /// Seal once at least this many records are pending.
    SizeBased(usize),
}

impl BundlePolicy {
    /// Whether a pending range of `pending` records should be sealed now.
    pub fn should_seal(&self, pending: usize) -> bool {
        match self {
            Self::SizeBased(threshold) => pending >= *threshold,
        }
    }
}
