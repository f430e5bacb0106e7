use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use audex_crypto::Signer;
use audex_ledger::{Bundle, Ledger, LedgerRecord};
use audex_pack::{RulePackResolver, RulePackVersion};
use audex_replay::{ReplayCase, ReplayComputer, ReplayEngine, ReplayResult};
use audex_store::{BlobRef, BlobStore, InMemoryBlobStore};
use audex_types::{ContentHash, EvidenceTarget, EvidenceUri, RecordId};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

/// High-level Audex core: one object wiring the blob store, the record
/// ledger, the rule-pack resolver, the optional signer and the evidence
/// registry together.
///
/// Applications that embed Audex talk to this; the underlying crates stay
/// reachable through accessors for anything the facade does not cover.
pub struct EvidenceCore<S: BlobStore> {
    store: Arc<S>,
    ledger: Ledger<S>,
    resolver: RulePackResolver,
    signer: Option<Box<dyn Signer>>,
    evidence: RwLock<HashMap<EvidenceUri, EvidenceTarget>>,
    // RecordId -> (key, seq) so evidence targets can be fetched without a
    // full ledger scan. Populated by the append paths below.
    record_index: RwLock<HashMap<RecordId, (String, u64)>>,
}

impl EvidenceCore<InMemoryBlobStore> {
    /// A core over an in-memory store, unsigned. The usual test and
    /// embedding entry point.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBlobStore::new()))
    }
}

impl<S: BlobStore> EvidenceCore<S> {
    /// Create an unsigned core over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            ledger: Ledger::new(Arc::clone(&store)),
            store,
            resolver: RulePackResolver::new(),
            signer: None,
            evidence: RwLock::new(HashMap::new()),
            record_index: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a signer; sealed bundles can then be signed.
    pub fn with_signer(mut self, signer: Box<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    // ---- Blob operations ----

    /// Store raw content, returning its content-addressed reference.
    pub fn put_blob(&self, content: &[u8], content_type: &str) -> SdkResult<BlobRef> {
        Ok(self.store.write(content, content_type)?)
    }

    /// Read a blob's bytes back by hash.
    pub fn get_blob(&self, hash: &ContentHash) -> SdkResult<Vec<u8>> {
        Ok(self.store.read(hash)?)
    }

    // ---- Ledger operations ----

    /// Append a payload under `key`.
    pub fn append(&self, key: &str, payload: &[u8]) -> SdkResult<LedgerRecord> {
        let record = self.ledger.write(key, payload)?;
        self.index_record(&record);
        Ok(record)
    }

    /// Append a correction superseding an earlier record.
    pub fn append_superseding(
        &self,
        key: &str,
        payload: &[u8],
        supersedes: RecordId,
    ) -> SdkResult<LedgerRecord> {
        let record = self.ledger.write_superseding(key, payload, supersedes)?;
        self.index_record(&record);
        Ok(record)
    }

    /// Latest payload for `key`.
    pub fn read(&self, key: &str) -> SdkResult<Vec<u8>> {
        Ok(self.ledger.read(key)?)
    }

    /// All records for `key`, in chain order.
    pub fn records(&self, key: &str) -> SdkResult<Vec<LedgerRecord>> {
        Ok(self.ledger.records(key)?)
    }

    /// Walk `key`'s full chain and verify it end to end.
    pub fn verify_key(&self, key: &str) -> SdkResult<bool> {
        Ok(self.ledger.verify_integrity(key)?)
    }

    // ---- Bundles ----

    /// Seal a closed record range into an unsigned bundle.
    pub fn seal(&self, records: &[LedgerRecord]) -> SdkResult<Bundle> {
        let bundle = Bundle::seal(records)?;
        info!(
            bundle = %bundle.bundle_id,
            records = bundle.record_hashes.len(),
            root = %bundle.merkle_root.short_hex(),
            "bundle sealed"
        );
        Ok(bundle)
    }

    /// Seal and sign in one step. Fails with [`SdkError::NoSigner`] when no
    /// signer is configured.
    pub fn seal_signed(&self, records: &[LedgerRecord]) -> SdkResult<Bundle> {
        let signer = self.signer.as_deref().ok_or(SdkError::NoSigner)?;
        let mut bundle = self.seal(records)?;
        bundle.sign(signer)?;
        Ok(bundle)
    }

    /// Verify an imported bundle: root recomputation plus, when this core
    /// carries a signer, the detached signature.
    ///
    /// A core with a signer requires the bundle to be signed: an absent
    /// signature fails verification, so stripping it in transit cannot
    /// downgrade an authenticity check to integrity-only.
    pub fn verify_bundle(&self, bundle: &Bundle) -> SdkResult<bool> {
        if !bundle.verify_root() {
            return Ok(false);
        }
        match &self.signer {
            Some(signer) => Ok(bundle.verify_signature(signer.as_ref())?),
            None => Ok(true),
        }
    }

    // ---- Rule packs ----

    /// Parse, validate and install a JSON rule pack. Fails closed.
    pub fn load_pack_json(&self, json: &str) -> SdkResult<()> {
        Ok(self.resolver.load_json_str(json)?)
    }

    /// Load a rule pack file (`.json`, `.yaml`/`.yml`). Fails closed.
    pub fn load_pack_path(&self, path: impl AsRef<std::path::Path>) -> SdkResult<()> {
        Ok(self.resolver.load_path(path)?)
    }

    /// The unique active version of `pack_name` on `date`.
    pub fn active_version(&self, pack_name: &str, date: NaiveDate) -> SdkResult<RulePackVersion> {
        Ok(self.resolver.resolve(pack_name, date)?)
    }

    // ---- Evidence registry ----

    /// Register an evidence URI pointing at a blob or record.
    ///
    /// Re-registering the same URI with the same target is idempotent;
    /// pointing it somewhere else is a conflict. A record target must have
    /// been appended through this core.
    pub fn register_evidence(&self, uri: EvidenceUri, target: EvidenceTarget) -> SdkResult<()> {
        if let EvidenceTarget::Record(record_id) = target {
            if !self
                .record_index
                .read()
                .expect("lock poisoned")
                .contains_key(&record_id)
            {
                return Err(SdkError::UnknownRecord(record_id));
            }
        }

        let mut evidence = self.evidence.write().expect("lock poisoned");
        match evidence.get(&uri) {
            Some(existing) if *existing == target => Ok(()),
            Some(_) => Err(SdkError::EvidenceConflict(uri)),
            None => {
                debug!(uri = %uri, "evidence registered");
                evidence.insert(uri, target);
                Ok(())
            }
        }
    }

    /// Resolve a URI to its registered target.
    pub fn resolve_evidence(&self, uri: &EvidenceUri) -> SdkResult<EvidenceTarget> {
        self.evidence
            .read()
            .expect("lock poisoned")
            .get(uri)
            .copied()
            .ok_or_else(|| SdkError::EvidenceNotFound(uri.clone()))
    }

    /// Resolve a URI all the way to payload bytes: the blob itself, or the
    /// referenced record's payload.
    pub fn evidence_bytes(&self, uri: &EvidenceUri) -> SdkResult<Vec<u8>> {
        match self.resolve_evidence(uri)? {
            EvidenceTarget::Blob(hash) => Ok(self.store.read(&hash)?),
            EvidenceTarget::Record(record_id) => {
                let record = self.evidence_record_by_id(record_id)?;
                Ok(self.store.read(&record.blob_hash)?)
            }
        }
    }

    /// Resolve a URI to the stored reference of its payload blob — the
    /// blob itself, or the referenced record's payload blob.
    pub fn evidence_blob_ref(&self, uri: &EvidenceUri) -> SdkResult<BlobRef> {
        let hash = match self.resolve_evidence(uri)? {
            EvidenceTarget::Blob(hash) => hash,
            EvidenceTarget::Record(record_id) => {
                self.evidence_record_by_id(record_id)?.blob_hash
            }
        };
        Ok(self.store.stat(&hash)?)
    }

    /// Resolve a URI to the ledger record it references.
    pub fn evidence_record(&self, uri: &EvidenceUri) -> SdkResult<LedgerRecord> {
        match self.resolve_evidence(uri)? {
            EvidenceTarget::Record(record_id) => self.evidence_record_by_id(record_id),
            EvidenceTarget::Blob(_) => Err(SdkError::NotARecord(uri.clone())),
        }
    }

    // ---- Replay ----

    /// Replay a frozen case against a computation.
    pub fn replay<C: ReplayComputer>(
        &self,
        case: &ReplayCase,
        computer: &C,
    ) -> SdkResult<ReplayResult> {
        Ok(ReplayEngine::replay(case, computer)?)
    }

    // ---- Accessors ----

    pub fn store(&self) -> &Arc<S> {
        self.ledger.store()
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn resolver(&self) -> &RulePackResolver {
        &self.resolver
    }

    fn index_record(&self, record: &LedgerRecord) {
        self.record_index
            .write()
            .expect("lock poisoned")
            .insert(record.record_id, (record.key.clone(), record.seq));
    }

    fn evidence_record_by_id(&self, record_id: RecordId) -> SdkResult<LedgerRecord> {
        let (key, seq) = self
            .record_index
            .read()
            .expect("lock poisoned")
            .get(&record_id)
            .cloned()
            .ok_or(SdkError::UnknownRecord(record_id))?;
        let records = self.ledger.records(&key)?;
        records
            .into_iter()
            .find(|r| r.seq == seq && r.record_id == record_id)
            .ok_or(SdkError::UnknownRecord(record_id))
    }
}

impl<S: BlobStore> std::fmt::Debug for EvidenceCore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceCore")
            .field("ledger", &self.ledger)
            .field("signer", &self.signer.as_ref().map(|s| s.signer_id()))
            .finish()
    }
}
