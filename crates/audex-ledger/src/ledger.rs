use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use audex_store::{BlobStore, StoreError};
use audex_types::{ContentHash, RecordId};
use tracing::debug;

use crate::error::LedgerError;
use crate::record::LedgerRecord;

/// Append-only record ledger over a content-addressed blob store.
///
/// Each key owns an independent hash chain. Writes for one key are
/// serialized through a per-key mutex (single writer per key); writes for
/// different keys proceed concurrently, as do all reads and integrity
/// walks.
pub struct Ledger<S: BlobStore> {
    store: Arc<S>,
    chains: RwLock<HashMap<String, Arc<Mutex<Vec<LedgerRecord>>>>>,
}

impl<S: BlobStore> Ledger<S> {
    /// Create a ledger backed by the given blob store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying blob store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Append a payload under `key`.
    ///
    /// Stores the payload as a blob, then appends a record whose
    /// `prev_record_hash` is the canonical hash of the key's current latest
    /// record (the zero sentinel at genesis).
    pub fn write(&self, key: &str, payload: &[u8]) -> Result<LedgerRecord, LedgerError> {
        self.append(key, payload, None)
    }

    /// Append a correction that logically supersedes an earlier record.
    ///
    /// The earlier record is untouched; supersession is a forward pointer,
    /// never a rewrite.
    pub fn write_superseding(
        &self,
        key: &str,
        payload: &[u8],
        supersedes: RecordId,
    ) -> Result<LedgerRecord, LedgerError> {
        self.append(key, payload, Some(supersedes))
    }

    fn append(
        &self,
        key: &str,
        payload: &[u8],
        supersedes: Option<RecordId>,
    ) -> Result<LedgerRecord, LedgerError> {
        let chain = self.chain_handle(key);
        // Per-key writer lock: all chain reads and the blob write happen
        // inside it so concurrent writers to the same key cannot interleave.
        let mut records = chain.lock().expect("lock poisoned");

        let blob_ref = self.store.write(payload, "application/octet-stream")?;
        let prev_record_hash = match records.last() {
            Some(prev) => prev.record_hash()?,
            None => ContentHash::zero(),
        };

        let record = LedgerRecord {
            record_id: RecordId::new(),
            key: key.to_string(),
            seq: records.len() as u64 + 1,
            blob_hash: blob_ref.hash,
            prev_record_hash,
            supersedes,
        };
        records.push(record.clone());
        debug!(key, seq = record.seq, blob = %record.blob_hash.short_hex(), "record appended");
        Ok(record)
    }

    /// Read the latest record's payload for `key`.
    pub fn read(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        let latest = self.latest(key)?;
        Ok(self.store.read(&latest.blob_hash)?)
    }

    /// The latest record for `key`.
    pub fn latest(&self, key: &str) -> Result<LedgerRecord, LedgerError> {
        let mut records = self.records(key)?;
        records
            .pop()
            .ok_or_else(|| LedgerError::KeyNotFound(key.to_string()))
    }

    /// All records for `key`, in chain order.
    pub fn records(&self, key: &str) -> Result<Vec<LedgerRecord>, LedgerError> {
        let chains = self.chains.read().expect("lock poisoned");
        let chain = chains
            .get(key)
            .ok_or_else(|| LedgerError::KeyNotFound(key.to_string()))?;
        let records = chain.lock().expect("lock poisoned");
        Ok(records.clone())
    }

    /// All keys with at least one record, sorted.
    pub fn keys(&self) -> Vec<String> {
        let chains = self.chains.read().expect("lock poisoned");
        let mut keys: Vec<String> = chains.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Walk the full chain for `key` and verify it end to end.
    ///
    /// Recomputes every `prev_record_hash` link from canonical record
    /// hashes, checks sequence and key consistency, and independently
    /// re-fetches every referenced blob to confirm its bytes still hash to
    /// their address. Returns `false` on the first mismatch. Read-only:
    /// detection, never repair.
    ///
    /// An unknown key is a caller error ([`LedgerError::KeyNotFound`]), not
    /// evidence of tampering.
    pub fn verify_integrity(&self, key: &str) -> Result<bool, LedgerError> {
        let records = self.records(key)?;

        let mut expected_prev = ContentHash::zero();
        for (index, record) in records.iter().enumerate() {
            if record.key != key || record.seq != index as u64 + 1 {
                return Ok(false);
            }
            if record.prev_record_hash != expected_prev {
                return Ok(false);
            }
            match self.store.read(&record.blob_hash) {
                Ok(_) => {}
                Err(StoreError::NotFound(_) | StoreError::HashMismatch { .. }) => {
                    return Ok(false)
                }
                Err(e) => return Err(e.into()),
            }
            expected_prev = record.record_hash()?;
        }
        Ok(true)
    }

    fn chain_handle(&self, key: &str) -> Arc<Mutex<Vec<LedgerRecord>>> {
        if let Some(chain) = self.chains.read().expect("lock poisoned").get(key) {
            return Arc::clone(chain);
        }
        let mut chains = self.chains.write().expect("lock poisoned");
        Arc::clone(chains.entry(key.to_string()).or_default())
    }
}

impl<S: BlobStore> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains = self.chains.read().expect("lock poisoned");
        f.debug_struct("Ledger")
            .field("key_count", &chains.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audex_store::InMemoryBlobStore;

    fn ledger() -> Ledger<InMemoryBlobStore> {
        Ledger::new(Arc::new(InMemoryBlobStore::new()))
    }

    #[test]
    fn write_chains_records() {
        let ledger = ledger();
        let r1 = ledger.write("L-001:2025-07", b"p1").unwrap();
        let r2 = ledger.write("L-001:2025-07", b"p2").unwrap();
        let r3 = ledger.write("L-001:2025-07", b"p3").unwrap();

        assert!(r1.is_genesis());
        assert_eq!(r2.prev_record_hash, r1.record_hash().unwrap());
        assert_eq!(r3.prev_record_hash, r2.record_hash().unwrap());
        assert_eq!((r1.seq, r2.seq, r3.seq), (1, 2, 3));
    }

    #[test]
    fn read_returns_latest_payload() {
        let ledger = ledger();
        ledger.write("k", b"first").unwrap();
        ledger.write("k", b"second").unwrap();
        assert_eq!(ledger.read("k").unwrap(), b"second");
    }

    #[test]
    fn read_unknown_key_fails() {
        let ledger = ledger();
        assert!(matches!(
            ledger.read("nope"),
            Err(LedgerError::KeyNotFound(_))
        ));
    }

    #[test]
    fn records_snapshot_is_detached_from_the_chain() {
        let ledger = ledger();
        ledger.write("k", b"p1").unwrap();
        let snapshot = ledger.records("k").unwrap();
        ledger.write("k", b"p2").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.records("k").unwrap().len(), 2);
    }

    #[test]
    fn keys_are_independent_chains() {
        let ledger = ledger();
        let a = ledger.write("a", b"pa").unwrap();
        let b = ledger.write("b", b"pb").unwrap();
        assert!(a.is_genesis());
        assert!(b.is_genesis());
        assert_eq!(ledger.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn supersession_is_append_only() {
        let ledger = ledger();
        let original = ledger.write("k", b"wrong figure").unwrap();
        let correction = ledger
            .write_superseding("k", b"right figure", original.record_id)
            .unwrap();

        assert_eq!(correction.supersedes, Some(original.record_id));
        // Original record is still present, untouched.
        let records = ledger.records("k").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], original);
        assert_eq!(ledger.read("k").unwrap(), b"right figure");
    }

    #[test]
    fn verify_integrity_of_intact_chain() {
        let ledger = ledger();
        for payload in [b"p1".as_slice(), b"p2", b"p3"] {
            ledger.write("k", payload).unwrap();
        }
        assert!(ledger.verify_integrity("k").unwrap());
    }

    #[test]
    fn verify_integrity_unknown_key_is_an_error() {
        let ledger = ledger();
        assert!(matches!(
            ledger.verify_integrity("nope"),
            Err(LedgerError::KeyNotFound(_))
        ));
    }

    #[test]
    fn corrupted_blob_fails_integrity() {
        let ledger = ledger();
        ledger.write("k", b"p1").unwrap();
        let r2 = ledger.write("k", b"p2").unwrap();
        ledger.write("k", b"p3").unwrap();

        assert!(ledger
            .store()
            .corrupt_for_test(&r2.blob_hash, b"tampered".to_vec()));
        assert!(!ledger.verify_integrity("k").unwrap());
    }

    #[test]
    fn corrupted_chain_pointer_fails_integrity() {
        let ledger = ledger();
        ledger.write("k", b"p1").unwrap();
        ledger.write("k", b"p2").unwrap();
        ledger.write("k", b"p3").unwrap();

        {
            let chains = ledger.chains.read().expect("lock poisoned");
            let chain = chains.get("k").unwrap();
            let mut records = chain.lock().expect("lock poisoned");
            records[1].prev_record_hash = ContentHash::of(b"forged");
        }
        assert!(!ledger.verify_integrity("k").unwrap());
    }

    #[test]
    fn rewritten_payload_hash_fails_integrity() {
        let ledger = ledger();
        ledger.write("k", b"p1").unwrap();
        ledger.write("k", b"p2").unwrap();

        // Point a record at a different (existing) blob: the chain links no
        // longer match the recomputed record hashes.
        let other = ledger.store().write(b"other", "text/plain").unwrap();
        {
            let chains = ledger.chains.read().expect("lock poisoned");
            let mut records = chains.get("k").unwrap().lock().expect("lock poisoned");
            records[0].blob_hash = other.hash;
        }
        assert!(!ledger.verify_integrity("k").unwrap());
    }

    #[test]
    fn concurrent_writes_across_keys() {
        use std::thread;

        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let key = format!("key-{i}");
                    for n in 0..25u32 {
                        ledger.write(&key, &n.to_be_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        for i in 0..4 {
            let key = format!("key-{i}");
            assert_eq!(ledger.records(&key).unwrap().len(), 25);
            assert!(ledger.verify_integrity(&key).unwrap());
        }
    }

    #[test]
    fn concurrent_writes_same_key_stay_ordered() {
        use std::thread;

        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for n in 0..10u32 {
                        ledger.write("shared", &[i, n as u8]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let records = ledger.records("shared").unwrap();
        assert_eq!(records.len(), 40);
        // Total order per key regardless of writer interleaving.
        assert!(ledger.verify_integrity("shared").unwrap());
    }
}
