use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// A detached signature over a byte string.
///
/// Carries the id of the signer that produced it so exports stay
/// self-describing; the value is hex in JSON.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Identifier of the key/signer that produced this signature.
    pub signer_id: String,
    /// Raw signature bytes.
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signature({}, {}...)",
            self.signer_id,
            hex::encode(&self.value[..self.value.len().min(8)])
        )
    }
}

/// Signing capability: stateless sign/verify over byte strings.
///
/// The ledger and export paths depend only on this trait, never on a
/// concrete signer, so a remote/KMS-backed asymmetric signer can be swapped
/// in without changing callers. Implementations must be deterministic for a
/// fixed key and must never perform I/O beyond the cryptographic primitive
/// itself; a remote implementation is the only place timeouts/retries
/// belong, and its transport failures must stay distinguishable from
/// verification failures.
pub trait Signer: Send + Sync {
    /// Identifier recorded alongside produced signatures.
    fn signer_id(&self) -> &str;

    /// Sign a message.
    fn sign(&self, message: &[u8]) -> Signature;

    /// Verify a signature over a message.
    ///
    /// Returns `false` for any mismatch — wrong bytes, wrong key, or a
    /// signature produced by a different signer id. Never panics on
    /// malformed input.
    fn verify(&self, message: &[u8], signature: &Signature) -> bool;
}

/// Local symmetric signer: HMAC-SHA256 with key material supplied at
/// construction. Pure computation, no I/O, fully deterministic.
pub struct LocalHmacSigner {
    signer_id: String,
    mac: HmacSha256,
}

impl LocalHmacSigner {
    /// Create a signer from an id and symmetric key material.
    ///
    /// Fails if the key material is absent or unusable; this is the only
    /// point at which key problems surface.
    pub fn new(signer_id: impl Into<String>, key: &[u8]) -> Result<Self, SignerError> {
        if key.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| SignerError::InvalidKey)?;
        Ok(Self {
            signer_id: signer_id.into(),
            mac,
        })
    }
}

impl Signer for LocalHmacSigner {
    fn signer_id(&self) -> &str {
        &self.signer_id
    }

    fn sign(&self, message: &[u8]) -> Signature {
        let mut mac = self.mac.clone();
        mac.update(message);
        Signature {
            signer_id: self.signer_id.clone(),
            value: mac.finalize().into_bytes().to_vec(),
        }
    }

    fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        if signature.signer_id != self.signer_id {
            return false;
        }
        let mut mac = self.mac.clone();
        mac.update(message);
        // Constant-time comparison.
        mac.verify_slice(&signature.value).is_ok()
    }
}

impl std::fmt::Debug for LocalHmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalHmacSigner({}, key <redacted>)", self.signer_id)
    }
}

/// Errors from signer construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("key material is empty")]
    EmptyKey,
    #[error("key material is invalid")]
    InvalidKey,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
