//! Cryptographic primitives for Audex.
//!
//! Provides SHA-256 content hashing, canonical JSON encoding (the fixed
//! serialization used before every hash), binary Merkle trees with inclusion
//! proofs, and a pluggable signing capability with a local HMAC-SHA256
//! default.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod canonical;
pub mod hasher;
pub mod merkle;
pub mod signer;

pub use canonical::{to_canonical_json, CanonicalError};
pub use hasher::{hash_canonical, sha256};
pub use merkle::{MerkleProof, MerkleTree, Side};
pub use signer::{LocalHmacSigner, Signature, Signer, SignerError};
