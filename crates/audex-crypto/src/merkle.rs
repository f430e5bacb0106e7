use audex_types::ContentHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Side of a sibling in a Merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Binary SHA-256 Merkle tree over content hashes.
///
/// The root summarizes a fixed, ordered list of leaves; bundle sealing feeds
/// it record hashes sorted by `(key, seq)` so the root is deterministic
/// regardless of original write order. Supports inclusion proofs for
/// compact per-record audit checks.
///
/// An empty leaf list yields the zero root; a lone node at any level is
/// hashed with itself.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Level 0 = leaves; each following level halves (rounding up) until a
    /// single root node. Empty for the empty tree.
    levels: Vec<Vec<ContentHash>>,
}

impl MerkleTree {
    /// Build a tree from ordered leaves.
    pub fn from_leaves(leaves: Vec<ContentHash>) -> Self {
        if leaves.is_empty() {
            return Self { levels: vec![] };
        }

        let mut levels = vec![leaves];
        loop {
            let level = &levels[levels.len() - 1];
            if level.len() == 1 {
                break;
            }
            let next: Vec<ContentHash> = level
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.last().unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    /// The root hash; zero for the empty tree.
    pub fn root(&self) -> ContentHash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(ContentHash::zero)
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaves = self.levels.first()?;
        let leaf = *leaves.get(index)?;

        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling, side) = if position % 2 == 0 {
                // A lone right-edge node was paired with itself.
                (*level.get(position + 1).unwrap_or(&level[position]), Side::Right)
            } else {
                (level[position - 1], Side::Left)
            };
            path.push((sibling, side));
            position /= 2;
        }

        Some(MerkleProof {
            leaf,
            path,
            root: self.root(),
        })
    }
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: ContentHash,
    /// Path of (sibling_hash, sibling_side) pairs from leaf to root.
    pub path: Vec<(ContentHash, Side)>,
    /// Expected root hash.
    pub root: ContentHash,
}

impl MerkleProof {
    /// Verify the proof: recompute the root from the leaf and path.
    pub fn verify(&self) -> bool {
        let computed = self
            .path
            .iter()
            .fold(self.leaf, |acc, (sibling, side)| match side {
                Side::Left => hash_pair(sibling, &acc),
                Side::Right => hash_pair(&acc, sibling),
            });
        computed == self.root
    }
}

fn hash_pair(left: &ContentHash, right: &ContentHash) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(b"audex-merkle-v1:");
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    ContentHash::from_hash(hasher.finalize().into())
}
