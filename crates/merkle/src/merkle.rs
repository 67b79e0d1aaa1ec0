use sha2::{Digest, Sha256};
use tracing::debug;

/// Root of an empty tree.
pub const ZERO_ROOT: [u8; 32] = [0u8; 32];

/// Ordered sibling hashes from a leaf up to the root.
///
/// No left/right flags are carried: `hash_pair` sorts its inputs, so the
/// fold is position-independent.
pub type MerkleProof = Vec<[u8; 32]>;

/// Merkle tree errors
#[derive(Debug, thiserror::Error)]
pub enum MerkleError {
    #[error("Leaf not found in tree: {0}")]
    LeafNotFound(String),
}

/// Hash two nodes, sorting the pair by byte value first.
pub fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo);
    hasher.update(hi);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Recompute the root by folding a proof over a leaf.
///
/// Pure function; this is exactly what the on-chain claim verifier does.
pub fn verify_proof(root: &[u8; 32], leaf: &[u8; 32], proof: &[[u8; 32]]) -> bool {
    let mut acc = *leaf;
    for sibling in proof {
        acc = hash_pair(&acc, sibling);
    }
    acc == *root
}

/// Deterministic sorted binary Merkle tree.
///
/// Built once per distribution period. Levels are kept so per-leaf
/// proofs can be generated without rebuilding.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// levels[0] = sorted leaves; the last level holds the single root.
    /// Empty for an empty tree.
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree from a set of leaf hashes.
    ///
    /// Leaves are sorted ascending by byte value, then adjacent nodes
    /// are paired and hashed until one root remains. An odd node at any
    /// level is promoted unchanged to the next level. Empty input
    /// yields the [`ZERO_ROOT`] sentinel.
    pub fn from_leaves(leaves: &[[u8; 32]]) -> Self {
        let mut current: Vec<[u8; 32]> = leaves.to_vec();
        current.sort_unstable();

        if current.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = Vec::new();
        while current.len() > 1 {
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for chunk in current.chunks(2) {
                if chunk.len() == 2 {
                    next.push(hash_pair(&chunk[0], &chunk[1]));
                } else {
                    // Odd node carries up unchanged
                    next.push(chunk[0]);
                }
            }
            levels.push(current);
            current = next;
        }
        levels.push(current);

        debug!("Built Merkle tree: {} leaves, {} levels", levels[0].len(), levels.len());
        Self { levels }
    }

    /// The root digest. O(1) after build.
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(ZERO_ROOT)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, |leaves| leaves.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, leaf: &[u8; 32]) -> bool {
        // Leaves are sorted, so membership is a binary search.
        self.levels
            .first()
            .is_some_and(|leaves| leaves.binary_search(leaf).is_ok())
    }

    /// Generate a proof for a leaf.
    pub fn proof(&self, leaf: &[u8; 32]) -> Result<MerkleProof, MerkleError> {
        let leaves = self
            .levels
            .first()
            .ok_or_else(|| MerkleError::LeafNotFound(hex::encode(leaf)))?;
        let mut index = leaves
            .binary_search(leaf)
            .map_err(|_| MerkleError::LeafNotFound(hex::encode(leaf)))?;

        let mut path = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if sibling < level.len() {
                path.push(level[sibling]);
            }
            // A promoted odd node has no sibling at this level
            index /= 2;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn leaf(n: u8) -> [u8; 32] {
        [n; 32]
    }

    #[test]
    fn test_empty_tree_zero_root() {
        let tree = MerkleTree::from_leaves(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), ZERO_ROOT);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tree = MerkleTree::from_leaves(&[leaf(42)]);
        assert_eq!(tree.root(), leaf(42));
        assert_eq!(tree.proof(&leaf(42)).unwrap(), Vec::<[u8; 32]>::new());
    }

    #[test]
    fn test_two_leaves_manual() {
        let tree = MerkleTree::from_leaves(&[leaf(2), leaf(1)]);
        // Pair is sorted before hashing regardless of input order
        assert_eq!(tree.root(), hash_pair(&leaf(1), &leaf(2)));
    }

    #[test]
    fn test_odd_leaf_promoted_unchanged() {
        let tree = MerkleTree::from_leaves(&[leaf(1), leaf(2), leaf(3)]);
        // Level 0: [1, 2, 3] -> level 1: [H(1,2), 3] -> root: H(H(1,2), 3)
        let expected = hash_pair(&hash_pair(&leaf(1), &leaf(2)), &leaf(3));
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_root_order_independent() {
        let mut leaves: Vec<[u8; 32]> = (0..23).map(leaf).collect();
        let root = MerkleTree::from_leaves(&leaves).root();

        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            leaves.shuffle(&mut rng);
            assert_eq!(MerkleTree::from_leaves(&leaves).root(), root);
        }
    }

    #[test]
    fn test_all_proofs_verify() {
        for n in 1..=17u8 {
            let leaves: Vec<[u8; 32]> = (0..n).map(leaf).collect();
            let tree = MerkleTree::from_leaves(&leaves);
            let root = tree.root();
            for l in &leaves {
                let proof = tree.proof(l).unwrap();
                assert!(verify_proof(&root, l, &proof), "leaf {} of {} failed", l[0], n);
            }
        }
    }

    #[test]
    fn test_absent_leaf_proof_fails() {
        let leaves: Vec<[u8; 32]> = (0..8).map(leaf).collect();
        let tree = MerkleTree::from_leaves(&leaves);
        assert!(matches!(tree.proof(&leaf(99)), Err(MerkleError::LeafNotFound(_))));

        // A valid proof for another leaf never verifies a non-member
        let proof = tree.proof(&leaf(3)).unwrap();
        assert!(!verify_proof(&tree.root(), &leaf(99), &proof));
    }

    #[test]
    fn test_tampered_proof_fails() {
        let leaves: Vec<[u8; 32]> = (0..8).map(leaf).collect();
        let tree = MerkleTree::from_leaves(&leaves);
        let mut proof = tree.proof(&leaf(3)).unwrap();
        proof[0][0] ^= 0xFF;
        assert!(!verify_proof(&tree.root(), &leaf(3), &proof));
    }

    #[test]
    fn test_contains() {
        let tree = MerkleTree::from_leaves(&[leaf(5), leaf(9)]);
        assert!(tree.contains(&leaf(5)));
        assert!(!tree.contains(&leaf(6)));
    }
}
