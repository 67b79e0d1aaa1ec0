//! RewardNet Merkle
//!
//! Deterministic sorted binary Merkle tree over 32-byte leaf hashes.
//!
//! The `MerkleTree` is used by the distribution calculator (to build the
//! per-period root with a proof for each participant) and mirrors the
//! on-chain claim verifier, which folds the same pairwise-sorted hash
//! rule over a published root. Leaves are sorted before building and
//! every pair's children are sorted before hashing, so two independently
//! built trees over the same leaf set match bit-for-bit regardless of
//! insertion order.

mod merkle;

pub use merkle::{hash_pair, verify_proof, MerkleError, MerkleProof, MerkleTree, ZERO_ROOT};
