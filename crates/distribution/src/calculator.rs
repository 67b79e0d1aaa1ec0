use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use rewardnet_core::{mul_div_round, Address, ArithmeticError};
use rewardnet_merkle::{verify_proof, MerkleProof, MerkleTree};

/// A finalized per-participant entry for one distribution period.
///
/// Immutable once the period file is published: the index is embedded in
/// the hash preimage, so any reordering would change every leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionEntry {
    pub address: Address,
    /// Claimable amount in smallest units (18-decimal fixed point)
    pub balance: u128,
    /// Leaf hash: SHA256(index_le || address || balance_decimal_string)
    pub hash: [u8; 32],
    /// Dense 0-based position in the period's iteration order
    pub index: u32,
}

impl DistributionEntry {
    /// The carry-forward view of this entry for the next period's run.
    pub fn carry_forward(&self) -> CarryForwardRecord {
        CarryForwardRecord {
            address: self.address.clone(),
            balance: self.balance,
            index: self.index,
        }
    }
}

/// A prior-period balance that may roll into the current period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryForwardRecord {
    pub address: Address,
    pub balance: u128,
    /// The leaf index in the prior period, used for the claimed lookup
    pub index: u32,
}

/// Claimed status of prior-period leaves.
///
/// Supplied by the on-chain layer (the distribution contract's
/// `claimed(index)` view); abstracted so the calculator stays pure.
pub trait ClaimedLookup {
    fn claimed(&self, index: u32) -> bool;
}

/// In-memory claimed set, for tests and offline CLI runs.
#[derive(Debug, Clone, Default)]
pub struct ClaimedSet(HashSet<u32>);

impl ClaimedSet {
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        Self(indices.into_iter().collect())
    }

    pub fn insert(&mut self, index: u32) {
        self.0.insert(index);
    }
}

impl ClaimedLookup for ClaimedSet {
    fn claimed(&self, index: u32) -> bool {
        self.0.contains(&index)
    }
}

/// Iteration order for index assignment.
///
/// The order is part of the published artifact (it is hashed into every
/// leaf), so it is an explicit parameter rather than an accident of map
/// iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    /// Ascending lexicographic order of address — canonical for new
    /// deployments.
    #[default]
    Lexicographic,
    /// Preserve the caller's pair order — for reproducing roots
    /// published by legacy runs that iterated a source file's order.
    Source,
}

/// Distribution calculator errors
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("Cannot allocate a nonzero pool over zero total score")]
    EmptyDistribution,

    #[error("Duplicate address in score set: {0}")]
    DuplicateAddress(String),

    #[error("Arithmetic error for address {address}: {source}")]
    Arithmetic {
        address: String,
        #[source]
        source: ArithmeticError,
    },

    #[error("Total balance overflow")]
    TotalOverflow,
}

/// A computed distribution for one period.
#[derive(Debug, Clone)]
pub struct DistributionOutput {
    /// Entries in index order
    pub entries: Vec<DistributionEntry>,
    /// Sum of all entry balances — the amount the caller must fund
    pub total_balance: u128,
    /// Merkle root over the entry hashes
    pub root: [u8; 32],
    /// The tree itself, for generating per-participant proofs
    tree: MerkleTree,
}

impl DistributionOutput {
    /// Generate a Merkle proof for a participant.
    ///
    /// Returns `None` if the address is not in the distribution.
    pub fn proof_for_address(&self, address: &Address) -> Option<(MerkleProof, u32)> {
        let entry = self.entries.iter().find(|e| &e.address == address)?;
        let proof = self.tree.proof(&entry.hash).ok()?;
        Some((proof, entry.index))
    }
}

/// Compute the leaf hash for one entry.
///
/// Packed preimage, order-sensitive: `index` as little-endian u32, the
/// address bytes, then the balance as its plain base-10 string (the
/// canonical no-exponent rendering used in the period file).
pub fn leaf_hash(index: u32, address: &Address, balance: u128) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(address.as_bytes());
    hasher.update(balance.to_string().as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Verify a claim against a published root. Pure function.
pub fn verify_claim(
    root: &[u8; 32],
    address: &Address,
    balance: u128,
    index: u32,
    proof: &[[u8; 32]],
) -> bool {
    verify_proof(root, &leaf_hash(index, address, balance), proof)
}

/// Compute one period's distribution.
///
/// Each participant's share is `score / total_score * total_amount`,
/// rounded half-up at the smallest unit. If the participant appears in
/// the prior period and that leaf is unclaimed, the prior balance rolls
/// into the new amount. An empty score set is a valid empty
/// distribution; a zero total score with a nonzero pool is not.
pub fn compute_distribution(
    scores: &[(Address, u128)],
    total_amount: u128,
    prior: &[CarryForwardRecord],
    claimed: &dyn ClaimedLookup,
    order: IndexOrder,
) -> Result<DistributionOutput, DistributionError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(scores.len());
    for (address, _) in scores {
        if !seen.insert(address.as_str()) {
            return Err(DistributionError::DuplicateAddress(address.to_string()));
        }
    }

    let mut total_score: u128 = 0;
    for (address, score) in scores {
        total_score = total_score
            .checked_add(*score)
            .ok_or_else(|| DistributionError::Arithmetic {
                address: address.to_string(),
                source: ArithmeticError::Overflow,
            })?;
    }
    if total_score == 0 && total_amount > 0 {
        return Err(DistributionError::EmptyDistribution);
    }

    let mut ordered: Vec<(&Address, u128)> =
        scores.iter().map(|(a, s)| (a, *s)).collect();
    if order == IndexOrder::Lexicographic {
        ordered.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    let prior_by_address: HashMap<&str, &CarryForwardRecord> =
        prior.iter().map(|rec| (rec.address.as_str(), rec)).collect();

    let mut entries = Vec::with_capacity(ordered.len());
    let mut hashes = Vec::with_capacity(ordered.len());
    let mut total_balance: u128 = 0;

    for (i, (address, score)) in ordered.into_iter().enumerate() {
        let mut amount = if total_score == 0 {
            0
        } else {
            mul_div_round(score, total_amount, total_score).map_err(|source| {
                DistributionError::Arithmetic {
                    address: address.to_string(),
                    source,
                }
            })?
        };

        // Unclaimed prior balance rolls forward instead of being lost
        if let Some(rec) = prior_by_address.get(address.as_str()) {
            if !claimed.claimed(rec.index) {
                amount = amount.checked_add(rec.balance).ok_or_else(|| {
                    DistributionError::Arithmetic {
                        address: address.to_string(),
                        source: ArithmeticError::Overflow,
                    }
                })?;
                debug!(
                    "Carry-forward for {}: prior index {} balance {}",
                    address, rec.index, rec.balance
                );
            }
        }

        let index = i as u32;
        let hash = leaf_hash(index, address, amount);
        hashes.push(hash);
        entries.push(DistributionEntry {
            address: address.clone(),
            balance: amount,
            hash,
            index,
        });
        total_balance = total_balance
            .checked_add(amount)
            .ok_or(DistributionError::TotalOverflow)?;
    }

    let tree = MerkleTree::from_leaves(&hashes);
    let root = tree.root();

    info!(
        "Computed distribution: {} entries, total balance {}, root {}",
        entries.len(),
        total_balance,
        hex::encode(root)
    );

    Ok(DistributionOutput {
        entries,
        total_balance,
        root,
        tree,
    })
}
