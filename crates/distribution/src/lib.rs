//! RewardNet Distribution
//!
//! The per-period distribution calculator: converts a snapshot of
//! participant scores plus an optional carry-forward list from the prior
//! period into a finalized, hashed distribution with a Merkle root ready
//! for on-chain publication.
//!
//! Publishing the root and funding the distribution contract are the
//! caller's responsibility; this crate only computes the entries, the
//! tree, and the total the caller must fund.

mod calculator;
mod store;

pub use calculator::{
    compute_distribution, leaf_hash, verify_claim, CarryForwardRecord, ClaimedLookup, ClaimedSet,
    DistributionEntry, DistributionError, DistributionOutput, IndexOrder,
};
pub use store::{load_period_file, period_file_name, save_period_file, StoreError};
