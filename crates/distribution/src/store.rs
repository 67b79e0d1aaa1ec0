//! Period-file persistence.
//!
//! One JSON array per period of `{address, balance, hash, index}` —
//! the period's canonical published record. Balances are plain decimal
//! strings (no exponent notation) and hashes are hex. The previous
//! period's file doubles as the carry-forward input for the next run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rewardnet_core::Address;

use crate::DistributionEntry;

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read period file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Failed to write period file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Failed to parse period file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid entry for address {address}: {reason}")]
    InvalidEntry { address: String, reason: String },
}

#[derive(Serialize, Deserialize)]
struct PeriodFileEntry {
    address: String,
    /// Scaled integer as a decimal string
    balance: String,
    /// Hex-encoded leaf hash
    hash: String,
    index: u32,
}

/// Canonical file name for a period's record.
pub fn period_file_name(period: u64) -> String {
    format!("ongoing-distribution-period-{period}.json")
}

/// Save a period's entries atomically (tmp + rename).
pub fn save_period_file(
    dir: &Path,
    period: u64,
    entries: &[DistributionEntry],
) -> Result<PathBuf, StoreError> {
    let records: Vec<PeriodFileEntry> = entries
        .iter()
        .map(|e| PeriodFileEntry {
            address: e.address.to_string(),
            balance: e.balance.to_string(),
            hash: hex::encode(e.hash),
            index: e.index,
        })
        .collect();

    let json = serde_json::to_string_pretty(&records)?;

    std::fs::create_dir_all(dir).map_err(StoreError::WriteError)?;
    let path = dir.join(period_file_name(period));
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(StoreError::WriteError)?;
    std::fs::rename(&tmp_path, &path).map_err(StoreError::WriteError)?;

    info!("Saved {} entries for period {} to {}", entries.len(), period, path.display());
    Ok(path)
}

/// Load a period file back into distribution entries.
///
/// Entries with malformed balances or hashes fail the whole load — a
/// period file is a published artifact and must round-trip exactly.
pub fn load_period_file(path: &Path) -> Result<Vec<DistributionEntry>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(StoreError::ReadError)?;
    let records: Vec<PeriodFileEntry> = serde_json::from_str(&contents)?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let address =
            Address::new(record.address.clone()).map_err(|e| StoreError::InvalidEntry {
                address: record.address.clone(),
                reason: e.to_string(),
            })?;
        let balance: u128 = record.balance.parse().map_err(|_| StoreError::InvalidEntry {
            address: record.address.clone(),
            reason: format!("bad balance {:?}", record.balance),
        })?;
        let hash_bytes = hex::decode(&record.hash).map_err(|_| StoreError::InvalidEntry {
            address: record.address.clone(),
            reason: format!("bad hash {:?}", record.hash),
        })?;
        let hash: [u8; 32] = hash_bytes.try_into().map_err(|_| {
            warn!("Hash with wrong length for {}", record.address);
            StoreError::InvalidEntry {
                address: record.address.clone(),
                reason: "hash must be 32 bytes".to_string(),
            }
        })?;

        entries.push(DistributionEntry {
            address,
            balance,
            hash,
            index: record.index,
        });
    }

    info!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}
