//! RewardNet settings
//!
//! Operator configuration persisted as JSON: where period files live
//! and which network's distribution contract the outputs target.

mod config;

use std::path::PathBuf;

use thiserror::Error;

pub use config::{DistributionSettings, Settings};

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Default settings file location: `~/.rewardnet/settings.json`, or the
/// current directory when HOME is unset.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rewardnet")
        .join("settings.json")
}
