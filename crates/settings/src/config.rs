//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Distribution settings
    #[serde(default)]
    pub distribution: DistributionSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            distribution: DistributionSettings::default(),
            config_path: None,
        }
    }
}

/// Where period files are written and which network the roots target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSettings {
    /// Directory for per-period distribution files
    pub data_dir: PathBuf,
    /// Network name tag for operator logs ("mainnet", "optimism", ...)
    pub network: String,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("distributions"),
            network: "localhost".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings = serde_json::from_str(&content)?;
            settings.config_path = Some(path.clone());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.clone());
            Ok(settings)
        }
    }

    /// Save settings to their path (atomic tmp + rename).
    pub fn save(&self) -> Result<()> {
        let path = self
            .config_path
            .clone()
            .unwrap_or_else(default_settings_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::WriteError)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(SettingsError::WriteError)?;
        std::fs::rename(&tmp_path, &path).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.distribution.network, "localhost");
        assert_eq!(s.distribution.data_dir, PathBuf::from("distributions"));
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let path = std::env::temp_dir().join("rewardnet-settings-missing.json");
        let _ = std::fs::remove_file(&path);
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.distribution.network, "localhost");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir().join("rewardnet-settings-test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("settings.json");

        let mut s = Settings::load_from(&path).unwrap();
        s.distribution.network = "optimism".to_string();
        s.save().unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.distribution.network, "optimism");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
