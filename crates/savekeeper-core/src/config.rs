//! Save subsystem configuration.
//!
//! Platform quirks are resolved once into plain flags here, so the write path
//! never branches on the target platform itself.
//!
//! # File Format
//!
//! ```json
//! {
//!   "dataDir": "/home/me/.local/share/savekeeper",
//!   "cipheringEnabled": false,
//!   "requiresDurabilitySync": false,
//!   "requiresInteractionGate": false,
//!   "settleIntervalMs": 50
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::default_data_dir;

/// Settle time between a durability sync and the verifying readback.
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 50;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveConfig {
    /// Persistent directory holding one `<name>_save.dat` file per profile.
    pub data_dir: PathBuf,

    /// Pass stored text through the cipher. Files written with one value
    /// cannot be read with the other.
    pub ciphering_enabled: bool,

    /// Writes need an explicit sync plus readback verification.
    pub requires_durability_sync: bool,

    /// Writes must wait until the first user interaction has been observed.
    pub requires_interaction_gate: bool,

    pub settle_interval_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ciphering_enabled: false,
            requires_durability_sync: cfg!(target_arch = "wasm32"),
            requires_interaction_gate: cfg!(target_arch = "wasm32"),
            settle_interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
        }
    }
}

impl SaveConfig {
    /// Configuration rooted at `data_dir` with every other field defaulted.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    /// Load configuration from a JSON file.
    ///
    /// Missing file is not an error (returns defaults).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save configuration as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_nonexistent_returns_default() {
        let dir = tempdir().unwrap();
        let config = SaveConfig::load(&dir.path().join("config.json")).unwrap();

        assert!(!config.ciphering_enabled);
        assert_eq!(config.settle_interval(), Duration::from_millis(50));
    }

    #[test]
    fn save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = SaveConfig {
            data_dir: dir.path().join("saves"),
            ciphering_enabled: true,
            requires_durability_sync: true,
            requires_interaction_gate: false,
            settle_interval_ms: 5,
        };

        config.save(&path).unwrap();
        let loaded = SaveConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "dataDir": "/srv/saves", "cipheringEnabled": true }"#).unwrap();

        let loaded = SaveConfig::load(&path).unwrap();

        assert_eq!(loaded.data_dir, PathBuf::from("/srv/saves"));
        assert!(loaded.ciphering_enabled);
        assert_eq!(loaded.settle_interval_ms, DEFAULT_SETTLE_INTERVAL_MS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            SaveConfig::load(&path),
            Err(ConfigError::Json(_))
        ));
    }
}
