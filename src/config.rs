use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::tier::{TierConfig, Tiers};

/// A camera known to the registry
#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Identifier used in every record (letters, digits and underscores)
    pub identifier: String,
    /// Display name
    pub name: Option<String>,
}

/// Configuration file structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Path of the SQLite database
    pub database: PathBuf,
    /// Cameras served by the "all cameras" operations
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
    /// Seconds to extend a recording's start backwards when resolving fragments (default: 0)
    #[serde(default)]
    pub default_lookback: u64,
    /// Storage tiers (maps to [[tiers]] sections in TOML)
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
}

impl Config {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate().map_err(Error::Config)?;
        Ok(config)
    }

    /// Validate identifiers and tier ids.
    ///
    /// Camera identifiers must be non-empty `[A-Za-z0-9_]+` and unique; tier ids unique.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for camera in &self.cameras {
            let valid = !camera.identifier.is_empty()
                && camera
                    .identifier
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(format!(
                    "camera identifier '{}' must match [A-Za-z0-9_]+",
                    camera.identifier
                ));
            }
            if !seen.insert(camera.identifier.as_str()) {
                return Err(format!("camera '{}' is listed twice", camera.identifier));
            }
        }

        let mut tier_ids = HashSet::new();
        for tier in &self.tiers {
            if !tier_ids.insert(tier.id) {
                return Err(format!("tier id {} is listed twice", tier.id));
            }
        }

        Ok(())
    }

    pub fn camera(&self, identifier: &str) -> Option<&CameraConfig> {
        self.cameras.iter().find(|camera| camera.identifier == identifier)
    }

    pub fn camera_identifiers(&self) -> Vec<String> {
        self.cameras
            .iter()
            .map(|camera| camera.identifier.clone())
            .collect()
    }

    pub fn tiers(&self) -> Tiers {
        Tiers::new(self.tiers.clone())
    }
}
