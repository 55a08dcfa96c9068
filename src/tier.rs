//! Storage tiers and the placement of a file on them.
//!
//! Tier assignment is owned by the external mover. This module only describes
//! where a file currently lives; callers obtain a [`Placement`] from the File
//! row they just read and never hold on to it across store calls.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::File;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub i64);

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a file lives: its tier and full path, split into directory and filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub tier_id: TierId,
    pub path: String,
    pub directory: String,
    pub filename: String,
}

impl Placement {
    /// Build a placement from a full path, deriving directory and filename.
    pub fn new(tier_id: TierId, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let as_path = Path::new(&path);
        let filename = as_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidArgument(format!("'{}' has no filename", path)))?
            .to_string();
        let directory = as_path
            .parent()
            .and_then(|dir| dir.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            tier_id,
            path,
            directory,
            filename,
        })
    }
}

impl File {
    pub fn placement(&self) -> Placement {
        Placement {
            tier_id: self.tier_id,
            path: self.path.clone(),
            directory: self.directory.clone(),
            filename: self.filename.clone(),
        }
    }
}

/// A configured storage tier (maps to a [[tiers]] entry in TOML)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TierConfig {
    /// Tier id as written by the mover into files.tier_id
    pub id: TierId,
    /// Human readable name (e.g. "hot", "archive")
    pub name: String,
    /// Root directory of the tier
    pub path: PathBuf,
}

/// Lookup of configured tiers.
#[derive(Debug, Clone, Default)]
pub struct Tiers {
    tiers: Vec<TierConfig>,
}

impl Tiers {
    pub fn new(tiers: Vec<TierConfig>) -> Self {
        Self { tiers }
    }

    pub fn get(&self, id: TierId) -> Option<&TierConfig> {
        self.tiers.iter().find(|tier| tier.id == id)
    }

    /// Tier the file currently claims to be on.
    pub fn tier_for(&self, file: &File) -> Option<&TierConfig> {
        self.get(file.tier_id)
    }

    /// True when the file's path lies under the root of its own tier.
    pub fn contains(&self, file: &File) -> bool {
        self.tier_for(file)
            .map(|tier| Path::new(&file.path).starts_with(&tier.path))
            .unwrap_or(false)
    }
}
