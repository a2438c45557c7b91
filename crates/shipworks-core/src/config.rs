//! Engine configuration.
//!
//! Loaded from JSON. Every field has a default, so a partial (or empty)
//! config file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shipworks_logic::constants::{AUTO_LOADER_MOD, AUTO_LOAD_INTERVAL, LIFE_SUPPORT_SAMPLE_INTERVAL};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks between life support samples
    pub life_support_sample_interval: u64,
    /// Ticks between auto-loader passes
    pub auto_load_interval: u64,
    /// Names of the active mods
    pub active_mods: Vec<String>,
    /// Mod name the torpedo auto-loader compat looks for
    pub auto_loader_mod: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            life_support_sample_interval: LIFE_SUPPORT_SAMPLE_INTERVAL,
            auto_load_interval: AUTO_LOAD_INTERVAL,
            active_mods: Vec::new(),
            auto_loader_mod: AUTO_LOADER_MOD.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn is_mod_active(&self, name: &str) -> bool {
        self.active_mods.iter().any(|m| m == name)
    }
}
