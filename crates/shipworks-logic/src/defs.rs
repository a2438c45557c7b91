//! Definition database: shell, projectile and building defs.
//!
//! Defs are static data loaded once at startup (usually from JSON) and
//! referenced by id from components. Components never own a def, they store
//! the id and look it up through [`Defs`] when they need the payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::StorageSettings;

/// Reference to a shell (loadable item) definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellId(pub String);

impl ShellId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the projectile a shell turns into when fired.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectileId(pub String);

impl ProjectileId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A loadable shell type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellDef {
    pub id: ShellId,
    #[serde(default)]
    pub label: String,
    pub projectile_when_loaded: ProjectileId,
}

/// Magazine properties attached to a building def.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagazineProps {
    pub max_torpedoes: usize,
}

impl Default for MagazineProps {
    fn default() -> Self {
        Self {
            max_torpedoes: crate::constants::DEFAULT_MAX_TORPEDOES,
        }
    }
}

/// A building type and the comps it carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    /// Present on torpedo launchers.
    #[serde(default)]
    pub magazine: Option<MagazineProps>,
    /// Whether the building tracks life support power state.
    #[serde(default)]
    pub life_support: bool,
    /// Settings copied into a new magazine's storage settings.
    #[serde(default)]
    pub default_storage_settings: Option<StorageSettings>,
    /// Upper bound on what the user is allowed to enable.
    #[serde(default)]
    pub fixed_storage_settings: Option<StorageSettings>,
    /// Auto-loader hopper that feeds neighbouring buildings.
    #[serde(default)]
    pub hopper: bool,
}

/// A physical item on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub def: ShellId,
    pub count: u32,
}

impl ItemStack {
    pub fn new(def: ShellId, count: u32) -> Self {
        Self { def, count }
    }

    /// A stack holding exactly one unit.
    pub fn single(def: ShellId) -> Self {
        Self { def, count: 1 }
    }
}

#[derive(Debug, Error)]
pub enum DefsError {
    #[error("Failed to parse defs: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Shell def `{0}` is declared twice")]
    DuplicateShell(ShellId),
    #[error("Building def `{0}` is declared twice")]
    DuplicateBuilding(String),
}

/// On-disk layout of a defs file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DefsFile {
    #[serde(default)]
    pub shells: Vec<ShellDef>,
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
}

/// All loaded definitions.
#[derive(Debug, Clone, Default)]
pub struct Defs {
    shells: BTreeMap<ShellId, ShellDef>,
    buildings: BTreeMap<String, BuildingDef>,
}

impl Defs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, DefsError> {
        let file: DefsFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub fn from_file(file: DefsFile) -> Result<Self, DefsError> {
        let mut defs = Self::new();
        for shell in file.shells {
            defs.add_shell(shell)?;
        }
        for building in file.buildings {
            defs.add_building(building)?;
        }
        Ok(defs)
    }

    pub fn add_shell(&mut self, shell: ShellDef) -> Result<(), DefsError> {
        if self.shells.contains_key(&shell.id) {
            return Err(DefsError::DuplicateShell(shell.id));
        }
        self.shells.insert(shell.id.clone(), shell);
        Ok(())
    }

    pub fn add_building(&mut self, building: BuildingDef) -> Result<(), DefsError> {
        if self.buildings.contains_key(&building.name) {
            return Err(DefsError::DuplicateBuilding(building.name));
        }
        self.buildings.insert(building.name.clone(), building);
        Ok(())
    }

    pub fn shell(&self, id: &ShellId) -> Option<&ShellDef> {
        self.shells.get(id)
    }

    pub fn building(&self, name: &str) -> Option<&BuildingDef> {
        self.buildings.get(name)
    }

    pub fn shells(&self) -> impl Iterator<Item = &ShellDef> {
        self.shells.values()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingDef> {
        self.buildings.values()
    }
}
