//! Multi-shell torpedo magazine.
//!
//! A launcher holds an ordered list of loaded shells. The front of the list
//! is the next to fire unless the player has marked some shell types as
//! prevented, in which case the first loaded shell that is not prevented
//! fires instead. When every loaded shell is prevented (or nothing is
//! prevented) the remembered manual selection is used.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defs::{BuildingDef, Defs, ItemStack, MagazineProps, ProjectileId, ShellId};
use crate::filter::StorageSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MagazineError {
    #[error("Magazine is empty")]
    Empty,
    #[error("Selected index {index} is outside the magazine (len {len})")]
    NoSelection { index: usize, len: usize },
    #[error("Shell def `{0}` is not loaded in the def database")]
    UnknownShell(ShellId),
}

/// Persisted part of a magazine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagazineSave {
    #[serde(default)]
    pub prevented: Vec<ShellId>,
    #[serde(default)]
    pub loaded: Vec<ShellId>,
    /// Absent in saves that never touched the filter; the def's defaults stay
    #[serde(default)]
    pub settings: Option<StorageSettings>,
}

/// Torpedo launcher storage and fire selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellMagazine {
    props: MagazineProps,
    settings: StorageSettings,
    parent_settings: Option<StorageSettings>,
    prevented: Vec<ShellId>,
    loaded: Vec<ShellId>,
    /// Manual selection, used when no prevented-list override applies.
    selected: usize,
}

impl ShellMagazine {
    /// Build a fresh magazine for a building, copying its default storage
    /// settings.
    pub fn new(props: MagazineProps, def: &BuildingDef) -> Self {
        let mut settings = StorageSettings::new();
        if let Some(defaults) = &def.default_storage_settings {
            settings.copy_from(defaults);
        }
        Self {
            props,
            settings,
            parent_settings: def.fixed_storage_settings.clone(),
            prevented: Vec::new(),
            loaded: Vec::new(),
            selected: 0,
        }
    }

    /// Magazine with no def attached and capacity `max_torpedoes`.
    pub fn with_capacity(max_torpedoes: usize) -> Self {
        Self::new(MagazineProps { max_torpedoes }, &BuildingDef::default())
    }

    /// Rebuild a magazine from its def and overlay the saved fields.
    pub fn from_save(props: MagazineProps, def: &BuildingDef, save: MagazineSave) -> Self {
        let mut magazine = Self::new(props, def);
        magazine.prevented = save.prevented;
        magazine.loaded = save.loaded;
        if let Some(settings) = save.settings {
            magazine.settings = settings;
        }
        magazine
    }

    pub fn to_save(&self) -> MagazineSave {
        MagazineSave {
            prevented: self.prevented.clone(),
            loaded: self.loaded.clone(),
            settings: Some(self.settings.clone()),
        }
    }

    pub fn loaded(&self) -> &[ShellId] {
        &self.loaded
    }

    pub fn prevented(&self) -> &[ShellId] {
        &self.prevented
    }

    pub fn capacity(&self) -> usize {
        self.props.max_torpedoes
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn is_prevented(&self, shell: &ShellId) -> bool {
        self.prevented.contains(shell)
    }

    /// Index of the shell that fires next, if any.
    pub fn selected_index(&self) -> Option<usize> {
        if !self.prevented.is_empty() {
            if let Some(i) = self.loaded.iter().position(|s| !self.is_prevented(s)) {
                return Some(i);
            }
        }
        (self.selected < self.loaded.len()).then_some(self.selected)
    }

    pub fn current_shell(&self) -> Option<&ShellId> {
        self.selected_index().map(|i| &self.loaded[i])
    }

    /// Projectile the next shot launches.
    pub fn current_projectile(&self, defs: &Defs) -> Result<ProjectileId, MagazineError> {
        let index = self.checked_selection()?;
        let shell = &self.loaded[index];
        defs.shell(shell)
            .map(|d| d.projectile_when_loaded.clone())
            .ok_or_else(|| MagazineError::UnknownShell(shell.clone()))
    }

    /// At least one loaded shell is not prevented.
    pub fn has_usable(&self) -> bool {
        self.loaded.iter().any(|s| !self.is_prevented(s))
    }

    pub fn has_any(&self) -> bool {
        !self.loaded.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.loaded.len() >= self.props.max_torpedoes
    }

    /// Consume the selected shell after a launch.
    pub fn notify_fired(&mut self) -> Result<ShellId, MagazineError> {
        let index = self.checked_selection()?;
        let shell = self.loaded.remove(index);
        if self.selected >= self.loaded.len() {
            self.selected = 0;
        }
        Ok(shell)
    }

    /// Load one shell. `_count` is ignored; every call loads a single unit.
    pub fn load_shell(&mut self, shell: ShellId, _count: u32) {
        self.loaded.push(shell);
    }

    /// Unload everything as single-unit item stacks.
    pub fn remove_all(&mut self) -> Vec<ItemStack> {
        let output: Vec<ItemStack> = self.loaded.iter().cloned().map(ItemStack::single).collect();
        for item in &output {
            if let Some(pos) = self.loaded.iter().position(|s| *s == item.def) {
                self.loaded.remove(pos);
            }
        }
        self.selected = 0;
        output
    }

    /// Mark a shell type as "do not auto-fire". Returns false if it already was.
    pub fn prevent(&mut self, shell: ShellId) -> bool {
        if self.is_prevented(&shell) {
            return false;
        }
        self.prevented.push(shell);
        true
    }

    /// Clear the prevented mark. Returns false if the shell was not prevented.
    pub fn allow(&mut self, shell: &ShellId) -> bool {
        match self.prevented.iter().position(|s| s == shell) {
            Some(pos) => {
                self.prevented.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn manual_selection(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) -> Result<(), MagazineError> {
        if index >= self.loaded.len() {
            return Err(MagazineError::NoSelection {
                index,
                len: self.loaded.len(),
            });
        }
        self.selected = index;
        Ok(())
    }

    /// Filter check used by auto-loaders.
    pub fn accepts(&self, item: &ItemStack) -> bool {
        self.settings.filter.allows_item(item)
    }

    pub fn store_settings(&self) -> &StorageSettings {
        &self.settings
    }

    pub fn store_settings_mut(&mut self) -> &mut StorageSettings {
        &mut self.settings
    }

    pub fn parent_store_settings(&self) -> Option<&StorageSettings> {
        self.parent_settings.as_ref()
    }

    /// Enable or disable auto-loading of a shell type within the parent bounds.
    pub fn set_shell_allowed(&mut self, shell: ShellId, allowed: bool) -> bool {
        let parent = self.parent_settings.as_ref();
        self.settings.try_set_allowed(shell, allowed, parent)
    }

    /// Hook for filter edits. Loaded shells are never ejected by a filter change.
    pub fn notify_settings_changed(&mut self) {}

    fn checked_selection(&self) -> Result<usize, MagazineError> {
        if self.loaded.is_empty() {
            return Err(MagazineError::Empty);
        }
        self.selected_index().ok_or(MagazineError::NoSelection {
            index: self.selected,
            len: self.loaded.len(),
        })
    }
}
