//! Storage settings and shell filters.
//!
//! A building that accepts items carries a [`StorageSettings`] owned by the
//! player, optionally bounded by the fixed settings of its def (the parent
//! settings). Auto-loaders consult the filter before handing over an item.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::defs::{ItemStack, ShellId};

/// Set of shell types a storage slot allows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellFilter {
    #[serde(default)]
    allowed: BTreeSet<ShellId>,
}

impl ShellFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowing<I>(shells: I) -> Self
    where
        I: IntoIterator<Item = ShellId>,
    {
        Self {
            allowed: shells.into_iter().collect(),
        }
    }

    pub fn allows(&self, shell: &ShellId) -> bool {
        self.allowed.contains(shell)
    }

    pub fn allows_item(&self, item: &ItemStack) -> bool {
        self.allows(&item.def)
    }

    pub fn set_allowed(&mut self, shell: ShellId, allowed: bool) {
        if allowed {
            self.allowed.insert(shell);
        } else {
            self.allowed.remove(&shell);
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = &ShellId> {
        self.allowed.iter()
    }

    pub fn allowed_count(&self) -> usize {
        self.allowed.len()
    }

}

/// Player-facing storage configuration of a building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub filter: ShellFilter,
}

impl StorageSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: ShellFilter) -> Self {
        Self { filter }
    }

    pub fn copy_from(&mut self, other: &StorageSettings) {
        self.filter = other.filter.clone();
    }

    /// Toggle a shell type, refusing to enable anything the parent settings
    /// exclude. Returns whether the filter now holds the requested state.
    pub fn try_set_allowed(
        &mut self,
        shell: ShellId,
        allowed: bool,
        parent: Option<&StorageSettings>,
    ) -> bool {
        if allowed {
            if let Some(parent) = parent {
                if !parent.filter.allows(&shell) {
                    return false;
                }
            }
        }
        self.filter.set_allowed(shell, allowed);
        true
    }
}
