//! Building components: identity, map placement, power and switch state.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use shipworks_logic::defs::ItemStack;

/// Identifier of a ship map owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// Building component - the def this entity was spawned from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub def_name: String,
}

impl Building {
    pub fn new(def_name: impl Into<String>) -> Self {
        Self {
            def_name: def_name.into(),
        }
    }
}

/// Which map a spawned building sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnMap(pub MapId);

/// Connection to the power grid. The grid itself lives outside this crate;
/// only the resulting on/off signal is modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerTrader {
    pub power_on: bool,
}

/// Player-operated on/off switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flickable {
    pub switch_on: bool,
}

impl Default for Flickable {
    fn default() -> Self {
        Self { switch_on: true }
    }
}

/// Auto-loader hopper: holds items and feeds them into target buildings
#[derive(Debug, Clone, Default)]
pub struct Hopper {
    pub items: Vec<ItemStack>,
    pub targets: Vec<Entity>,
}

impl Hopper {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.count).sum()
    }

    /// Merge an item into an existing stack of the same def
    pub fn insert(&mut self, item: ItemStack) {
        if item.count == 0 {
            return;
        }
        match self.items.iter_mut().find(|i| i.def == item.def) {
            Some(stack) => stack.count += item.count,
            None => self.items.push(item),
        }
    }
}
