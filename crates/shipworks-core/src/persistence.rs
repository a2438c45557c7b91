//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for compact binary saves and serde_json for readable ones.
//! Each comp persists only its own fields; on load every comp is rebuilt
//! from its building def first and the saved fields are laid over it, so a
//! save missing a comp still gets the def's default for it.

use std::collections::HashMap;
use std::io::{Read, Write};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use shipworks_logic::defs::{BuildingDef, Defs, ItemStack};
use shipworks_logic::life_support::LifeSupportSave;
use shipworks_logic::magazine::MagazineSave;
use thiserror::Error;

use crate::components::*;
use crate::engine::insert_def_components;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Encoding of a save file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Binary,
    Json,
}

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Game tick at save time
    pub tick: u64,
    pub maps: Vec<MapId>,
    pub next_map_id: u32,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// Hopper with its targets stored as indices into [`SaveData::entities`]
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct SerializableHopper {
    #[serde(default)]
    pub items: Vec<ItemStack>,
    #[serde(default)]
    pub targets: Vec<usize>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct SerializableEntity {
    #[serde(default)]
    pub building: Option<Building>,
    #[serde(default)]
    pub on_map: Option<OnMap>,
    #[serde(default)]
    pub power: Option<PowerTrader>,
    #[serde(default)]
    pub flickable: Option<Flickable>,
    #[serde(default)]
    pub life_support: Option<LifeSupportSave>,
    #[serde(default)]
    pub magazine: Option<MagazineSave>,
    #[serde(default)]
    pub hopper: Option<SerializableHopper>,
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let index: HashMap<Entity, usize> = world
        .iter()
        .enumerate()
        .map(|(i, e)| (e.entity(), i))
        .collect();

    let mut entities = Vec::with_capacity(index.len());
    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();

        if let Some(c) = entity_ref.get::<&Building>() {
            se.building = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&OnMap>() {
            se.on_map = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PowerTrader>() {
            se.power = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Flickable>() {
            se.flickable = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&LifeSupport>() {
            se.life_support = Some(c.to_save());
        }
        if let Some(c) = entity_ref.get::<&ShellMagazine>() {
            se.magazine = Some(c.to_save());
        }
        if let Some(c) = entity_ref.get::<&Hopper>() {
            se.hopper = Some(SerializableHopper {
                items: c.items.clone(),
                targets: c.targets.iter().filter_map(|t| index.get(t).copied()).collect(),
            });
        }

        entities.push(se);
    }

    entities
}

/// Rebuild a world from serialized entities
fn deserialize_entities(
    world: &mut World,
    entities: Vec<SerializableEntity>,
    defs: &Defs,
) -> Result<(), SaveError> {
    let mut spawned = Vec::with_capacity(entities.len());
    let mut hoppers = Vec::new();

    for se in entities {
        let entity = world.spawn(());
        spawned.push(entity);

        let def = match &se.building {
            Some(building) => Some(
                defs.building(&building.def_name)
                    .ok_or_else(|| SaveError::UnknownBuildingDef(building.def_name.clone()))?,
            ),
            None => None,
        };

        if let Some(def) = def {
            insert_def_components(world, entity, def);
        }
        if let Some(c) = se.building {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.on_map {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.power {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.flickable {
            let _ = world.insert_one(entity, c);
        }
        if let Some(c) = se.life_support {
            let _ = world.insert_one(entity, LifeSupport::from_save(c));
        }
        if let Some(c) = se.magazine {
            let magazine = match def {
                Some(def) => ShellMagazine::from_save(def.magazine.unwrap_or_default(), def, c),
                None => ShellMagazine::from_save(Default::default(), &BuildingDef::default(), c),
            };
            let _ = world.insert_one(entity, magazine);
        }
        if let Some(c) = se.hopper {
            hoppers.push((entity, c));
        }
    }

    // Targets can point at entities spawned after the hopper
    for (entity, hopper) in hoppers {
        let targets = hopper
            .targets
            .iter()
            .filter_map(|i| spawned.get(*i).copied())
            .collect();
        let _ = world.insert_one(
            entity,
            Hopper {
                items: hopper.items,
                targets,
            },
        );
    }
    Ok(())
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(
    writer: W,
    format: SaveFormat,
    world: &World,
    tick: u64,
    maps: &[MapId],
    next_map_id: u32,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        maps: maps.to_vec(),
        next_map_id,
        entities: serialize_entities(world),
    };

    match format {
        SaveFormat::Binary => bincode::serialize_into(writer, &save_data)?,
        SaveFormat::Json => serde_json::to_writer(writer, &save_data)?,
    }
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(
    reader: R,
    format: SaveFormat,
    defs: &Defs,
) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = match format {
        SaveFormat::Binary => bincode::deserialize_from(reader)?,
        SaveFormat::Json => serde_json::from_reader(reader)?,
    };

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    deserialize_entities(&mut world, save_data.entities, defs)?;

    Ok(LoadedSimulation {
        world,
        tick: save_data.tick,
        map_ids: save_data.maps,
        next_map_id: save_data.next_map_id,
    })
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub tick: u64,
    pub map_ids: Vec<MapId>,
    pub next_map_id: u32,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Save references unknown building def `{0}`")]
    UnknownBuildingDef(String),
    #[error("Save references unknown map {0}")]
    UnknownMap(MapId),
    #[error("Failed to re-attach comps: {0}")]
    Attach(String),
}
