//! Simulation engine - drives the comp lifecycle for every building

use std::collections::BTreeMap;
use std::path::Path;

use hecs::{ComponentError, Entity, World};
use shipworks_logic::defs::{BuildingDef, Defs, ItemStack, ProjectileId, ShellId};
use shipworks_logic::life_support::is_sample_tick;
use shipworks_logic::magazine::MagazineError;
use thiserror::Error;

use crate::components::*;
use crate::config::EngineConfig;
use crate::maps::ShipMap;
use crate::persistence::{LoadedSimulation, SaveError, SaveFormat};
use crate::refuel::{register_torpedo_compat, CompatOutcome, PluginRegistry};
use crate::systems::*;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Entity does not exist")]
    NoSuchEntity,
    #[error("Entity has no {0} component")]
    MissingComponent(&'static str),
    #[error("Unknown map {0}")]
    UnknownMap(MapId),
    #[error("Unknown building def `{0}`")]
    UnknownBuildingDef(String),
    #[error(transparent)]
    Magazine(#[from] MagazineError),
}

/// Map a hecs lookup failure for component `name` to an [`EngineError`]
pub(crate) fn component_error(name: &'static str) -> impl Fn(ComponentError) -> EngineError {
    move |e| match e {
        ComponentError::NoSuchEntity => EngineError::NoSuchEntity,
        ComponentError::MissingComponent(_) => EngineError::MissingComponent(name),
    }
}

/// Insert the comps a building def declares, in their freshly built state
pub(crate) fn insert_def_components(world: &mut World, entity: Entity, def: &BuildingDef) {
    if let Some(props) = def.magazine {
        let _ = world.insert_one(entity, ShellMagazine::new(props, def));
    }
    if def.life_support {
        let _ = world.insert(
            entity,
            (LifeSupport::new(), PowerTrader::default(), Flickable::default()),
        );
    }
    if def.hopper {
        let _ = world.insert_one(entity, Hopper::default());
    }
}

/// Attach comps of a freshly spawned (or reloaded) building
fn attach_components(
    world: &mut World,
    maps: &mut BTreeMap<MapId, ShipMap>,
    entity: Entity,
    respawning_after_load: bool,
) -> Result<(), EngineError> {
    if world.get::<&LifeSupport>(entity).is_err() {
        return Ok(());
    }
    let map_id = world
        .get::<&OnMap>(entity)
        .map_err(component_error("OnMap"))?
        .0;
    let map = maps.get_mut(&map_id).ok_or(EngineError::UnknownMap(map_id))?;
    attach_life_support(world, map, entity, respawning_after_load)
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all buildings
    pub world: World,
    /// Ticks elapsed since the game started
    tick: u64,
    maps: BTreeMap<MapId, ShipMap>,
    next_map_id: u32,
    defs: Defs,
    config: EngineConfig,
    plugins: PluginRegistry,
    compat: CompatOutcome,
}

impl SimulationEngine {
    /// Create an engine with no auto-loader providers
    pub fn new(defs: Defs, config: EngineConfig) -> Self {
        Self::with_plugins(defs, config, PluginRegistry::new())
    }

    /// Create an engine and run the one-time auto-loader negotiation
    pub fn with_plugins(defs: Defs, config: EngineConfig, mut plugins: PluginRegistry) -> Self {
        let compat = register_torpedo_compat(&mut plugins, &config);
        log::info!(
            "Engine started: {} shell defs, {} building defs, torpedo compat {:?}",
            defs.shells().count(),
            defs.buildings().count(),
            compat
        );
        Self {
            world: World::new(),
            tick: 0,
            maps: BTreeMap::new(),
            next_map_id: 0,
            defs,
            config,
            plugins,
            compat,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn defs(&self) -> &Defs {
        &self.defs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compat_outcome(&self) -> CompatOutcome {
        self.compat
    }

    pub fn add_map(&mut self) -> MapId {
        let id = MapId(self.next_map_id);
        self.next_map_id += 1;
        self.maps.insert(id, ShipMap::new(id));
        log::info!("Created {}", id);
        id
    }

    pub fn map(&self, id: MapId) -> Option<&ShipMap> {
        self.maps.get(&id)
    }

    pub fn maps(&self) -> impl Iterator<Item = &ShipMap> {
        self.maps.values()
    }

    /// Spawn a building from its def and attach its comps
    pub fn spawn_building(&mut self, map: MapId, def_name: &str) -> Result<Entity, EngineError> {
        if !self.maps.contains_key(&map) {
            return Err(EngineError::UnknownMap(map));
        }
        let def = self
            .defs
            .building(def_name)
            .ok_or_else(|| EngineError::UnknownBuildingDef(def_name.to_string()))?;

        let entity = self.world.spawn((Building::new(def_name), OnMap(map)));
        insert_def_components(&mut self.world, entity, def);

        attach_components(&mut self.world, &mut self.maps, entity, false)?;
        log::debug!("Spawned {} as {:?} on {}", def_name, entity, map);
        Ok(entity)
    }

    /// Detach every comp and remove the building
    pub fn despawn_building(&mut self, entity: Entity) -> Result<(), EngineError> {
        if !self.world.contains(entity) {
            return Err(EngineError::NoSuchEntity);
        }
        if self.world.get::<&LifeSupport>(entity).is_ok() {
            detach_life_support(&mut self.world, &mut self.maps, entity)?;
        }
        self.world
            .despawn(entity)
            .map_err(|_| EngineError::NoSuchEntity)?;
        log::debug!("Despawned {:?}", entity);
        Ok(())
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) {
        self.tick += 1;
        life_support_system(
            &mut self.world,
            self.tick,
            self.config.life_support_sample_interval,
        );
        if is_sample_tick(self.tick, self.config.auto_load_interval) {
            let delivered = self.plugins.service_all(&mut self.world);
            if delivered > 0 {
                log::debug!("Auto-loaders delivered {} items", delivered);
            }
        }
    }

    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    pub fn set_power(&mut self, entity: Entity, power_on: bool) -> Result<(), EngineError> {
        self.world
            .get::<&mut PowerTrader>(entity)
            .map_err(component_error("PowerTrader"))?
            .power_on = power_on;
        Ok(())
    }

    pub fn set_switch(&mut self, entity: Entity, switch_on: bool) -> Result<(), EngineError> {
        self.world
            .get::<&mut Flickable>(entity)
            .map_err(component_error("Flickable"))?
            .switch_on = switch_on;
        Ok(())
    }

    pub fn magazine(&self, entity: Entity) -> Option<hecs::Ref<'_, ShellMagazine>> {
        self.world.get::<&ShellMagazine>(entity).ok()
    }

    pub fn magazine_mut(&self, entity: Entity) -> Option<hecs::RefMut<'_, ShellMagazine>> {
        self.world.get::<&mut ShellMagazine>(entity).ok()
    }

    /// Last sampled life support state, if the entity tracks one
    pub fn life_support_active(&self, entity: Entity) -> Option<bool> {
        self.world.get::<&LifeSupport>(entity).ok().map(|ls| ls.active)
    }

    pub fn fire(&mut self, entity: Entity) -> Result<ProjectileId, EngineError> {
        fire_launcher(&mut self.world, &self.defs, entity)
    }

    pub fn unload(&mut self, entity: Entity) -> Result<Vec<ItemStack>, EngineError> {
        unload_launcher(&mut self.world, entity)
    }

    pub fn load_shell(&mut self, entity: Entity, shell: ShellId) -> Result<(), EngineError> {
        load_launcher(&mut self.world, entity, shell)
    }

    /// Change the auto-load filter of a launcher; false if the def's fixed settings forbid it
    pub fn set_shell_allowed(
        &mut self,
        entity: Entity,
        shell: ShellId,
        allowed: bool,
    ) -> Result<bool, EngineError> {
        let mut magazine = self
            .world
            .get::<&mut ShellMagazine>(entity)
            .map_err(component_error("ShellMagazine"))?;
        let changed = magazine.set_shell_allowed(shell, allowed);
        if changed {
            magazine.notify_settings_changed();
            log::trace!(
                "{:?} filter now allows {} shell types",
                entity,
                magazine.store_settings().filter.allowed_count()
            );
        }
        Ok(changed)
    }

    /// Put items into a hopper and point it at the given targets
    pub fn fill_hopper(
        &mut self,
        hopper: Entity,
        items: Vec<ItemStack>,
        targets: &[Entity],
    ) -> Result<(), EngineError> {
        let mut component = self
            .world
            .get::<&mut Hopper>(hopper)
            .map_err(component_error("Hopper"))?;
        for item in items {
            component.insert(item);
        }
        for target in targets {
            if !component.targets.contains(target) {
                component.targets.push(*target);
            }
        }
        Ok(())
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W, format: SaveFormat) -> Result<(), SaveError> {
        let map_ids: Vec<MapId> = self.maps.keys().copied().collect();
        crate::persistence::save_simulation(
            writer,
            format,
            &self.world,
            self.tick,
            &map_ids,
            self.next_map_id,
        )?;
        log::info!("Saved tick {} ({} maps)", self.tick, map_ids.len());
        Ok(())
    }

    /// Load simulation state from a reader, replacing the current world.
    ///
    /// On error the engine keeps its previous state.
    pub fn load<R: std::io::Read>(&mut self, reader: R, format: SaveFormat) -> Result<(), SaveError> {
        let LoadedSimulation {
            mut world,
            tick,
            map_ids,
            next_map_id,
        } = crate::persistence::load_simulation(reader, format, &self.defs)?;

        let mut maps: BTreeMap<MapId, ShipMap> = map_ids
            .into_iter()
            .map(|id| (id, ShipMap::new(id)))
            .collect();

        // Aggregators are not saved; attaching again rebuilds them
        let buildings: Vec<Entity> = world
            .query::<&Building>()
            .iter()
            .map(|(e, _)| e)
            .collect();
        for entity in buildings {
            attach_components(&mut world, &mut maps, entity, true).map_err(|e| match e {
                EngineError::UnknownMap(id) => SaveError::UnknownMap(id),
                other => SaveError::Attach(other.to_string()),
            })?;
        }

        self.world = world;
        self.tick = tick;
        self.next_map_id = next_map_id;
        self.maps = maps;

        log::info!("Loaded tick {} ({} maps)", self.tick, self.maps.len());
        Ok(())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>, format: SaveFormat) -> Result<(), SaveError> {
        let file = std::fs::File::create(path)?;
        self.save(std::io::BufWriter::new(file), format)
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>, format: SaveFormat) -> Result<(), SaveError> {
        let file = std::fs::File::open(path)?;
        self.load(std::io::BufReader::new(file), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipworks_logic::defs::{BuildingDef, MagazineProps, ShellDef};

    fn defs() -> Defs {
        let mut defs = Defs::new();
        defs.add_shell(ShellDef {
            id: ShellId::new("TorpedoHE"),
            label: "HE torpedo".into(),
            projectile_when_loaded: ProjectileId::new("ProjTorpedoHE"),
        })
        .unwrap();
        defs.add_building(BuildingDef {
            name: "TorpedoTube".into(),
            magazine: Some(MagazineProps { max_torpedoes: 2 }),
            ..Default::default()
        })
        .unwrap();
        defs.add_building(BuildingDef {
            name: "LifeSupport".into(),
            life_support: true,
            ..Default::default()
        })
        .unwrap();
        defs
    }

    #[test]
    fn test_engine_creation() {
        let engine = SimulationEngine::new(defs(), EngineConfig::default());
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.compat_outcome(), CompatOutcome::ModInactive);
        assert_eq!(engine.maps().count(), 0);
    }

    #[test]
    fn test_spawn_unknown_def_or_map() {
        let mut engine = SimulationEngine::new(defs(), EngineConfig::default());
        assert!(matches!(
            engine.spawn_building(MapId(9), "TorpedoTube"),
            Err(EngineError::UnknownMap(MapId(9)))
        ));
        let map = engine.add_map();
        assert!(matches!(
            engine.spawn_building(map, "Nope"),
            Err(EngineError::UnknownBuildingDef(_))
        ));
    }

    #[test]
    fn test_life_support_lifecycle() {
        let mut engine = SimulationEngine::new(defs(), EngineConfig::default());
        let map = engine.add_map();
        let ls = engine.spawn_building(map, "LifeSupport").unwrap();

        // Grid starts disconnected
        assert_eq!(engine.life_support_active(ls), Some(false));
        assert_eq!(engine.map(map).unwrap().heat.life_supports(), &[ls]);

        engine.set_power(ls, true).unwrap();
        engine.run_ticks(359);
        assert_eq!(engine.life_support_active(ls), Some(false));
        engine.tick();
        assert_eq!(engine.life_support_active(ls), Some(true));

        engine.despawn_building(ls).unwrap();
        assert_eq!(engine.map(map).unwrap().heat.life_support_count(), 0);
        assert!(matches!(engine.despawn_building(ls), Err(EngineError::NoSuchEntity)));
    }

    #[test]
    fn test_fire_and_unload() {
        let mut engine = SimulationEngine::new(defs(), EngineConfig::default());
        let map = engine.add_map();
        let tube = engine.spawn_building(map, "TorpedoTube").unwrap();

        engine.load_shell(tube, ShellId::new("TorpedoHE")).unwrap();
        engine.load_shell(tube, ShellId::new("TorpedoHE")).unwrap();
        assert!(engine.magazine(tube).unwrap().is_full());

        assert_eq!(engine.fire(tube).unwrap(), ProjectileId::new("ProjTorpedoHE"));
        assert_eq!(engine.unload(tube).unwrap().len(), 1);
        assert!(matches!(
            engine.fire(tube),
            Err(EngineError::Magazine(MagazineError::Empty))
        ));
    }

    #[test]
    fn test_set_shell_allowed_keeps_loaded_shells() {
        let mut engine = SimulationEngine::new(defs(), EngineConfig::default());
        let map = engine.add_map();
        let tube = engine.spawn_building(map, "TorpedoTube").unwrap();
        engine.load_shell(tube, ShellId::new("TorpedoHE")).unwrap();

        assert!(engine.set_shell_allowed(tube, ShellId::new("TorpedoHE"), false).unwrap());
        assert_eq!(engine.magazine(tube).unwrap().len(), 1);

        let ls = engine.spawn_building(map, "LifeSupport").unwrap();
        assert!(matches!(
            engine.set_shell_allowed(ls, ShellId::new("TorpedoHE"), true),
            Err(EngineError::MissingComponent("ShellMagazine"))
        ));
    }
}
