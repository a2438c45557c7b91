//! Life support system - attach/detach against the map aggregator and
//! periodic power sampling

use std::collections::BTreeMap;

use hecs::{Entity, World};
use shipworks_logic::life_support::{is_sample_tick, sample_active};

use crate::components::{AttachState, Detach, Flickable, LifeSupport, MapId, PowerTrader};
use crate::engine::{component_error, EngineError};
use crate::maps::ShipMap;

/// Current power and switch signals of a building
fn read_signals(world: &World, entity: Entity) -> Result<(bool, bool), EngineError> {
    let power_on = world
        .get::<&PowerTrader>(entity)
        .map_err(component_error("PowerTrader"))?
        .power_on;
    let switch_on = world
        .get::<&Flickable>(entity)
        .map_err(component_error("Flickable"))?
        .switch_on;
    Ok((power_on, switch_on))
}

/// Register a life support comp with its map and take the first sample
pub fn attach_life_support(
    world: &mut World,
    map: &mut ShipMap,
    entity: Entity,
    respawning_after_load: bool,
) -> Result<(), EngineError> {
    let (power_on, switch_on) = read_signals(world, entity)?;
    let mut life_support = world
        .get::<&mut LifeSupport>(entity)
        .map_err(component_error("LifeSupport"))?;

    if let AttachState::Attached { map: current } = life_support.state {
        log::warn!(
            "Life support {:?} is already attached to {}, ignoring attach to {}",
            entity,
            current,
            map.id
        );
        return Ok(());
    }

    map.heat.add_life_support(entity);
    life_support.state = AttachState::Attached { map: map.id };
    life_support.active = sample_active(power_on, switch_on);

    log::debug!(
        "Life support {:?} attached to {} (active={}, after_load={})",
        entity,
        map.id,
        life_support.active,
        respawning_after_load
    );
    Ok(())
}

/// Resample every attached life support on sampling ticks.
///
/// Returns how many trackers changed state.
pub fn life_support_system(world: &mut World, tick: u64, interval: u64) -> usize {
    if !is_sample_tick(tick, interval) {
        return 0;
    }

    let mut changed = 0;
    for (entity, (life_support, power, switch)) in
        world.query_mut::<(&mut LifeSupport, &PowerTrader, &Flickable)>()
    {
        if !life_support.state.is_attached() {
            continue;
        }
        let active = sample_active(power.power_on, switch.switch_on);
        if active != life_support.active {
            log::trace!("Life support {:?} active {} -> {}", entity, life_support.active, active);
            changed += 1;
        }
        life_support.active = active;
    }
    changed
}

/// Deregister a life support comp from its map.
///
/// Detaching a comp that is not attached leaves every aggregator untouched.
pub fn detach_life_support(
    world: &mut World,
    maps: &mut BTreeMap<MapId, ShipMap>,
    entity: Entity,
) -> Result<Detach, EngineError> {
    let mut life_support = world
        .get::<&mut LifeSupport>(entity)
        .map_err(component_error("LifeSupport"))?;

    let AttachState::Attached { map } = life_support.state else {
        log::debug!("Life support {:?} detached without being attached", entity);
        return Ok(Detach::NotAttached);
    };

    let removed = maps
        .get_mut(&map)
        .map(|m| m.heat.remove_life_support(entity))
        .unwrap_or(false);
    if !removed {
        log::warn!("Life support {:?} was missing from the {} aggregator", entity, map);
    }
    life_support.state = AttachState::Unattached;
    log::debug!("Life support {:?} detached from {}", entity, map);
    Ok(Detach::Removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipworks_logic::constants::LIFE_SUPPORT_SAMPLE_INTERVAL;

    fn setup(power_on: bool, switch_on: bool) -> (World, BTreeMap<MapId, ShipMap>, Entity) {
        let mut world = World::new();
        let entity = world.spawn((
            LifeSupport::new(),
            PowerTrader { power_on },
            Flickable { switch_on },
        ));
        let mut maps = BTreeMap::new();
        maps.insert(MapId(0), ShipMap::new(MapId(0)));
        (world, maps, entity)
    }

    #[test]
    fn test_attach_registers_and_samples() {
        let (mut world, mut maps, entity) = setup(true, true);
        let map = maps.get_mut(&MapId(0)).unwrap();
        attach_life_support(&mut world, map, entity, false).unwrap();

        assert!(map.heat.contains_life_support(entity));
        let ls = world.get::<&LifeSupport>(entity).unwrap();
        assert!(ls.active);
        assert_eq!(ls.state, AttachState::Attached { map: MapId(0) });
    }

    #[test]
    fn test_switched_off_goes_inactive_on_next_sample() {
        let (mut world, mut maps, entity) = setup(true, true);
        attach_life_support(&mut world, maps.get_mut(&MapId(0)).unwrap(), entity, false).unwrap();

        world.get::<&mut Flickable>(entity).unwrap().switch_on = false;

        // Stale until the sampling tick
        assert_eq!(life_support_system(&mut world, 1, LIFE_SUPPORT_SAMPLE_INTERVAL), 0);
        assert!(world.get::<&LifeSupport>(entity).unwrap().active);

        assert_eq!(life_support_system(&mut world, 360, LIFE_SUPPORT_SAMPLE_INTERVAL), 1);
        assert!(!world.get::<&LifeSupport>(entity).unwrap().active);
    }

    #[test]
    fn test_unattached_trackers_are_not_sampled() {
        let (mut world, _maps, entity) = setup(true, true);
        assert_eq!(life_support_system(&mut world, 0, LIFE_SUPPORT_SAMPLE_INTERVAL), 0);
        assert!(!world.get::<&LifeSupport>(entity).unwrap().active);
    }

    #[test]
    fn test_double_attach_is_ignored() {
        let (mut world, mut maps, entity) = setup(false, true);
        let map = maps.get_mut(&MapId(0)).unwrap();
        attach_life_support(&mut world, map, entity, false).unwrap();
        attach_life_support(&mut world, map, entity, false).unwrap();
        assert_eq!(map.heat.life_support_count(), 1);
    }

    #[test]
    fn test_detach_without_attach() {
        let (mut world, mut maps, entity) = setup(true, true);
        let other = world.spawn(());
        maps.get_mut(&MapId(0)).unwrap().heat.add_life_support(other);

        assert_eq!(
            detach_life_support(&mut world, &mut maps, entity).unwrap(),
            Detach::NotAttached
        );
        assert_eq!(maps[&MapId(0)].heat.life_supports(), &[other]);
    }

    #[test]
    fn test_detach_twice() {
        let (mut world, mut maps, entity) = setup(true, true);
        attach_life_support(&mut world, maps.get_mut(&MapId(0)).unwrap(), entity, false).unwrap();

        assert_eq!(detach_life_support(&mut world, &mut maps, entity).unwrap(), Detach::Removed);
        assert_eq!(
            detach_life_support(&mut world, &mut maps, entity).unwrap(),
            Detach::NotAttached
        );
        assert_eq!(maps[&MapId(0)].heat.life_support_count(), 0);
    }

    #[test]
    fn test_attach_without_power_component() {
        let mut world = World::new();
        let entity = world.spawn((LifeSupport::new(), Flickable::default()));
        let mut map = ShipMap::new(MapId(0));

        assert!(matches!(
            attach_life_support(&mut world, &mut map, entity, false),
            Err(EngineError::MissingComponent("PowerTrader"))
        ));
        assert_eq!(map.heat.life_support_count(), 0);
    }
}
