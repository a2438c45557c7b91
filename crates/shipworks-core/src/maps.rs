//! Ship maps and their per-map aggregators.

use hecs::{Entity, World};

use crate::components::{LifeSupport, MapId};

/// Per-map registry of comps that the map processes in batch
#[derive(Debug, Clone, Default)]
pub struct ShipHeatMap {
    life_supports: Vec<Entity>,
}

impl ShipHeatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a life support entity. Returns false if it was already present.
    pub fn add_life_support(&mut self, entity: Entity) -> bool {
        if self.life_supports.contains(&entity) {
            return false;
        }
        self.life_supports.push(entity);
        true
    }

    /// Remove a life support entity. Removing an absent entity is a no-op
    /// that returns false.
    pub fn remove_life_support(&mut self, entity: Entity) -> bool {
        match self.life_supports.iter().position(|e| *e == entity) {
            Some(pos) => {
                self.life_supports.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains_life_support(&self, entity: Entity) -> bool {
        self.life_supports.contains(&entity)
    }

    pub fn life_supports(&self) -> &[Entity] {
        &self.life_supports
    }

    pub fn life_support_count(&self) -> usize {
        self.life_supports.len()
    }

    /// Whether any registered life support reported active at its last sample
    pub fn life_support_online(&self, world: &World) -> bool {
        self.life_supports.iter().any(|e| {
            world
                .get::<&LifeSupport>(*e)
                .map(|ls| ls.active)
                .unwrap_or(false)
        })
    }
}

/// A ship map and the aggregators it owns
#[derive(Debug, Clone)]
pub struct ShipMap {
    pub id: MapId,
    pub heat: ShipHeatMap,
}

impl ShipMap {
    pub fn new(id: MapId) -> Self {
        Self {
            id,
            heat: ShipHeatMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut heat = ShipHeatMap::new();

        assert!(heat.add_life_support(a));
        assert!(!heat.add_life_support(a));
        assert!(heat.add_life_support(b));
        assert_eq!(heat.life_support_count(), 2);

        assert!(heat.remove_life_support(a));
        assert!(!heat.remove_life_support(a));
        assert_eq!(heat.life_supports(), &[b]);
    }

    #[test]
    fn test_remove_absent_leaves_registry_intact() {
        let mut world = World::new();
        let registered = world.spawn(());
        let stranger = world.spawn(());
        let mut heat = ShipHeatMap::new();
        heat.add_life_support(registered);

        assert!(!heat.remove_life_support(stranger));
        assert!(heat.contains_life_support(registered));
    }

    #[test]
    fn test_life_support_online() {
        let mut world = World::new();
        let off = world.spawn((LifeSupport::new(),));
        let on = world.spawn((LifeSupport {
            active: true,
            ..Default::default()
        },));
        let mut heat = ShipHeatMap::new();

        heat.add_life_support(off);
        assert!(!heat.life_support_online(&world));

        heat.add_life_support(on);
        assert!(heat.life_support_online(&world));

        // Despawned entities count as inactive
        world.despawn(on).unwrap();
        assert!(!heat.life_support_online(&world));
    }
}
