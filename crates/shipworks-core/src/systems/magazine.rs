//! Torpedo launcher system - firing, unloading and loading against the
//! magazine of a launcher entity

use hecs::{Entity, World};
use shipworks_logic::defs::{Defs, ItemStack, ProjectileId, ShellId};

use crate::components::ShellMagazine;
use crate::engine::{component_error, EngineError};

/// Launch the selected shell of a launcher and consume it
pub fn fire_launcher(
    world: &mut World,
    defs: &Defs,
    entity: Entity,
) -> Result<ProjectileId, EngineError> {
    let mut magazine = world
        .get::<&mut ShellMagazine>(entity)
        .map_err(component_error("ShellMagazine"))?;

    let projectile = magazine.current_projectile(defs)?;
    let shell = magazine.notify_fired()?;
    log::debug!(
        "Launcher {:?} fired {} as {} ({} left)",
        entity,
        shell,
        projectile,
        magazine.len()
    );
    Ok(projectile)
}

/// Empty a launcher, returning the shells as items to place on the map
pub fn unload_launcher(world: &mut World, entity: Entity) -> Result<Vec<ItemStack>, EngineError> {
    let mut magazine = world
        .get::<&mut ShellMagazine>(entity)
        .map_err(component_error("ShellMagazine"))?;
    let items = magazine.remove_all();
    log::debug!("Launcher {:?} unloaded {} shells", entity, items.len());
    Ok(items)
}

/// Load one shell into a launcher
pub fn load_launcher(world: &mut World, entity: Entity, shell: ShellId) -> Result<(), EngineError> {
    let mut magazine = world
        .get::<&mut ShellMagazine>(entity)
        .map_err(component_error("ShellMagazine"))?;
    magazine.load_shell(shell, 1);
    Ok(())
}

/// The launcher entity if it carries a magazine that still has room
pub fn find_magazine_needing_shells(world: &World, entity: Entity) -> Option<Entity> {
    let magazine = world.get::<&ShellMagazine>(entity).ok()?;
    (!magazine.is_full()).then_some(entity)
}
