//! Auto-loader integration.
//!
//! Auto-loaders are optional providers that push items into buildings. A
//! building kind that wants to be fed registers a [`RefuelableRegistration`]
//! with every provider that advertises [`Capability::Refuelable`]. The
//! negotiation happens once at engine startup; providers that are absent or
//! lack the capability are skipped.
//!
//! [`FuelingMachine`] is the built-in provider: it drains [`Hopper`]
//! entities into the targets listed on each hopper.

use hecs::{Entity, World};
use shipworks_logic::defs::ItemStack;

use crate::components::{Hopper, ShellMagazine};
use crate::config::EngineConfig;
use crate::systems::find_magazine_needing_shells;

/// Features a provider may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Accepts [`RefuelableRegistration`]s and feeds the registered buildings
    Refuelable,
}

/// "Does this building still need items" - returns the entity holding the
/// comp to feed
pub type NeedsFn = Box<dyn Fn(&World, Entity) -> Option<Entity> + Send + Sync>;
/// How many units of the item the comp accepts (0 = refuse)
pub type AcceptsFn = Box<dyn Fn(&World, Entity, &ItemStack) -> u32 + Send + Sync>;
/// Hand one unit over. Returns false if the comp is gone and the unit was
/// not taken.
pub type ConsumeFn = Box<dyn Fn(&mut World, Entity, &ItemStack) -> bool + Send + Sync>;

/// A building kind that wants to be fed by auto-loaders
pub struct RefuelableRegistration {
    pub kind: &'static str,
    pub needs: NeedsFn,
    pub accepts: AcceptsFn,
    pub consume: ConsumeFn,
}

impl std::fmt::Debug for RefuelableRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefuelableRegistration")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// An auto-loader implementation
pub trait RefuelProvider: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn register_refuelable(&mut self, registration: RefuelableRegistration);

    /// Run one feeding pass. Returns how many units were delivered.
    fn service(&mut self, world: &mut World) -> usize;
}

/// Providers known to the engine, looked up by name
#[derive(Default)]
pub struct PluginRegistry {
    providers: Vec<Box<dyn RefuelProvider>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Box<dyn RefuelProvider>) {
        log::debug!("Registered refuel provider `{}`", provider.name());
        self.providers.push(provider);
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn RefuelProvider + 'static)> {
        self.providers
            .iter_mut()
            .find(|p| p.name() == name)
            .map(|p| p.as_mut())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run a feeding pass on every provider
    pub fn service_all(&mut self, world: &mut World) -> usize {
        self.providers.iter_mut().map(|p| p.service(world)).sum()
    }
}

/// How the torpedo compatibility registration went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatOutcome {
    Registered,
    /// The auto-loader mod is not in the active mod list
    ModInactive,
    /// The mod is active but no provider is registered under its name
    ProviderMissing,
    /// The provider does not accept refuelable registrations
    CapabilityMissing,
}

/// Registration that lets auto-loaders feed torpedo launchers
pub fn torpedo_registration() -> RefuelableRegistration {
    RefuelableRegistration {
        kind: "TorpedoLauncher",
        needs: Box::new(|world, building| find_magazine_needing_shells(world, building)),
        accepts: Box::new(|world, comp, item| {
            world
                .get::<&ShellMagazine>(comp)
                .map(|m| u32::from(m.accepts(item)))
                .unwrap_or(0)
        }),
        consume: Box::new(|world, comp, item| {
            let Ok(mut magazine) = world.get::<&mut ShellMagazine>(comp) else {
                return false;
            };
            log::trace!("Auto-loaded {} into {:?}", item.def, comp);
            magazine.load_shell(item.def.clone(), 1);
            true
        }),
    }
}

/// Register torpedo launchers with the configured auto-loader, if present
pub fn register_torpedo_compat(registry: &mut PluginRegistry, config: &EngineConfig) -> CompatOutcome {
    let mod_name = config.auto_loader_mod.as_str();
    if !config.is_mod_active(mod_name) {
        log::debug!("Auto-loader `{}` not active, skipping torpedo compat", mod_name);
        return CompatOutcome::ModInactive;
    }

    let Some(provider) = registry.get_mut(mod_name) else {
        log::warn!(
            "Failed to load compatibility for `{}`; auto loading torpedo tubes won't work",
            mod_name
        );
        return CompatOutcome::ProviderMissing;
    };

    if !provider.supports(Capability::Refuelable) {
        log::warn!(
            "`{}` does not accept refuelable registrations; auto loading torpedo tubes won't work",
            mod_name
        );
        return CompatOutcome::CapabilityMissing;
    }

    provider.register_refuelable(torpedo_registration());
    log::info!("Registered torpedo launchers with `{}`", mod_name);
    CompatOutcome::Registered
}

/// Built-in auto-loader that feeds hopper targets
pub struct FuelingMachine {
    name: String,
    consumers: Vec<RefuelableRegistration>,
}

impl FuelingMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumers: Vec::new(),
        }
    }
}

const FUELING_CAPABILITIES: &[Capability] = &[Capability::Refuelable];

impl RefuelProvider for FuelingMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &[Capability] {
        FUELING_CAPABILITIES
    }

    fn register_refuelable(&mut self, registration: RefuelableRegistration) {
        self.consumers.push(registration);
    }

    /// Each target receives at most one unit per pass
    fn service(&mut self, world: &mut World) -> usize {
        let hoppers: Vec<(Entity, Vec<Entity>)> = world
            .query::<&Hopper>()
            .iter()
            .map(|(e, h)| (e, h.targets.clone()))
            .collect();

        let mut delivered = 0;
        for (hopper_entity, targets) in hoppers {
            for target in targets {
                for consumer in &self.consumers {
                    let view: &World = world;
                    let Some(comp) = (consumer.needs)(view, target) else {
                        continue;
                    };

                    let unit = {
                        let Ok(mut hopper) = view.get::<&mut Hopper>(hopper_entity) else {
                            break;
                        };
                        let Some(pos) = hopper
                            .items
                            .iter()
                            .position(|i| i.count > 0 && (consumer.accepts)(view, comp, i) > 0)
                        else {
                            continue;
                        };
                        let stack = &mut hopper.items[pos];
                        stack.count -= 1;
                        let unit = ItemStack::single(stack.def.clone());
                        if stack.count == 0 {
                            hopper.items.remove(pos);
                        }
                        unit
                    };

                    if !(consumer.consume)(world, comp, &unit) {
                        log::warn!(
                            "{} lost {:?} before delivery, returning {} to {:?}",
                            consumer.kind,
                            comp,
                            unit.def,
                            hopper_entity
                        );
                        if let Ok(mut hopper) = world.get::<&mut Hopper>(hopper_entity) {
                            hopper.insert(unit);
                        }
                        continue;
                    }
                    delivered += 1;
                    break;
                }
            }
        }
        delivered
    }
}
