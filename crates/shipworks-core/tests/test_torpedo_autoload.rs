//! End-to-end tests for the engine with an auto-loader installed.
//!
//! Exercises: defs JSON → engine startup negotiation → hopper feeding →
//! firing → save/load → life support sampling.

use shipworks_core::prelude::*;
use shipworks_core::refuel::{CompatOutcome, FuelingMachine, PluginRegistry};
use shipworks_logic::constants::AUTO_LOADER_MOD;
use shipworks_logic::defs::{Defs, ItemStack, ProjectileId, ShellId};

const DEFS_JSON: &str = r#"{
    "shells": [
        { "id": "TorpedoHE", "label": "HE torpedo", "projectile_when_loaded": "ProjTorpedoHE" },
        { "id": "TorpedoEMP", "label": "EMP torpedo", "projectile_when_loaded": "ProjTorpedoEMP" }
    ],
    "buildings": [
        {
            "name": "TorpedoTube",
            "magazine": { "max_torpedoes": 3 },
            "default_storage_settings": { "filter": { "allowed": ["TorpedoHE", "TorpedoEMP"] } }
        },
        { "name": "LifeSupport", "life_support": true },
        { "name": "FuelingHopper", "hopper": true }
    ]
}"#;

fn engine_with_loader() -> SimulationEngine {
    let defs = Defs::from_json_str(DEFS_JSON).unwrap();
    let config = EngineConfig {
        active_mods: vec![AUTO_LOADER_MOD.to_string()],
        auto_load_interval: 1,
        ..Default::default()
    };
    let mut plugins = PluginRegistry::new();
    plugins.register(Box::new(FuelingMachine::new(AUTO_LOADER_MOD)));
    SimulationEngine::with_plugins(defs, config, plugins)
}

#[test]
fn auto_loader_fills_tube_to_capacity() {
    let mut engine = engine_with_loader();
    assert_eq!(engine.compat_outcome(), CompatOutcome::Registered);

    let map = engine.add_map();
    let tube = engine.spawn_building(map, "TorpedoTube").unwrap();
    let hopper = engine.spawn_building(map, "FuelingHopper").unwrap();
    engine
        .fill_hopper(
            hopper,
            vec![ItemStack::new(ShellId::new("TorpedoHE"), 5)],
            &[tube],
        )
        .unwrap();

    engine.run_ticks(10);

    let magazine = engine.magazine(tube).unwrap();
    assert!(magazine.is_full());
    assert_eq!(magazine.len(), 3);
}

#[test]
fn prevented_shells_are_held_back() {
    let mut engine = engine_with_loader();
    let map = engine.add_map();
    let tube = engine.spawn_building(map, "TorpedoTube").unwrap();

    engine.load_shell(tube, ShellId::new("TorpedoHE")).unwrap();
    engine.load_shell(tube, ShellId::new("TorpedoEMP")).unwrap();
    engine.load_shell(tube, ShellId::new("TorpedoHE")).unwrap();
    engine
        .magazine_mut(tube)
        .unwrap()
        .prevent(ShellId::new("TorpedoHE"));

    assert_eq!(engine.magazine(tube).unwrap().selected_index(), Some(1));
    assert_eq!(engine.fire(tube).unwrap(), ProjectileId::new("ProjTorpedoEMP"));
    assert_eq!(
        engine.magazine(tube).unwrap().loaded(),
        &[ShellId::new("TorpedoHE"), ShellId::new("TorpedoHE")]
    );

    // Only prevented shells remain: the manual selection still fires
    assert!(!engine.magazine(tube).unwrap().has_usable());
    assert_eq!(engine.fire(tube).unwrap(), ProjectileId::new("ProjTorpedoHE"));
}

#[test]
fn filter_blocks_disallowed_shells() {
    let mut engine = engine_with_loader();
    let map = engine.add_map();
    let tube = engine.spawn_building(map, "TorpedoTube").unwrap();
    let hopper = engine.spawn_building(map, "FuelingHopper").unwrap();

    engine
        .magazine_mut(tube)
        .unwrap()
        .set_shell_allowed(ShellId::new("TorpedoEMP"), false);
    engine
        .fill_hopper(
            hopper,
            vec![ItemStack::new(ShellId::new("TorpedoEMP"), 2)],
            &[tube],
        )
        .unwrap();

    engine.run_ticks(5);
    assert!(!engine.magazine(tube).unwrap().has_any());
}

#[test]
fn life_support_survives_save_load() {
    let mut engine = engine_with_loader();
    let map = engine.add_map();
    let ls = engine.spawn_building(map, "LifeSupport").unwrap();
    engine.set_power(ls, true).unwrap();
    engine.run_ticks(360);
    assert_eq!(engine.life_support_active(ls), Some(true));

    let mut buffer = Vec::new();
    engine.save(&mut buffer, SaveFormat::Binary).unwrap();

    let mut restored = engine_with_loader();
    restored.load(&buffer[..], SaveFormat::Binary).unwrap();

    let map = restored.maps().next().unwrap();
    assert!(map.heat.life_support_online(&restored.world));
    let ls = map.heat.life_supports()[0];

    // Power on, switch off: inactive after the next sample
    restored.set_switch(ls, false).unwrap();
    restored.run_ticks(360);
    assert_eq!(restored.life_support_active(ls), Some(false));
}

#[test]
fn engine_without_loader_mod_skips_compat() {
    let defs = Defs::from_json_str(DEFS_JSON).unwrap();
    let mut plugins = PluginRegistry::new();
    plugins.register(Box::new(FuelingMachine::new(AUTO_LOADER_MOD)));
    let engine = SimulationEngine::with_plugins(defs, EngineConfig::default(), plugins);
    assert_eq!(engine.compat_outcome(), CompatOutcome::ModInactive);
}
