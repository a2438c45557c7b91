//! Shipworks Headless Simulation Harness
//!
//! Drives the torpedo magazine and life support comps through their full
//! lifecycle against the shipped defs file. Runs entirely in-process, no
//! game client required.
//!
//! Usage:
//!   cargo run -p shipworks-simtest
//!   cargo run -p shipworks-simtest -- --verbose
//!   RUST_LOG=shipworks_core=trace cargo run -p shipworks-simtest

mod logging;

use shipworks_core::prelude::*;
use shipworks_core::refuel::{CompatOutcome, FuelingMachine, PluginRegistry};
use shipworks_logic::constants::{AUTO_LOADER_MOD, LIFE_SUPPORT_SAMPLE_INTERVAL};
use shipworks_logic::defs::{Defs, ItemStack, ShellId};
use shipworks_logic::magazine::MagazineError;

// ── Defs (same JSON the game data ships) ────────────────────────────────
const DEFS_JSON: &str = include_str!("../../../data/shipworks_defs.json");

const SMALL_TUBE: &str = "ShipTorpedoTubeSmall";
const LARGE_TUBE: &str = "ShipTorpedoTubeLarge";
const LIFE_SUPPORT: &str = "ShipLifeSupport";
const HOPPER: &str = "FuelingMachine";

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    logging::init(verbose);
    println!("=== Shipworks Simulation Harness ===\n");

    let defs = match Defs::from_json_str(DEFS_JSON) {
        Ok(defs) => defs,
        Err(e) => {
            println!("  ✗ defs_parse: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Defs consistency
    results.extend(validate_defs(&defs, verbose));

    // 2. Magazine fire selection
    results.extend(validate_magazine(&defs, verbose));

    // 3. Life support sampling
    results.extend(validate_life_support(&defs, verbose));

    // 4. Auto-loader negotiation and feeding
    results.extend(validate_auto_loader(&defs, verbose));

    // 5. Save/load
    results.extend(validate_persistence(&defs, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn new_engine(defs: &Defs, with_loader: bool) -> SimulationEngine {
    let mut config = EngineConfig {
        auto_load_interval: 1,
        ..Default::default()
    };
    let mut plugins = PluginRegistry::new();
    if with_loader {
        config.active_mods.push(AUTO_LOADER_MOD.to_string());
        plugins.register(Box::new(FuelingMachine::new(AUTO_LOADER_MOD)));
    }
    SimulationEngine::with_plugins(defs.clone(), config, plugins)
}

// ── 1. Defs ─────────────────────────────────────────────────────────────

fn validate_defs(defs: &Defs, verbose: bool) -> Vec<TestResult> {
    println!("--- Defs ---");
    let mut results = Vec::new();

    let shell_count = defs.shells().count();
    results.push(TestResult {
        name: "defs_have_shells".into(),
        passed: shell_count > 0,
        detail: format!("{} shell defs loaded", shell_count),
    });

    // Every filter entry must name a real shell
    let mut dangling = Vec::new();
    for building in defs.buildings() {
        let settings = [
            &building.default_storage_settings,
            &building.fixed_storage_settings,
        ];
        for s in settings.into_iter().flatten() {
            for shell in s.filter.allowed() {
                if defs.shell(shell).is_none() {
                    dangling.push(format!("{}:{}", building.name, shell));
                }
            }
        }
    }
    results.push(TestResult {
        name: "defs_filters_reference_shells".into(),
        passed: dangling.is_empty(),
        detail: if dangling.is_empty() {
            "all filter entries resolve".into()
        } else {
            format!("unresolved: {}", dangling.join(", "))
        },
    });

    // Defaults must fit inside the fixed settings
    let mut outside = Vec::new();
    for building in defs.buildings() {
        if let (Some(default), Some(fixed)) = (
            &building.default_storage_settings,
            &building.fixed_storage_settings,
        ) {
            for shell in default.filter.allowed() {
                if !fixed.filter.allows(shell) {
                    outside.push(format!("{}:{}", building.name, shell));
                }
            }
        }
    }
    results.push(TestResult {
        name: "defs_defaults_within_fixed".into(),
        passed: outside.is_empty(),
        detail: if outside.is_empty() {
            "default settings respect fixed settings".into()
        } else {
            format!("outside fixed settings: {}", outside.join(", "))
        },
    });

    let launchers = defs.buildings().filter(|b| b.magazine.is_some()).count();
    results.push(TestResult {
        name: "defs_have_launchers".into(),
        passed: launchers > 0,
        detail: format!("{} launcher defs", launchers),
    });

    if verbose {
        for b in defs.buildings() {
            println!(
                "    {:24} magazine={:?} life_support={} hopper={}",
                b.name, b.magazine, b.life_support, b.hopper
            );
        }
    }

    results
}

// ── 2. Magazine ─────────────────────────────────────────────────────────

fn validate_magazine(defs: &Defs, _verbose: bool) -> Vec<TestResult> {
    println!("--- Magazine ---");
    let mut results = Vec::new();
    let he = ShellId::new("ShipTorpedoHE");
    let emp = ShellId::new("ShipTorpedoEMP");

    let mut engine = new_engine(defs, false);
    let map = engine.add_map();
    let Ok(tube) = engine.spawn_building(map, LARGE_TUBE) else {
        results.push(TestResult {
            name: "magazine_spawn".into(),
            passed: false,
            detail: format!("could not spawn {}", LARGE_TUBE),
        });
        return results;
    };

    // Empty magazine refuses to fire
    let empty = engine.fire(tube);
    results.push(TestResult {
        name: "magazine_empty_fire".into(),
        passed: matches!(empty, Err(EngineError::Magazine(MagazineError::Empty))),
        detail: format!("{:?}", empty.map_err(|e| e.to_string())),
    });

    // [HE, EMP, HE] with HE prevented fires EMP first
    for shell in [&he, &emp, &he] {
        let _ = engine.load_shell(tube, shell.clone());
    }
    if let Some(mut magazine) = engine.magazine_mut(tube) {
        magazine.prevent(he.clone());
    }
    let selected = engine.magazine(tube).and_then(|m| m.selected_index());
    results.push(TestResult {
        name: "magazine_skips_prevented".into(),
        passed: selected == Some(1),
        detail: format!("selected index {:?}", selected),
    });

    let fired = engine
        .fire(tube)
        .map(|p| p.to_string())
        .map_err(|e| e.to_string());
    let remaining = engine
        .magazine(tube)
        .map(|m| m.loaded().to_vec())
        .unwrap_or_default();
    results.push(TestResult {
        name: "magazine_fire_consumes".into(),
        passed: fired.as_deref() == Ok("ProjectileTorpedoEMP")
            && remaining == vec![he.clone(), he.clone()],
        detail: format!("fired {:?}, remaining {:?}", fired, remaining),
    });

    // Unload everything as single units
    let items = engine.unload(tube).unwrap_or_default();
    results.push(TestResult {
        name: "magazine_unload_single_units".into(),
        passed: items.len() == 2 && items.iter().all(|i| i.count == 1),
        detail: format!("{} items unloaded", items.len()),
    });

    // Parent settings bound the player filter
    let antimatter = ShellId::new("ShipTorpedoAntimatter");
    let bogus = ShellId::new("NotAShell");
    let (enabled, refused) = match engine.magazine_mut(tube) {
        Some(mut magazine) => (
            magazine.set_shell_allowed(antimatter, true),
            !magazine.set_shell_allowed(bogus, true),
        ),
        None => (false, false),
    };
    results.push(TestResult {
        name: "magazine_filter_bounded".into(),
        passed: enabled && refused,
        detail: format!("antimatter enabled={} bogus refused={}", enabled, refused),
    });

    results
}

// ── 3. Life Support ─────────────────────────────────────────────────────

fn validate_life_support(defs: &Defs, _verbose: bool) -> Vec<TestResult> {
    println!("--- Life Support ---");
    let mut results = Vec::new();

    let mut engine = new_engine(defs, false);
    let map = engine.add_map();
    let Ok(ls) = engine.spawn_building(map, LIFE_SUPPORT) else {
        results.push(TestResult {
            name: "life_support_spawn".into(),
            passed: false,
            detail: format!("could not spawn {}", LIFE_SUPPORT),
        });
        return results;
    };

    let registered = engine
        .map(map)
        .map(|m| m.heat.contains_life_support(ls))
        .unwrap_or(false);
    results.push(TestResult {
        name: "life_support_registered".into(),
        passed: registered,
        detail: "attach registers with the map aggregator".into(),
    });

    let _ = engine.set_power(ls, true);
    let _ = engine.set_switch(ls, false);
    engine.run_ticks(LIFE_SUPPORT_SAMPLE_INTERVAL);
    results.push(TestResult {
        name: "life_support_switch_off_inactive".into(),
        passed: engine.life_support_active(ls) == Some(false),
        detail: "power on + switch off → inactive".into(),
    });

    let _ = engine.set_switch(ls, true);
    engine.run_ticks(LIFE_SUPPORT_SAMPLE_INTERVAL - 1);
    let stale = engine.life_support_active(ls) == Some(false);
    engine.tick();
    let fresh = engine.life_support_active(ls) == Some(true);
    results.push(TestResult {
        name: "life_support_sample_cadence".into(),
        passed: stale && fresh,
        detail: format!(
            "stale between samples={}, updated on sample={}",
            stale, fresh
        ),
    });

    let despawned = engine.despawn_building(ls).is_ok();
    let count = engine.map(map).map(|m| m.heat.life_support_count());
    results.push(TestResult {
        name: "life_support_deregistered".into(),
        passed: despawned && count == Some(0),
        detail: format!("aggregator holds {:?} after despawn", count),
    });

    results
}

// ── 4. Auto-loader ──────────────────────────────────────────────────────

fn validate_auto_loader(defs: &Defs, _verbose: bool) -> Vec<TestResult> {
    println!("--- Auto-loader ---");
    let mut results = Vec::new();

    let inactive = new_engine(defs, false);
    results.push(TestResult {
        name: "auto_loader_inactive_skipped".into(),
        passed: inactive.compat_outcome() == CompatOutcome::ModInactive,
        detail: format!("{:?}", inactive.compat_outcome()),
    });

    let mut engine = new_engine(defs, true);
    results.push(TestResult {
        name: "auto_loader_registered".into(),
        passed: engine.compat_outcome() == CompatOutcome::Registered,
        detail: format!("{:?}", engine.compat_outcome()),
    });

    let map = engine.add_map();
    let (Ok(tube), Ok(hopper)) = (
        engine.spawn_building(map, SMALL_TUBE),
        engine.spawn_building(map, HOPPER),
    ) else {
        results.push(TestResult {
            name: "auto_loader_spawn".into(),
            passed: false,
            detail: "could not spawn tube and hopper".into(),
        });
        return results;
    };

    let _ = engine.fill_hopper(
        hopper,
        vec![
            ItemStack::new(ShellId::new("ShipTorpedoAntimatter"), 3),
            ItemStack::new(ShellId::new("ShipTorpedoHE"), 5),
        ],
        &[tube],
    );
    engine.run_ticks(20);

    let (loaded, full) = engine
        .magazine(tube)
        .map(|m| (m.loaded().to_vec(), m.is_full()))
        .unwrap_or_default();
    let only_allowed = loaded.iter().all(|s| s.as_str() == "ShipTorpedoHE");
    results.push(TestResult {
        name: "auto_loader_fills_allowed".into(),
        passed: full && only_allowed && loaded.len() == 2,
        detail: format!("loaded {:?}", loaded),
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(defs: &Defs, _verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    for format in [SaveFormat::Binary, SaveFormat::Json] {
        let mut engine = new_engine(defs, false);
        let map = engine.add_map();
        let tube = engine.spawn_building(map, LARGE_TUBE).ok();
        let ls = engine.spawn_building(map, LIFE_SUPPORT).ok();
        if let (Some(tube), Some(ls)) = (tube, ls) {
            let _ = engine.load_shell(tube, ShellId::new("ShipTorpedoEMP"));
            let _ = engine.set_power(ls, true);
        }

        let mut buffer = Vec::new();
        let saved = engine.save(&mut buffer, format);

        let mut restored = new_engine(defs, false);
        let loaded = restored.load(&buffer[..], format);

        let shells: usize = restored
            .world
            .query::<&ShellMagazine>()
            .iter()
            .map(|(_, m)| m.len())
            .sum();
        let online = restored
            .maps()
            .next()
            .map(|m| m.heat.life_support_online(&restored.world))
            .unwrap_or(false);

        results.push(TestResult {
            name: format!("persistence_roundtrip_{:?}", format).to_lowercase(),
            passed: saved.is_ok() && loaded.is_ok() && shells == 1 && online,
            detail: format!(
                "{} bytes, {} shells restored, life support online={}",
                buffer.len(),
                shells,
                online
            ),
        });
    }

    results
}
