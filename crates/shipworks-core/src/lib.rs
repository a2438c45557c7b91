//! Shipworks Core - building comps on an ECS world
//!
//! Drives the torpedo magazine and life support comps through their
//! lifecycle (spawn, tick, despawn, save/load) on top of `hecs`.
//!
//! # Architecture
//!
//! - **Entities**: buildings spawned from a [`BuildingDef`](shipworks_logic::defs::BuildingDef)
//! - **Components**: pure data attached to buildings (magazine, life support, power, switch, hopper)
//! - **Systems**: functions that query and update components
//! - **Maps**: per-map aggregators that comps register with while attached
//! - **Refuel**: optional auto-loader providers negotiated at startup
//!
//! # Example
//!
//! ```rust,no_run
//! use shipworks_core::prelude::*;
//! use shipworks_logic::defs::Defs;
//!
//! let defs = Defs::from_json_str(r#"{ "buildings": [ { "name": "LifeSupport", "life_support": true } ] }"#).unwrap();
//! let mut engine = SimulationEngine::new(defs, EngineConfig::default());
//! let map = engine.add_map();
//! let life_support = engine.spawn_building(map, "LifeSupport").unwrap();
//! engine.set_power(life_support, true).unwrap();
//!
//! loop {
//!     engine.tick();
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod maps;
pub mod persistence;
pub mod refuel;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::EngineConfig;
    pub use crate::engine::{EngineError, SimulationEngine};
    pub use crate::persistence::SaveFormat;
}
