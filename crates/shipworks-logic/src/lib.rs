//! Pure component logic for Shipworks.
//!
//! This crate holds the building comp logic that is independent of any ECS,
//! engine, or save format. Types take plain data and return results, so the
//! rules can be unit-tested without spawning a world.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Sampling cadences, default capacities, integration names |
//! | [`defs`] | Shell, projectile and building definitions |
//! | [`filter`] | Storage settings and shell filters |
//! | [`life_support`] | Power/switch sampling rule for life support |
//! | [`magazine`] | Torpedo magazine storage and fire selection |

pub mod constants;
pub mod defs;
pub mod filter;
pub mod life_support;
pub mod magazine;
