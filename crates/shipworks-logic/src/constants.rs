//! Tuning constants shared by the logic and core crates.

/// Ticks between life support power samples.
pub const LIFE_SUPPORT_SAMPLE_INTERVAL: u64 = 360;

/// Ticks between auto-loader service passes.
pub const AUTO_LOAD_INTERVAL: u64 = 60;

/// Magazine capacity used when a def does not set one.
pub const DEFAULT_MAX_TORPEDOES: usize = 3;

/// Mod name of the third-party auto-loader.
pub const AUTO_LOADER_MOD: &str = "Project RimFactory Revived";
