//! Life support power-state sampling.
//!
//! A life support building counts as active only while it is powered and
//! switched on. The state is resampled on a fixed cadence and is stale in
//! between.

use serde::{Deserialize, Serialize};

/// Active state for the given power and switch signals.
pub fn sample_active(power_on: bool, switch_on: bool) -> bool {
    power_on && switch_on
}

/// Whether `tick` is a sampling tick for `interval`.
///
/// An interval of zero samples every tick.
pub fn is_sample_tick(tick: u64, interval: u64) -> bool {
    interval == 0 || tick % interval == 0
}

/// Persisted part of a life support tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSupportSave {
    #[serde(default)]
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LIFE_SUPPORT_SAMPLE_INTERVAL;

    #[test]
    fn test_sample_requires_both_signals() {
        assert!(sample_active(true, true));
        assert!(!sample_active(true, false));
        assert!(!sample_active(false, true));
        assert!(!sample_active(false, false));
    }

    #[test]
    fn test_sample_cadence() {
        let interval = LIFE_SUPPORT_SAMPLE_INTERVAL;
        assert!(is_sample_tick(0, interval));
        assert!(!is_sample_tick(1, interval));
        assert!(!is_sample_tick(359, interval));
        assert!(is_sample_tick(360, interval));
        assert!(is_sample_tick(720, interval));
        assert!(is_sample_tick(7, 0));
    }

    #[test]
    fn test_missing_active_defaults_false() {
        let save: LifeSupportSave = serde_json::from_str("{}").unwrap();
        assert!(!save.active);
    }
}
