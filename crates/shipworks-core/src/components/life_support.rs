//! Life support tracker component and its attachment state.

use shipworks_logic::life_support::LifeSupportSave;

use super::building::MapId;

/// Attachment of a comp to a map's aggregator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachState {
    #[default]
    Unattached,
    Attached {
        map: MapId,
    },
}

impl AttachState {
    pub fn is_attached(&self) -> bool {
        matches!(self, AttachState::Attached { .. })
    }

    pub fn map(&self) -> Option<MapId> {
        match self {
            AttachState::Attached { map } => Some(*map),
            AttachState::Unattached => None,
        }
    }
}

/// Result of detaching a comp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detach {
    /// The comp was attached and has been removed from its aggregator
    Removed,
    /// The comp was never attached (or already detached); nothing changed
    NotAttached,
}

/// Tracks whether a life support building is powered and switched on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifeSupport {
    /// Last sampled state, stale between samples
    pub active: bool,
    pub state: AttachState,
}

impl LifeSupport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_save(save: LifeSupportSave) -> Self {
        Self {
            active: save.active,
            state: AttachState::Unattached,
        }
    }

    pub fn to_save(&self) -> LifeSupportSave {
        LifeSupportSave {
            active: self.active,
        }
    }
}
