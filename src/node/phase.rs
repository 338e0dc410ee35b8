//! Lifecycle phases.

use serde::{Deserialize, Serialize};

/// Where a node is in its lifecycle.
///
/// ```text
/// Created -> Standby -> Loading -> Loaded -> Initializing -> Initialized <-> Active
///                                                                      ... -> Released
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Phase {
    Created,
    Standby,
    Loading,
    Loaded,
    Initializing,
    Initialized,
    Active,
    Released,
}

/// A single teardown step, in the order teardown runs them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Teardown {
    Deactivate,
    Terminate,
    Unload,
    Release,
}

impl Phase {
    /// Loaded or further along, and not released.
    pub fn is_loaded(self) -> bool {
        matches!(
            self,
            Self::Loaded | Self::Initializing | Self::Initialized | Self::Active
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Steps that take a node in this phase down to `Released`. Only the
    /// exits of phases that were actually entered are listed.
    pub fn teardown_path(self) -> &'static [Teardown] {
        use Teardown::*;
        match self {
            Self::Created | Self::Released => &[],
            Self::Standby => &[Release],
            Self::Loading | Self::Loaded => &[Unload, Release],
            Self::Initializing | Self::Initialized => &[Terminate, Unload, Release],
            Self::Active => &[Deactivate, Terminate, Unload, Release],
        }
    }
}

impl Teardown {
    /// Phase the node is in after this step.
    pub fn resulting_phase(self) -> Phase {
        match self {
            Self::Deactivate => Phase::Initialized,
            Self::Terminate => Phase::Loaded,
            Self::Unload => Phase::Standby,
            Self::Release => Phase::Released,
        }
    }
}
