//! Playback lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a player instance.
///
/// Exactly one live value exists per player; all transitions run on the
/// player's worker thread, serialized through its command queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// Constructed, no prepare yet.
    #[default]
    Idle,
    /// Source probed, decoder configured, ready to start.
    Prepared,
    /// Actively decoding and presenting.
    Playing,
    /// Suspended; resume continues from the current position.
    Paused,
    /// Halted and rewound; start plays from the beginning again.
    Stopped,
    /// Terminal. Every further operation is a no-op.
    Released,
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }

    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }

    pub fn is_prepared(self) -> bool {
        self == Self::Prepared
    }

    pub fn is_released(self) -> bool {
        self == Self::Released
    }

    /// Whether `start` is legal from this state (fresh start or resume).
    pub fn can_start(self) -> bool {
        matches!(self, Self::Prepared | Self::Paused | Self::Stopped)
    }
}
