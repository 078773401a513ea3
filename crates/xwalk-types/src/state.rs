//! Externally visible controller state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The state of the controller's scene state machine.
///
/// `Ready` is the initial state: the crosswalk is idle and waiting for a
/// button press. `Walk` means a scene (intro, walk, outro) is playing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ControllerState {
    /// Idle, waiting for a button press.
    #[default]
    Ready,
    /// A scene is playing.
    Walk,
}

impl ControllerState {
    /// The lowercase wire name of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Walk => "walk",
        }
    }

    /// Whether a scene is playing in this state.
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Walk)
    }
}

impl core::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
