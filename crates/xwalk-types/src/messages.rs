//! Pub/sub command and event taxonomy.
//!
//! Every frame on the Interactions, Control, and Heartbeats channels is one
//! [`Message`], encoded as a JSON object whose `type` field selects the
//! payload shape:
//!
//! | `type` | direction | payload |
//! |---|---|---|
//! | `heartbeat` | peripheral -> controller | [`Heartbeat`] |
//! | `button_press` | peripheral -> controller | [`ButtonPress`] |
//! | `timer_expired` | timer -> controller | [`TimerExpired`] |
//! | `play_scene` | controller -> peripherals | [`PlayScene`] |
//! | `end_scene` | controller -> peripherals | [`EndScene`] |
//! | `current_state` | controller -> peripherals | [`CurrentState`] |
//! | `reset` | any | [`Reset`] |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ParseError;
use crate::state::ControllerState;

/// Registry name used in [`ParseError`]s for this taxonomy.
const REGISTRY: &str = "message";

/// A message travelling over one of the pub/sub channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Message {
    /// Liveness signal from a peripheral.
    Heartbeat(Heartbeat),
    /// A physical or virtual button was pressed.
    ButtonPress(ButtonPress),
    /// Start a scene with the given animations.
    PlayScene(PlayScene),
    /// The current scene is over.
    EndScene(EndScene),
    /// Snapshot of the controller state for resynchronising peripherals.
    CurrentState(CurrentState),
    /// Return to the idle state.
    Reset(Reset),
    /// A scene timer ran out.
    TimerExpired(TimerExpired),
}

impl Message {
    /// Every `type` tag in this registry.
    pub const KINDS: [&'static str; 7] = [
        "heartbeat",
        "button_press",
        "play_scene",
        "end_scene",
        "current_state",
        "reset",
        "timer_expired",
    ];

    /// Decode a message from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] for invalid JSON, an unknown `type`
    /// tag, or fields that do not match the tag's schema.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(data).map_err(|source| ParseError::Malformed {
            registry: REGISTRY,
            source,
        })
    }

    /// Encode the message to its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, ParseError> {
        serde_json::to_vec(self).map_err(|source| ParseError::Encode {
            registry: REGISTRY,
            source,
        })
    }

    /// The `type` tag of this message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Heartbeat(_) => "heartbeat",
            Self::ButtonPress(_) => "button_press",
            Self::PlayScene(_) => "play_scene",
            Self::EndScene(_) => "end_scene",
            Self::CurrentState(_) => "current_state",
            Self::Reset(_) => "reset",
            Self::TimerExpired(_) => "timer_expired",
        }
    }
}

/// Periodic liveness signal from a peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Heartbeat {
    /// Host the peripheral runs on.
    pub host: String,
    /// Component name (e.g. `timer`, `button_virtual`).
    pub component: String,
    /// When the heartbeat was sent.
    pub sent_at: DateTime<Utc>,
    /// Set on the first beats after a peripheral (re)starts.
    #[serde(default)]
    pub initial: bool,
}

impl Heartbeat {
    /// Key under which the controller tracks this peripheral's liveness.
    pub fn liveness_key(&self) -> String {
        format!("{}@{}", self.component, self.host)
    }
}

/// A button press event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ButtonPress {
    /// Host the button is attached to.
    pub host: String,
    /// Component name of the button driver.
    pub component: String,
    /// How long the button was held, in milliseconds.
    pub press_duration: u64,
    /// When the press was released.
    pub sent_at: DateTime<Utc>,
}

/// Command to play one scene.
///
/// Durations are in seconds; `total_duration` is the sum of the three
/// phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayScene {
    /// Intro animation name.
    pub intro: String,
    /// Walk animation name.
    pub walk: String,
    /// Outro animation name.
    pub outro: String,
    /// Intro length in seconds.
    pub intro_duration: f64,
    /// Walk length in seconds.
    pub walk_duration: f64,
    /// Outro length in seconds.
    pub outro_duration: f64,
    /// Whole scene length in seconds.
    pub total_duration: f64,
}

/// The scene has ended; peripherals return to idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EndScene {}

/// The controller's current state, broadcast to resynchronise peripherals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CurrentState {
    /// Current state machine state.
    pub state: ControllerState,
}

/// Return to the idle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reset {}

/// A scene timer ran out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerExpired {
    /// Identifier of the timer (`scene_timer_<n>`).
    pub timer_id: String,
    /// The scene duration the timer was started for, in seconds.
    pub duration: f64,
}
