//! Request/reply API taxonomy.
//!
//! API clients (the web front-end, operator tools) send one [`ApiRequest`]
//! and receive exactly one [`ApiResponse`]. Requests use their own `type`
//! registry, separate from [`crate::Message`], so `timer_expired` here and
//! `timer_expired` on the Interactions channel never collide.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::animation::{Animations, MenuItem};
use crate::error::ParseError;
use crate::state::ControllerState;

/// Registry name used in [`ParseError`]s for this taxonomy.
const REGISTRY: &str = "api";

/// A request sent to the controller over the request/reply channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ApiRequest {
    /// Return the current status without changing anything.
    Status,
    /// Append a walk (or every walk, for [`crate::ALL_WALKS`]) to the queue.
    QueueWalk {
        /// Walk name, or `_` for the whole catalogue.
        walk: String,
    },
    /// Empty the walk queue.
    QueueClear,
    /// Act as if the button was pressed.
    PressButton,
    /// Act as if the scene timer ran out.
    TimerExpired,
}

impl ApiRequest {
    /// Every `type` tag in this registry.
    pub const KINDS: [&'static str; 5] = [
        "status",
        "queue_walk",
        "queue_clear",
        "press_button",
        "timer_expired",
    ];

    /// Decode a request from its JSON wire form.
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

    /// Encode the request to its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, ParseError> {
        serde_json::to_vec(self).map_err(|source| ParseError::Encode {
            registry: REGISTRY,
            source,
        })
    }

    /// The `type` tag of this request.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::QueueWalk { .. } => "queue_walk",
            Self::QueueClear => "queue_clear",
            Self::PressButton => "press_button",
            Self::TimerExpired => "timer_expired",
        }
    }
}

/// One entry of the walk-play history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WalkPlay {
    /// When the scene started.
    pub played_at: DateTime<Utc>,
    /// Walk that was played.
    pub walk: String,
}

/// The controller's answer to every [`ApiRequest`].
///
/// Besides the outcome of the request itself, every response carries a
/// full status snapshot so clients never need a second round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ApiResponse {
    /// Whether the request was carried out.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Whether a scene is playing.
    pub playing: bool,
    /// Last heartbeat per component (`component@host`).
    #[serde(default)]
    pub components: BTreeMap<String, DateTime<Utc>>,
    /// Controller clock when the response was built.
    pub timestamp: DateTime<Utc>,
    /// Current state machine state.
    pub state: ControllerState,
    /// The loaded animation configuration.
    #[serde(default)]
    pub animations: Option<Animations>,
    /// Walks waiting to be played, next first.
    #[serde(default)]
    pub walk_queue: Vec<String>,
    /// Every scene played since startup, oldest first.
    #[serde(default)]
    pub walk_history: Vec<WalkPlay>,
    /// The menu item currently selecting the weight schedule.
    #[serde(default)]
    pub active_menu: Option<MenuItem>,
}

impl ApiResponse {
    /// Decode a response from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] if the payload does not match.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(data).map_err(|source| ParseError::Malformed {
            registry: REGISTRY,
            source,
        })
    }

    /// Encode the response to its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, ParseError> {
        serde_json::to_vec(self).map_err(|source| ParseError::Encode {
            registry: REGISTRY,
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn requests_survive_the_wire() {
        let requests = [
            ApiRequest::Status,
            ApiRequest::QueueWalk {
                walk: "walk-cat".to_owned(),
            },
            ApiRequest::QueueClear,
            ApiRequest::PressButton,
            ApiRequest::TimerExpired,
        ];
        for request in requests {
            let bytes = request.to_json().unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["type"], request.kind());
            assert!(ApiRequest::KINDS.contains(&request.kind()));
            assert_eq!(ApiRequest::parse(&bytes).unwrap(), request);
        }
    }

    #[test]
    fn queue_walk_requires_a_walk() {
        assert!(ApiRequest::parse(br#"{"type":"queue_walk"}"#).is_err());
        assert_eq!(
            ApiRequest::parse(br#"{"type":"queue_walk","walk":"_"}"#).unwrap(),
            ApiRequest::QueueWalk {
                walk: "_".to_owned()
            }
        );
    }

    #[test]
    fn pubsub_tags_are_not_api_tags() {
        let result = ApiRequest::parse(br#"{"type":"button_press"}"#);
        assert!(matches!(result, Err(ParseError::Malformed { registry: "api", .. })));
    }

    #[test]
    fn response_survives_the_wire() {
        let mut components = BTreeMap::new();
        components.insert("timer@pi-1".to_owned(), Utc::now());
        let response = ApiResponse {
            success: true,
            message: "Status retrieved successfully".to_owned(),
            playing: false,
            components,
            timestamp: Utc::now(),
            state: ControllerState::Ready,
            animations: Some(Animations::default()),
            walk_queue: vec!["walk-cat".to_owned()],
            walk_history: vec![WalkPlay {
                played_at: Utc::now(),
                walk: "walk".to_owned(),
            }],
            active_menu: None,
        };
        let bytes = response.to_json().unwrap();
        assert_eq!(ApiResponse::parse(&bytes).unwrap(), response);
    }
}
