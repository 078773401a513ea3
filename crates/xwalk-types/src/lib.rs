//! Shared type definitions for the crosswalk controller.
//!
//! This crate is the single source of truth for everything that crosses a
//! process boundary: the pub/sub command and event taxonomy, the
//! request/reply API taxonomy, and the animation configuration model that
//! the controller loads and echoes back to API clients. Types flow to
//! `TypeScript` via `ts-rs` for the web front-end.
//!
//! # Modules
//!
//! - [`messages`] -- Pub/sub messages (heartbeats, button presses, scenes)
//! - [`api`] -- Request/reply API requests and the status response
//! - [`animation`] -- Animation configuration model (walks, weights, menu)
//! - [`state`] -- The controller state machine's externally visible state
//! - [`error`] -- Wire parse errors

pub mod animation;
pub mod api;
pub mod error;
pub mod messages;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use animation::{
    ALL_WALKS, Animations, Category, DEFAULT_SCHEDULE, MenuItem, ReselectionConfig,
    WalkDefinition, WeightSchedule,
};
pub use api::{ApiRequest, ApiResponse, WalkPlay};
pub use error::ParseError;
pub use messages::{
    ButtonPress, CurrentState, EndScene, Heartbeat, Message, PlayScene, Reset, TimerExpired,
};
pub use state::ControllerState;
