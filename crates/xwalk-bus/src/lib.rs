//! NATS message bus plumbing for the crosswalk.
//!
//! # Modules
//!
//! - [`client`] -- [`BusClient`], an owned connection handle, plus the
//!   subject names for each channel.
//! - [`heartbeat`] -- [`HeartbeatTask`], the cancellable background
//!   heartbeat publisher every component runs.
//! - [`api`] -- [`ApiClient`] for the request/reply API, with a reply
//!   deadline.
//! - [`error`] -- [`BusError`].

pub mod api;
pub mod client;
pub mod error;
pub mod heartbeat;

pub use api::{ApiClient, DEFAULT_API_TIMEOUT};
pub use client::{API, BusClient, CONTROL, HEARTBEATS, INTERACTIONS};
pub use error::BusError;
pub use heartbeat::{HeartbeatTask, INITIAL_BEATS, heartbeat_message};
