//! Controller state machine and message dispatch for the crosswalk.
//!
//! # Modules
//!
//! - [`fsm`] -- [`Controller`], the `ready`/`walk` state machine with its
//!   explicit transition table, walk queue, and play history.
//! - [`service`] -- [`ControllerService`], which turns raw channel payloads
//!   into state machine triggers, tracks component liveness, and answers
//!   API requests.
//! - [`error`] -- [`ControllerError`].

pub mod error;
pub mod fsm;
pub mod service;

pub use error::ControllerError;
pub use fsm::{ControlSink, Controller, FireOutcome, Trigger, next_state};
pub use service::ControllerService;
