//! Error types for the scene timer process.

use xwalk_bus::BusError;

/// Errors that stop the timer from starting.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// Process configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The bus could not be reached.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}
