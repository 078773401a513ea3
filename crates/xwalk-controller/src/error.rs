//! Error types for the controller process.
//!
//! Only start-up can fail: once the loop is running, per-message errors
//! are logged or turned into API failure responses.

use xwalk_bus::BusError;
use xwalk_library::ConfigError;

/// Errors that stop the controller from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ControllerAppError {
    /// Process configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The animation configuration could not be loaded.
    #[error("animation config error: {0}")]
    Animation(#[from] ConfigError),

    /// The bus could not be reached.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}
