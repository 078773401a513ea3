//! Controller process configuration.
//!
//! All configuration is loaded from environment variables, each with a
//! default suitable for running from the repository root against a local
//! NATS server.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ControllerAppError;

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// NATS server URL (e.g. `nats://localhost:4222`).
    pub nats_url: String,
    /// Path to the animation configuration YAML.
    pub animation_config: PathBuf,
    /// Directory holding the animation audio files.
    pub sound_dir: PathBuf,
    /// Longest wait for a message before an idle loop iteration.
    pub poll_timeout: Duration,
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `NATS_URL` -- NATS server connection string (default `nats://localhost:4222`)
    /// - `XWALK_CONFIG` -- animation configuration file (default `static/data/config.yaml`)
    /// - `XWALK_SOUND_DIR` -- audio directory (default `static/data/snd`)
    /// - `POLL_TIMEOUT_MS` -- idle wake-up interval in milliseconds (default 1000)
    pub fn from_env() -> Result<Self, ControllerAppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerAppError> {
        let nats_url = lookup("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_owned());
        let animation_config = lookup("XWALK_CONFIG")
            .unwrap_or_else(|| "static/data/config.yaml".to_owned())
            .into();
        let sound_dir = lookup("XWALK_SOUND_DIR")
            .unwrap_or_else(|| "static/data/snd".to_owned())
            .into();
        let poll_timeout_ms: u64 = lookup("POLL_TIMEOUT_MS")
            .unwrap_or_else(|| "1000".to_owned())
            .parse()
            .map_err(|e| ControllerAppError::Config(format!("invalid POLL_TIMEOUT_MS: {e}")))?;
        if poll_timeout_ms == 0 {
            return Err(ControllerAppError::Config(
                "POLL_TIMEOUT_MS must be positive".to_owned(),
            ));
        }

        Ok(Self {
            nats_url,
            animation_config,
            sound_dir,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
        })
    }
}
