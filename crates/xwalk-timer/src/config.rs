//! Scene timer configuration, loaded from environment variables.

use std::time::Duration;

use crate::error::TimerError;

/// Complete timer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// NATS server URL.
    pub nats_url: String,
    /// Host name reported in heartbeats.
    pub hostname: String,
    /// Interval between heartbeats.
    pub heartbeat_interval: Duration,
}

impl TimerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `NATS_URL` -- NATS server connection string (default `nats://localhost:4222`)
    /// - `XWALK_HOSTNAME` -- host name for heartbeats (default `crosswalk-unknown`)
    /// - `HEARTBEAT_INTERVAL_MS` -- heartbeat period in milliseconds (default 1000)
    pub fn from_env() -> Result<Self, TimerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TimerError> {
        let nats_url = lookup("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_owned());
        let hostname = lookup("XWALK_HOSTNAME").unwrap_or_else(|| "crosswalk-unknown".to_owned());
        let heartbeat_ms: u64 = lookup("HEARTBEAT_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_owned())
            .parse()
            .map_err(|e| TimerError::Config(format!("invalid HEARTBEAT_INTERVAL_MS: {e}")))?;
        if heartbeat_ms == 0 {
            return Err(TimerError::Config(
                "HEARTBEAT_INTERVAL_MS must be positive".to_owned(),
            ));
        }
        Ok(Self {
            nats_url,
            hostname,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TimerConfig::from_lookup(|_| None);
        assert!(matches!(
            config,
            Ok(ref c) if c.hostname == "crosswalk-unknown"
                && c.heartbeat_interval == Duration::from_secs(1)
        ));
    }

    #[test]
    fn hostname_and_interval_override() {
        let config = TimerConfig::from_lookup(|name| match name {
            "XWALK_HOSTNAME" => Some("pi-timer".to_owned()),
            "HEARTBEAT_INTERVAL_MS" => Some("500".to_owned()),
            _ => None,
        });
        assert!(matches!(
            config,
            Ok(ref c) if c.hostname == "pi-timer" && c.heartbeat_interval == Duration::from_millis(500)
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = TimerConfig::from_lookup(|name| {
            (name == "HEARTBEAT_INTERVAL_MS").then(|| "0".to_owned())
        });
        assert!(matches!(config, Err(TimerError::Config(_))));
    }
}
