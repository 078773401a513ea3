//! Error types for the message bus.
//!
//! NATS failures carry the underlying error text, mirroring how the
//! connection, subscribe, publish, and request errors differ in type but
//! are all handled the same way by callers.

use std::time::Duration;

use xwalk_types::ParseError;

/// Errors from bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Failed to connect to or communicate with the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// A message could not be encoded or decoded.
    #[error("serde error: {0}")]
    Serde(#[from] ParseError),

    /// No reply arrived before the deadline.
    #[error("no reply on {subject} within {}ms", timeout.as_millis())]
    Timeout {
        /// Subject the request was sent to.
        subject: String,
        /// How long the client waited.
        timeout: Duration,
    },
}
