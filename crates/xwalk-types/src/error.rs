//! Errors raised while decoding or encoding wire messages.
//!
//! A [`ParseError`] is always scoped to a single message. Callers log it and
//! move on to the next message; it never terminates a receive loop.

/// A wire message could not be decoded or encoded.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The payload was not valid JSON, carried an unknown `type` tag, or
    /// its fields did not match the schema registered for that tag.
    #[error("malformed {registry} message: {source}")]
    Malformed {
        /// Which registry the payload was decoded against (`message` or `api`).
        registry: &'static str,
        /// The underlying decode error.
        source: serde_json::Error,
    },

    /// A value could not be serialized to its wire form.
    #[error("failed to encode {registry} message: {source}")]
    Encode {
        /// Which registry the value belongs to.
        registry: &'static str,
        /// The underlying encode error.
        source: serde_json::Error,
    },
}
