//! Error types for the controller core.

use xwalk_library::LibraryError;

/// Errors raised while driving the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Scene selection or timing failed; the state machine did not move.
    #[error("scene selection failed: {source}")]
    Library {
        /// The underlying library error.
        #[from]
        source: LibraryError,
    },

    /// A queue request named a walk that is not in the catalogue.
    #[error("unknown walk '{walk}'")]
    UnknownWalk {
        /// The rejected walk name.
        walk: String,
    },
}
