//! Error types for the animation library.
//!
//! [`ConfigError`] covers everything wrong with the animation configuration,
//! whether detected at load time or while selecting. [`AssetError`] covers a
//! missing or unreadable audio asset. [`LibraryError`] is what the public
//! selection and duration operations return.

use std::path::PathBuf;

/// The animation configuration is missing, malformed, or cannot satisfy a
/// selection.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read animation config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse animation config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but violates an invariant.
    #[error("invalid animation config: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// Every selection attempt failed and the fallback walk is not
    /// configured.
    #[error("walk selection failed after {attempts} attempts and fallback walk '{fallback}' is not configured")]
    SelectionExhausted {
        /// Attempts made before falling back.
        attempts: u32,
        /// The fallback walk name that was looked up.
        fallback: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// No usable audio file exists for an animation.
#[derive(Debug, thiserror::Error)]
#[error("no audio file found for '{name}' in {dir} (tried {tried})")]
pub struct AssetError {
    /// The resolved audio file stem.
    pub name: String,
    /// Directory that was searched.
    pub dir: String,
    /// Extensions that were tried, comma separated.
    pub tried: String,
}

/// Errors returned by [`crate::AnimationLibrary`] operations.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Audio asset problem.
    #[error(transparent)]
    Asset(#[from] AssetError),
}
