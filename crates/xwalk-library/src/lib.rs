//! Animation catalogue and scene selection for the crosswalk controller.
//!
//! Owns the loaded animation configuration and decides which intro, walk,
//! and outro play next, and for how long.
//!
//! # Modules
//!
//! - [`audio`] -- [`AudioAssets`] trait and the on-disk [`SoundDirectory`].
//! - [`config`] -- YAML loading and load-time validation.
//! - [`error`] -- [`ConfigError`], [`AssetError`], and [`LibraryError`].
//! - [`history`] -- Bounded FIFO used for reselection cooldowns.
//! - [`library`] -- [`AnimationLibrary`] with weighted, cooldown-aware
//!   walk selection and memoised audio durations.

pub mod audio;
pub mod config;
pub mod error;
pub mod history;
pub mod library;

pub use audio::{AUDIO_EXTENSIONS, AudioAssets, SoundDirectory};
pub use error::{AssetError, ConfigError, LibraryError};
pub use history::History;
pub use library::{
    AnimationLibrary, DEFAULT_MAX_RETRIES, FALLBACK_WALK, SceneDurations, SceneSelection,
};
