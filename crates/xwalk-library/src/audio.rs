//! Audio asset lookup for scene durations.
//!
//! Every animation has an audio track, and the track's length is the
//! animation's length. [`AudioAssets`] resolves an audio file stem to a
//! duration in seconds; [`SoundDirectory`] does so by looking for
//! `<stem>.mp3`, `<stem>.m4a`, then `<stem>.wav` in a directory and reading
//! the file's properties.

use std::path::PathBuf;

use lofty::file::AudioFile;
use tracing::{debug, warn};

use crate::error::AssetError;

/// Audio container extensions tried, in order.
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];

/// A source of audio durations.
pub trait AudioAssets: Send {
    /// Duration in seconds of the audio file with stem `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if no readable file exists for `name`.
    fn duration(&self, name: &str) -> Result<f64, AssetError>;
}

/// Audio files stored flat in a directory.
#[derive(Debug, Clone)]
pub struct SoundDirectory {
    root: PathBuf,
}

impl SoundDirectory {
    /// Look for audio files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AudioAssets for SoundDirectory {
    fn duration(&self, name: &str) -> Result<f64, AssetError> {
        for ext in AUDIO_EXTENSIONS {
            let path = self.root.join(format!("{name}.{ext}"));
            if !path.exists() {
                continue;
            }
            match lofty::read_from_path(&path) {
                Ok(tagged) => {
                    let seconds = tagged.properties().duration().as_secs_f64();
                    debug!(path = %path.display(), seconds, "read audio duration");
                    return Ok(seconds);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "could not read audio file, trying next extension"
                    );
                }
            }
        }
        Err(AssetError {
            name: name.to_owned(),
            dir: self.root.display().to_string(),
            tried: AUDIO_EXTENSIONS.join(", "),
        })
    }
}
