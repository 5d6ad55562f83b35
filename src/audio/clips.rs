//! Voice clip lookup.
//!
//! Clips are addressed by path relative to the configured sounds root.
//! Hazard title clips are numbered by catalog position; a handful of fixed
//! clips (announcement header, all-clear body, "multiple instances") live
//! at well-known positions past the end of the hazard catalog.

use crate::audio::buffer::AudioBuffer;
use crate::catalog;
use crate::error::{AlertError, Result};
use std::path::PathBuf;

/// Clip spoken after the alerts when an alert set has cleared.
pub const ALL_CLEAR_BODY: &str = "ALERTS/SWP_147.wav";

/// Announcement header clip ("the following alerts are in effect").
pub const ANNOUNCEMENT_HEADER: &str = "ALERTS/SWP_148.wav";

/// Clip announcing multiple distinct instances of one alert.
pub const MULTIPLE_INSTANCES: &str = "ALERTS/SWP_149.wav";

/// Relative path of the voice clip for a hazard title, or `None` when the
/// title is not in the catalog.
pub fn hazard_clip(title: &str) -> Option<String> {
    catalog::catalog_index(title).map(|i| format!("ALERTS/SWP_{}.wav", i + 1))
}

/// Relative path of an effect clip.
pub fn effect_clip(name: &str) -> String {
    format!("ALERTS/EFFECTS/{name}")
}

/// Source of audio clips by relative path. A missing clip is a recoverable
/// error the caller logs and skips.
pub trait ClipSource {
    /// Load a clip by path relative to the library root.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip does not exist or cannot be decoded.
    fn load(&self, relative: &str) -> Result<AudioBuffer>;
}

/// Filesystem clip library rooted at the configured sounds path.
pub struct SoundLibrary {
    root: PathBuf,
}

impl SoundLibrary {
    /// Create a library over the sounds root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClipSource for SoundLibrary {
    fn load(&self, relative: &str) -> Result<AudioBuffer> {
        let path = self.root.join(relative);
        AudioBuffer::from_wav_file(&path)
            .map_err(|e| AlertError::Clip(format!("clip {relative}: {e}")))
    }
}
