// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Background music: one looping track behind an on/off toggle.
//!
//! Front ends supply an [`AudioPort`] (rodio natively, an `<audio>` element in
//! the browser). A track that cannot be found or opened leaves the toggle
//! hidden; nothing is reported to the user.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Playback volume for the background track.
pub const MUSIC_VOLUME: f32 = 0.5;

/// Failures while opening or starting the track.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device or the backend refused to start.
    #[error("audio output unavailable: {0}")]
    Output(String),
    /// The track could not be read or decoded.
    #[error("cannot play {track}: {reason}")]
    Track {
        /// Track path or URL.
        track: String,
        /// Backend message.
        reason: String,
    },
}

/// Playback backend for one looping track.
pub trait AudioPort {
    /// Start or resume playback.
    fn play(&mut self) -> Result<(), AudioError>;
    /// Pause; the next `play` resumes from here.
    fn pause(&mut self);
}

/// Finds `name` under `dir`; `None` when unset or the file is missing.
pub fn locate_track(dir: &Path, name: Option<&str>) -> Option<PathBuf> {
    let name = name.map(str::trim).filter(|n| !n.is_empty())?;
    let path = dir.join(name.trim_start_matches('/'));
    if path.is_file() {
        Some(path)
    } else {
        debug!(path = %path.display(), "background track not found");
        None
    }
}

/// Toggle state over an optional port.
#[derive(Debug)]
pub struct BackgroundMusic<P> {
    port: Option<P>,
    playing: bool,
}

impl<P> Default for BackgroundMusic<P> {
    fn default() -> Self {
        Self {
            port: None,
            playing: false,
        }
    }
}

impl<P: AudioPort> BackgroundMusic<P> {
    /// Paused music over `port`; `None` means there is nothing to play.
    pub fn new(port: Option<P>) -> Self {
        Self {
            port,
            playing: false,
        }
    }

    /// Whether a track is loaded and the toggle should be offered.
    pub fn available(&self) -> bool {
        self.port.is_some()
    }

    /// Whether the track is playing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Flip playback; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.set_playing(!self.playing)
    }

    /// Start or pause. A port that fails to start keeps the music off.
    pub fn set_playing(&mut self, on: bool) -> bool {
        let Some(port) = self.port.as_mut() else {
            return false;
        };
        if on == self.playing {
            return self.playing;
        }
        if on {
            match port.play() {
                Ok(()) => self.playing = true,
                Err(err) => warn!(%err, "background music did not start"),
            }
        } else {
            port.pause();
            self.playing = false;
        }
        self.playing
    }
}
