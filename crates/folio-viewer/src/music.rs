// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Background track playback. Built with the `music` feature the track plays
//! through rodio; without it the toggle never appears.

use std::path::Path;

use folio_app_core::{
    audio::{locate_track, BackgroundMusic},
    settings::ViewerSettings,
};
use tracing::{info, warn};

#[cfg(feature = "music")]
pub use rodio_track::RodioTrack as Track;
#[cfg(not(feature = "music"))]
pub use silent::Silent as Track;

#[cfg(feature = "music")]
mod rodio_track {
    use std::{fs::File, io::BufReader, path::Path};

    use folio_app_core::audio::{AudioError, AudioPort, MUSIC_VOLUME};
    use rodio::{Decoder, OutputStream, Sink, Source};

    /// A paused, endlessly repeating track on the default output device.
    pub struct RodioTrack {
        _stream: OutputStream,
        sink: Sink,
    }

    impl RodioTrack {
        pub fn open(path: &Path) -> Result<Self, AudioError> {
            let track_err = |reason: String| AudioError::Track {
                track: path.display().to_string(),
                reason,
            };
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Output(e.to_string()))?;
            let sink = Sink::try_new(&handle).map_err(|e| AudioError::Output(e.to_string()))?;
            let file = File::open(path).map_err(|e| track_err(e.to_string()))?;
            let source = Decoder::new(BufReader::new(file)).map_err(|e| track_err(e.to_string()))?;
            sink.pause();
            sink.set_volume(MUSIC_VOLUME);
            sink.append(source.repeat_infinite());
            Ok(Self {
                _stream: stream,
                sink,
            })
        }
    }

    impl AudioPort for RodioTrack {
        fn play(&mut self) -> Result<(), AudioError> {
            self.sink.play();
            Ok(())
        }

        fn pause(&mut self) {
            self.sink.pause();
        }
    }
}

#[cfg(not(feature = "music"))]
mod silent {
    use std::{convert::Infallible, path::Path};

    use folio_app_core::audio::{AudioError, AudioPort};

    /// Stand-in for builds without an audio backend; never constructed.
    pub struct Silent(Infallible);

    impl Silent {
        pub fn open(path: &Path) -> Result<Self, AudioError> {
            Err(AudioError::Output(format!(
                "built without the `music` feature; {} not played",
                path.display()
            )))
        }
    }

    impl AudioPort for Silent {
        fn play(&mut self) -> Result<(), AudioError> {
            match self.0 {}
        }

        fn pause(&mut self) {
            match self.0 {}
        }
    }
}

/// Open the configured track under `asset_dir`; a missing file or an
/// unavailable output leaves the music switched off and hidden.
pub fn background_music(asset_dir: &Path, settings: &ViewerSettings) -> BackgroundMusic<Track> {
    let Some(path) = locate_track(asset_dir, settings.music.as_deref()) else {
        return BackgroundMusic::default();
    };
    let port = match Track::open(&path) {
        Ok(track) => {
            info!(path = %path.display(), "background track loaded");
            Some(track)
        }
        Err(err) => {
            warn!(%err, "background music disabled");
            None
        }
    };
    let mut music = BackgroundMusic::new(port);
    if settings.music_on {
        music.set_playing(true);
    }
    music
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_track_hides_the_toggle() {
        let settings = ViewerSettings {
            music: Some("no-such-track.mp3".into()),
            music_on: true,
            ..ViewerSettings::default()
        };
        let mut music = background_music(Path::new("/nonexistent"), &settings);
        assert!(!music.available());
        assert!(!music.toggle());

        let unset = ViewerSettings {
            music: None,
            ..ViewerSettings::default()
        };
        assert!(!background_music(Path::new("/nonexistent"), &unset).available());
    }
}
