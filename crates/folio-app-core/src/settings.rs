// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer settings loaded once at startup (never written back).

use std::path::PathBuf;

use folio_core::device::DeviceProbe;
use folio_core::perf::PerfThresholds;
use serde::{Deserialize, Serialize};

/// Document key of the settings file (`viewer.json`).
pub const SETTINGS_KEY: &str = "viewer";

/// Background track looked up when the settings do not name one.
pub const DEFAULT_TRACK: &str = "music.mp3";

/// Startup settings for a viewer surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerSettings {
    /// Directory holding `about.json`, `experiences.json`, ...; `None` uses the
    /// bundled `content/` next to the executable or working directory.
    pub content_dir: Option<PathBuf>,
    /// Directory images, skyboxes and the model are resolved against.
    pub asset_dir: Option<PathBuf>,
    /// Model file inside the asset directory (`.json` or `.cbor` mesh);
    /// `None` builds the procedural street.
    pub model: Option<String>,
    /// Frame-rate monitor constants.
    pub perf: PerfThresholds,
    /// Pretend to be this device instead of probing (testing constrained mode).
    pub device: Option<DeviceProbe>,
    /// The host has a touch screen; with a narrow window this selects the
    /// constrained layout. Ignored when `device` is set.
    pub touch_screen: bool,
    /// Looping background track inside the asset directory; `None` or a
    /// missing file hides the music toggle.
    pub music: Option<String>,
    /// Start with the music playing.
    pub music_on: bool,
    /// Present in vsync mode.
    pub vsync: bool,
    /// Initial window size in logical pixels.
    pub window_size: [f32; 2],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            content_dir: None,
            asset_dir: None,
            model: None,
            perf: PerfThresholds::default(),
            device: None,
            touch_screen: false,
            music: Some(DEFAULT_TRACK.to_string()),
            music_on: false,
            vsync: true,
            window_size: [1280.0, 800.0],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let s: ViewerSettings = serde_json::from_str(
            r#"{"contentDir":"/srv/folio","perf":{"trigger":6},"device":{"touch":true,"viewportWidth":400}}"#,
        )
        .unwrap();
        assert_eq!(s.content_dir, Some(PathBuf::from("/srv/folio")));
        assert_eq!(s.perf.trigger, 6);
        assert_eq!(s.perf.window, 30);
        assert_eq!(s.perf.bands.len(), 3);
        assert!(s.vsync);
        assert_eq!(s.model, None);
        assert!(!s.touch_screen);
        assert_eq!(s.music.as_deref(), Some(DEFAULT_TRACK));
        assert!(!s.music_on);
        assert!(folio_core::is_constrained(&s.device.unwrap()));
    }

    #[test]
    fn music_can_be_switched_off() {
        let s: ViewerSettings =
            serde_json::from_str(r#"{"music":null,"touchScreen":true}"#).unwrap();
        assert_eq!(s.music, None);
        assert!(s.touch_screen);
    }
}
