// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! wasm-bindgen bindings for the Folio session.
//!
//! A browser page owns its own rendering (WebGL, DOM) and drives the
//! framework-free session through [`FolioWeb`]: it classifies the device,
//! navigates, ticks frames with `performance.now()` timestamps, edits the
//! render configuration and toggles the background track. Structured values
//! cross the boundary as JSON text.
#![deny(missing_docs)]

pub mod bridge;

use folio_app_core::audio::{AudioError, AudioPort, BackgroundMusic, MUSIC_VOLUME};
use folio_core::DeviceProbe;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

use crate::bridge::WebSession;

#[cfg(feature = "console-panic")]
#[wasm_bindgen(start)]
/// Initialize console panic hook for better error messages in browser.
pub fn init_console_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Environment facts read from the browser's `window` and `navigator`.
fn browser_probe() -> DeviceProbe {
    let Some(window) = web_sys::window() else {
        return DeviceProbe::default();
    };
    let navigator = window.navigator();
    let viewport_width = window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .map(|w| w as f32);
    DeviceProbe {
        user_agent: navigator.user_agent().ok(),
        touch: navigator.max_touch_points() > 0,
        viewport_width,
    }
}

/// Looping `<audio>` element for the background track.
struct WebTrack {
    element: HtmlAudioElement,
    on_reject: Closure<dyn FnMut(JsValue)>,
}

impl WebTrack {
    fn open(url: &str) -> Result<Self, AudioError> {
        let element = HtmlAudioElement::new_with_src(url).map_err(|err| AudioError::Track {
            track: url.to_string(),
            reason: format!("{err:?}"),
        })?;
        element.set_loop(true);
        element.set_volume(f64::from(MUSIC_VOLUME));
        let on_reject = Closure::wrap(Box::new(|err: JsValue| {
            debug!(?err, "background track did not play");
        }) as Box<dyn FnMut(JsValue)>);
        Ok(Self { element, on_reject })
    }
}

impl AudioPort for WebTrack {
    fn play(&mut self) -> Result<(), AudioError> {
        let started: js_sys::Promise = self
            .element
            .play()
            .map_err(|err| AudioError::Output(format!("{err:?}")))?;
        // a missing or undecodable file rejects here and stays silent
        let _ = started.catch(&self.on_reject);
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(err) = self.element.pause() {
            debug!(?err, "pause refused");
        }
    }
}

// ─── FolioWeb ────────────────────────────────────────────────────────────────

/// One viewer session inside a browser page.
///
/// Single-threaded; create one per page (or per worker).
#[wasm_bindgen]
pub struct FolioWeb {
    inner: WebSession,
    music: BackgroundMusic<WebTrack>,
}

impl Default for FolioWeb {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl FolioWeb {
    /// Session with default performance thresholds.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: WebSession::default(),
            music: BackgroundMusic::default(),
        }
    }

    /// Session with thresholds from a JSON object (`{"trigger":10,...}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe thresholds.
    #[wasm_bindgen(js_name = withThresholds)]
    pub fn with_thresholds(json: &str) -> Result<FolioWeb, JsError> {
        Ok(Self {
            inner: WebSession::from_thresholds_json(json)?,
            music: BackgroundMusic::default(),
        })
    }

    // ─── Device ──────────────────────────────────────────────────────────────

    /// Classify the browser; returns true for constrained devices.
    #[wasm_bindgen(js_name = detectDevice)]
    pub fn detect_device(&mut self) -> bool {
        self.inner.detect_device(&browser_probe())
    }

    /// Classify from an explicit probe (`{"userAgent":..,"touch":..,"viewportWidth":..}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a probe.
    #[wasm_bindgen(js_name = detectDeviceWith)]
    pub fn detect_device_with(&mut self, probe_json: &str) -> Result<bool, JsError> {
        let probe: DeviceProbe = serde_json::from_str(probe_json)?;
        Ok(self.inner.detect_device(&probe))
    }

    // ─── Navigation ──────────────────────────────────────────────────────────

    /// Navigate to page `index` (0 Home .. 4 Skills); returns view events as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    #[wasm_bindgen(js_name = changePage)]
    pub fn change_page(&mut self, index: usize, now_ms: f64) -> Result<String, JsError> {
        Ok(self.inner.change_page(index, now_ms)?)
    }

    /// Index of the current page.
    #[wasm_bindgen(js_name = currentPage)]
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.inner.current_page()
    }

    /// Mounted page and its transition values as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn view(&self, now_ms: f64) -> Result<String, JsError> {
        Ok(self.inner.view_json(now_ms)?)
    }

    // ─── Scene ───────────────────────────────────────────────────────────────

    /// Whether the page should build its 3D scene.
    #[wasm_bindgen(js_name = shouldMountScene)]
    #[must_use]
    pub fn should_mount_scene(&self) -> bool {
        self.inner.should_mount_scene()
    }

    /// Whether the home menu may be shown.
    #[wasm_bindgen(js_name = menuReady)]
    #[must_use]
    pub fn menu_ready(&self) -> bool {
        self.inner.menu_ready()
    }

    /// Report that the page's scene finished loading.
    #[wasm_bindgen(js_name = sceneReady)]
    pub fn scene_ready(&mut self) {
        self.inner.scene_ready();
    }

    /// Report that the page could not build its scene.
    #[wasm_bindgen(js_name = sceneUnavailable)]
    pub fn scene_unavailable(&mut self, reason: &str, now_ms: f64) {
        self.inner.scene_unavailable(reason, now_ms);
    }

    /// Run one frame; returns the frame report as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsError> {
        Ok(self.inner.frame(now_ms)?)
    }

    // ─── Render configuration ────────────────────────────────────────────────

    /// Current render configuration as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[wasm_bindgen(js_name = renderConfig)]
    pub fn render_config(&self) -> Result<String, JsError> {
        Ok(self.inner.render_config_json()?)
    }

    /// Apply `{"field":"sunElevation","value":40}`; returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed updates or unknown fields.
    #[wasm_bindgen(js_name = updateRender)]
    pub fn update_render(&mut self, update_json: &str) -> Result<bool, JsError> {
        Ok(self.inner.update_render_json(update_json)?)
    }

    // ─── Banners ─────────────────────────────────────────────────────────────

    /// Banners to draw at `now_ms`, as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn banners(&mut self, now_ms: f64) -> Result<String, JsError> {
        Ok(self.inner.banners_json(now_ms)?)
    }

    /// Dismiss a banner; false if it was already gone.
    #[wasm_bindgen(js_name = dismissBanner)]
    pub fn dismiss_banner(&mut self, id: u64) -> bool {
        self.inner.dismiss_banner(id)
    }

    // ─── Music ───────────────────────────────────────────────────────────────

    /// Load the looping background track from `url`; an empty URL removes it.
    /// The track starts paused.
    #[wasm_bindgen(js_name = setMusic)]
    pub fn set_music(&mut self, url: &str) {
        self.music.set_playing(false);
        let url = url.trim();
        let port = if url.is_empty() {
            None
        } else {
            match WebTrack::open(url) {
                Ok(track) => Some(track),
                Err(err) => {
                    debug!(%err, "background music disabled");
                    None
                }
            }
        };
        self.music = BackgroundMusic::new(port);
    }

    /// Whether a track is loaded and the toggle should be shown.
    #[wasm_bindgen(js_name = musicAvailable)]
    #[must_use]
    pub fn music_available(&self) -> bool {
        self.music.available()
    }

    /// Whether the track is playing.
    #[wasm_bindgen(js_name = musicPlaying)]
    #[must_use]
    pub fn music_playing(&self) -> bool {
        self.music.is_playing()
    }

    /// Play or pause the track; returns the new state. Call from a user
    /// gesture, browsers refuse autoplay otherwise.
    #[wasm_bindgen(js_name = toggleMusic)]
    pub fn toggle_music(&mut self) -> bool {
        self.music.toggle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_stays_hidden_until_a_track_is_set() {
        let mut web = FolioWeb::new();
        assert!(!web.music_available());
        assert!(!web.toggle_music());
        assert!(!web.music_playing());
        web.set_music("   ");
        assert!(!web.music_available());
    }
}
