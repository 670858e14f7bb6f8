// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plain-Rust session layer behind the bindings.
//!
//! Everything crossing the JS boundary is JSON text and millisecond timestamps,
//! so this layer is testable natively without a JS runtime.

use std::time::Duration;

use folio_app_core::banner::{BannerKind, BannerPhase, BannerQueue};
use folio_core::{
    DegradeNotice, DeviceProbe, FolioSession, NavError, Page, PerfThresholds, RenderUpdate,
    ViewEvent,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

const BANNER_CAPACITY: usize = 8;

/// Failures surfaced to the page as `Error` objects.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Navigation index out of range.
    #[error(transparent)]
    Nav(#[from] NavError),
    /// Malformed JSON argument (or, in theory, an unserializable result).
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// `performance.now()`-style milliseconds to a session timestamp. Negative and
/// non-finite inputs clamp to zero.
pub fn from_ms(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        Duration::from_secs_f64(now_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewEventJson {
    mounted: bool,
    page: Page,
}

impl From<ViewEvent> for ViewEventJson {
    fn from(ev: ViewEvent) -> Self {
        match ev {
            ViewEvent::Mount(page) => Self {
                mounted: true,
                page,
            },
            ViewEvent::Unmount(page) => Self {
                mounted: false,
                page,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameJson {
    frame: u64,
    dt_ms: f64,
    ready_fired: bool,
    tier: u8,
    menu_ready: bool,
    notice: Option<DegradeNotice>,
    view_events: Vec<ViewEventJson>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewJson {
    page: Page,
    index: usize,
    opacity: f32,
    offset_y: f32,
    scale: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BannerJson {
    id: u64,
    kind: &'static str,
    title: String,
    body: Option<String>,
    phase: &'static str,
    opacity: f32,
}

fn events_json(events: Vec<ViewEvent>) -> Vec<ViewEventJson> {
    events.into_iter().map(ViewEventJson::from).collect()
}

/// A session plus the banner queue a browser page renders.
#[derive(Debug)]
pub struct WebSession {
    session: FolioSession,
    banners: BannerQueue,
}

impl Default for WebSession {
    fn default() -> Self {
        Self::new(PerfThresholds::default())
    }
}

impl WebSession {
    /// Session with the given monitor constants; time starts at zero.
    pub fn new(thresholds: PerfThresholds) -> Self {
        Self {
            session: FolioSession::new(
                folio_core::RenderConfig::default(),
                thresholds,
                Duration::ZERO,
            ),
            banners: BannerQueue::new(BANNER_CAPACITY),
        }
    }

    /// Session configured from a `PerfThresholds` JSON object (partial objects
    /// keep the defaults for missing fields).
    pub fn from_thresholds_json(json: &str) -> Result<Self, BridgeError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Underlying session.
    pub fn session(&self) -> &FolioSession {
        &self.session
    }

    /// Classify the device once; returns whether it is constrained.
    pub fn detect_device(&mut self, probe: &DeviceProbe) -> bool {
        let cap = self.session.detect_device(Some(probe));
        info!(mobile = cap.is_mobile, "device classified");
        cap.is_mobile
    }

    /// Navigate; returns the JSON list of mount/unmount events.
    pub fn change_page(&mut self, index: usize, now_ms: f64) -> Result<String, BridgeError> {
        let events = self.session.change_page(index, from_ms(now_ms))?;
        Ok(serde_json::to_string(&events_json(events))?)
    }

    /// Index of the store's current page.
    pub fn current_page(&self) -> usize {
        self.session.store().page().index()
    }

    /// Mounted page view and its animation values.
    pub fn view_json(&self, now_ms: f64) -> Result<String, BridgeError> {
        let (page, v) = self.session.view(from_ms(now_ms));
        Ok(serde_json::to_string(&ViewJson {
            page,
            index: page.index(),
            opacity: v.opacity,
            offset_y: v.offset_y,
            scale: v.scale,
        })?)
    }

    /// Whether the page should build its 3D scene.
    pub fn should_mount_scene(&self) -> bool {
        self.session.should_mount_scene()
    }

    /// Whether the home menu may be shown.
    pub fn menu_ready(&self) -> bool {
        self.session.menu_ready()
    }

    /// The page's own scene finished loading.
    pub fn scene_ready(&mut self) {
        self.session.scene_ready();
    }

    /// The page could not build its scene; reveal the UI and say so.
    pub fn scene_unavailable(&mut self, reason: &str, now_ms: f64) {
        let first = self.session.should_mount_scene();
        self.session.scene_unavailable(reason);
        if first {
            self.banners.push(
                BannerKind::Error,
                "3D scene unavailable",
                reason.to_string(),
                from_ms(now_ms),
            );
        }
    }

    /// Run one frame at `now_ms` and report it as JSON. Degradation notices are
    /// also queued as banners.
    pub fn frame(&mut self, now_ms: f64) -> Result<String, BridgeError> {
        let now = from_ms(now_ms);
        let report = self.session.frame_headless(now);
        if let Some(notice) = &report.notice {
            self.banners.push_notice(notice, now);
        }
        Ok(serde_json::to_string(&FrameJson {
            frame: report.tick.frame,
            dt_ms: report.tick.dt.as_secs_f64() * 1000.0,
            ready_fired: report.ready_fired,
            tier: self.session.degradation_level().0,
            menu_ready: self.session.menu_ready(),
            notice: report.notice,
            view_events: events_json(report.view_events),
        })?)
    }

    /// Current render configuration (wire format, camelCase, `#rrggbb` colours).
    pub fn render_config_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self.session.render())?)
    }

    /// Apply one `{"field":..,"value":..}` write; true if the config changed.
    pub fn update_render_json(&mut self, json: &str) -> Result<bool, BridgeError> {
        let update: RenderUpdate = serde_json::from_str(json)?;
        Ok(self.session.update_render(update))
    }

    /// Visible banners at `now_ms`; expired ones are dropped first.
    pub fn banners_json(&mut self, now_ms: f64) -> Result<String, BridgeError> {
        let now = from_ms(now_ms);
        self.banners.retain_visible(now);
        let list: Vec<BannerJson> = self
            .banners
            .visible(now)
            .into_iter()
            .map(|b| BannerJson {
                id: b.id,
                kind: match b.kind {
                    BannerKind::Info => "info",
                    BannerKind::Warn => "warn",
                    BannerKind::Error => "error",
                },
                title: b.title,
                body: b.body,
                phase: match b.phase {
                    BannerPhase::Pending => "pending",
                    BannerPhase::Shown => "shown",
                    BannerPhase::Fading => "fading",
                },
                opacity: b.opacity,
            })
            .collect();
        Ok(serde_json::to_string(&list)?)
    }

    /// Dismiss banner `id`; false if it was already gone.
    pub fn dismiss_banner(&mut self, id: u64) -> bool {
        self.banners.dismiss(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn milliseconds_clamp_to_the_origin() {
        assert_eq!(from_ms(-5.0), Duration::ZERO);
        assert_eq!(from_ms(f64::NAN), Duration::ZERO);
        assert_eq!(from_ms(1500.0), Duration::from_millis(1500));
    }

    #[test]
    fn navigation_reports_gated_events() {
        let mut web = WebSession::default();
        let events = json(&web.change_page(3, 100.0).unwrap());
        assert_eq!(events, json(r#"[]"#));
        assert_eq!(web.current_page(), 3);

        // the home view leaves first; projects mounts after the exit phase
        let frame = json(&web.frame(600.0).unwrap());
        let events = frame["viewEvents"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], json(r#"{"mounted":false,"page":"Home"}"#));
        assert_eq!(events[1], json(r#"{"mounted":true,"page":"Projects"}"#));
        assert_eq!(json(&web.view_json(600.0).unwrap())["index"], 3);

        assert!(matches!(web.change_page(9, 700.0), Err(BridgeError::Nav(_))));
        assert_eq!(web.current_page(), 3);
    }

    #[test]
    fn constrained_devices_skip_the_scene_and_show_the_menu() {
        let mut web = WebSession::default();
        let probe = DeviceProbe {
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".into()),
            touch: true,
            viewport_width: Some(390.0),
        };
        assert!(web.detect_device(&probe));
        assert!(!web.should_mount_scene());
        assert!(web.menu_ready());
    }

    #[test]
    fn scene_lifecycle_from_the_page() {
        let mut web = WebSession::default();
        assert!(web.should_mount_scene());
        assert!(!web.menu_ready());
        web.scene_ready();
        assert!(web.menu_ready());

        let mut failed = WebSession::default();
        failed.scene_unavailable("webgl2 missing", 10.0);
        failed.scene_unavailable("webgl2 missing", 20.0);
        assert!(failed.menu_ready());
        assert!(!failed.should_mount_scene());
        let banners = json(&failed.banners_json(50.0).unwrap());
        let banners = banners.as_array().unwrap();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0]["kind"], "error");
        assert_eq!(banners[0]["body"], "webgl2 missing");

        let id = banners[0]["id"].as_u64().unwrap();
        assert!(failed.dismiss_banner(id));
        assert!(!failed.dismiss_banner(id));
    }

    #[test]
    fn render_updates_round_the_wire() {
        let mut web = WebSession::default();
        assert!(web
            .update_render_json(r#"{"field":"sunElevation","value":120}"#)
            .unwrap());
        let cfg = json(&web.render_config_json().unwrap());
        assert_eq!(cfg["sunElevation"], 90.0);
        assert!(matches!(
            web.update_render_json("{"),
            Err(BridgeError::Json(_))
        ));
    }

    #[test]
    fn thresholds_come_from_json() {
        let web = WebSession::from_thresholds_json(r#"{"trigger":3}"#).unwrap();
        assert_eq!(web.session().monitor().thresholds().trigger, 3);
        assert!(WebSession::from_thresholds_json(r#"{"trigger":"many"}"#).is_err());
    }
}
