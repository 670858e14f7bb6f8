// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One viewer session: store, view gate, performance monitor, degradation and ticker
//! wired together. Front ends own a session and call [`FolioSession::frame`] once per
//! rendered frame.

use std::convert::Infallible;
use std::time::Duration;

use tracing::{info, warn};

use crate::{
    degrade::{DegradationController, DegradationLevel, DegradeNotice},
    device::{DeviceCapability, DeviceProbe},
    nav::{NavError, Page, ViewEvent, ViewGate, ViewVisual},
    perf::{FrameVerdict, PerfThresholds, PerformanceMonitor},
    render_config::{RenderConfig, RenderUpdate},
    scene::{NodeKind, NodeLoad, SceneBackend, SceneError, SceneFallback, SceneFrame, SceneHost},
    store::AppStore,
    ticker::{FrameTick, TickStage, Ticker},
};

/// Everything a front end needs to react to after a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Timing of the frame.
    pub tick: FrameTick,
    /// The scene became ready on this frame.
    pub ready_fired: bool,
    /// A degradation step was taken on this frame.
    pub notice: Option<DegradeNotice>,
    /// Page views mounted/unmounted on this frame.
    pub view_events: Vec<ViewEvent>,
    /// Scene nodes that fell back to substitutes.
    pub fallbacks: Vec<SceneFallback>,
    /// The scene failed and was unmounted for the session.
    pub scene_error: Option<SceneError>,
}

/// Composition root of the framework-free logic.
#[derive(Debug)]
pub struct FolioSession {
    store: AppStore,
    gate: ViewGate,
    monitor: PerformanceMonitor,
    degrade: DegradationController,
    ticker: Ticker,
    scene_failed: bool,
}

impl FolioSession {
    /// Session starting on the home page at `now`.
    pub fn new(render: RenderConfig, thresholds: PerfThresholds, now: Duration) -> Self {
        let mut ticker = Ticker::default();
        ticker.register(TickStage::Scene);
        ticker.register(TickStage::Monitor);
        Self {
            store: AppStore::new(render),
            gate: ViewGate::new(Page::Home, now),
            monitor: PerformanceMonitor::new(thresholds),
            degrade: DegradationController::default(),
            ticker,
            scene_failed: false,
        }
    }

    /// Shared store.
    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// Shared store, for control-panel writes and subscriptions.
    pub fn store_mut(&mut self) -> &mut AppStore {
        &mut self.store
    }

    /// Current render configuration.
    pub fn render(&self) -> &RenderConfig {
        self.store.render()
    }

    /// Current degradation tier.
    pub fn degradation_level(&self) -> DegradationLevel {
        self.degrade.level()
    }

    /// Monitor state, for diagnostics overlays.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// View gate.
    pub fn gate(&self) -> &ViewGate {
        &self.gate
    }

    /// Mounted page view and its animation values at `now`.
    pub fn view(&self, now: Duration) -> (Page, ViewVisual) {
        (self.gate.mounted(), self.gate.visual(now))
    }

    /// Classify the environment once. Later calls return the first result.
    pub fn detect_device(&mut self, probe: Option<&DeviceProbe>) -> DeviceCapability {
        if self.store.device_recorded() {
            return self.store.device();
        }
        let cap = self.store.record_device(DeviceCapability::detect(probe));
        if cap.is_mobile {
            info!("constrained device; scene disabled and quality pinned");
            let degrade = &mut self.degrade;
            self.store.mutate_render(|cfg| {
                degrade.pin_to_max(cfg);
                cfg.scene_loaded = true;
            });
            self.ticker.unregister(TickStage::Scene);
            self.ticker.unregister(TickStage::Monitor);
        }
        cap
    }

    /// Whether the front end should mount a scene host.
    pub fn should_mount_scene(&self) -> bool {
        !self.store.device().is_mobile && !self.scene_failed
    }

    /// Whether the home menu may be shown.
    pub fn menu_ready(&self) -> bool {
        self.store.render().scene_loaded
    }

    /// Navigate to page `index`.
    pub fn change_page(&mut self, index: usize, now: Duration) -> Result<Vec<ViewEvent>, NavError> {
        let change = self.store.change_page(index)?;
        Ok(self.gate.request(change.to, now))
    }

    /// Apply a manual control-panel write.
    pub fn update_render(&mut self, update: RenderUpdate) -> bool {
        self.store.update_render(update)
    }

    /// The front end's own renderer finished loading (hosts without a [`SceneHost`]).
    pub fn scene_ready(&mut self) {
        self.store.set_scene_loaded(true);
    }

    /// Give up on the scene for the rest of the session and reveal the UI.
    pub fn scene_unavailable(&mut self, reason: &str) {
        if self.scene_failed {
            return;
        }
        warn!(%reason, "scene unavailable; continuing without backdrop");
        self.scene_failed = true;
        self.ticker.unregister(TickStage::Scene);
        self.ticker.unregister(TickStage::Monitor);
        self.store.set_scene_loaded(true);
    }

    /// Mount `host` for the session. Failure marks the scene unavailable.
    pub fn attach_scene<B: SceneBackend>(
        &mut self,
        host: &mut SceneHost<B>,
        now: Duration,
    ) -> Result<Vec<SceneFallback>, SceneError> {
        if !self.should_mount_scene() {
            return Ok(Vec::new());
        }
        match host.attach(now, self.store.render(), self.store.render_revision()) {
            Ok(tick) => Ok(tick.fallbacks),
            Err(err) => {
                self.scene_unavailable(&err.to_string());
                Err(err)
            }
        }
    }

    /// Run one frame without a scene host.
    pub fn frame_headless(&mut self, now: Duration) -> FrameReport {
        self.frame::<Headless>(now, None)
    }

    /// Run one frame: scene stage, then monitor stage, then view transitions.
    pub fn frame<B: SceneBackend>(
        &mut self,
        now: Duration,
        mut host: Option<&mut SceneHost<B>>,
    ) -> FrameReport {
        let tick = self.ticker.tick(now);
        let mut report = FrameReport {
            tick,
            ready_fired: false,
            notice: None,
            view_events: Vec::new(),
            fallbacks: Vec::new(),
            scene_error: None,
        };

        for stage in self.ticker.stages().to_vec() {
            match stage {
                TickStage::Scene => {
                    let Some(host) = host.as_deref_mut() else {
                        continue;
                    };
                    let revision = self.store.render_revision();
                    match host.tick(&tick, self.store.render(), revision) {
                        Ok(out) => {
                            report.fallbacks = out.fallbacks;
                            if out.ready_fired {
                                report.ready_fired = true;
                                self.store.set_scene_loaded(true);
                            }
                        }
                        Err(err) => {
                            self.scene_unavailable(&err.to_string());
                            report.scene_error = Some(err);
                        }
                    }
                }
                TickStage::Monitor => {
                    if !self.ticker.is_registered(TickStage::Monitor) {
                        continue;
                    }
                    let verdict = self.monitor.on_frame(
                        now,
                        self.degrade.level(),
                        DegradationController::MAX,
                    );
                    if let FrameVerdict::Degrade { .. } = verdict {
                        let degrade = &mut self.degrade;
                        let mut notice = None;
                        self.store.mutate_render(|cfg| notice = degrade.degrade(cfg));
                        report.notice = notice;
                    }
                }
            }
        }

        report.view_events = self.gate.advance(now);
        report
    }
}

/// Backend type for frames without a scene; never constructed.
enum Headless {}

impl SceneBackend for Headless {
    type Node = Infallible;

    fn create(
        &mut self,
        _: NodeKind,
        _: &RenderConfig,
    ) -> Result<NodeLoad<Infallible>, SceneError> {
        match *self {}
    }

    fn sync(&mut self, _: NodeKind, _: &mut Infallible, _: &RenderConfig, _: &SceneFrame) {
        match *self {}
    }

    fn compile(&mut self) -> Result<(), SceneError> {
        match *self {}
    }

    fn dispose(&mut self, _: NodeKind, _: Infallible) {
        match *self {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn constrained_device_pins_quality_and_skips_scene() {
        let mut s = FolioSession::new(RenderConfig::default(), PerfThresholds::default(), ms(0));
        let probe = DeviceProbe {
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".into()),
            ..DeviceProbe::default()
        };
        assert!(s.detect_device(Some(&probe)).is_mobile);
        assert!(!s.should_mount_scene());
        assert!(s.menu_ready());
        assert_eq!(s.degradation_level(), DegradationController::MAX);
        assert_eq!(s.render().water_reflection_size, 64);

        // a later, capable probe changes nothing
        assert!(s.detect_device(None).is_mobile);
    }

    #[test]
    fn scene_failure_reveals_menu() {
        let mut s = FolioSession::new(RenderConfig::default(), PerfThresholds::default(), ms(0));
        s.detect_device(None);
        assert!(s.should_mount_scene());
        assert!(!s.menu_ready());
        s.scene_unavailable("no adapter");
        assert!(!s.should_mount_scene());
        assert!(s.menu_ready());
    }

    #[test]
    fn page_change_runs_exit_before_enter() {
        let mut s = FolioSession::new(RenderConfig::default(), PerfThresholds::default(), ms(0));
        assert!(s.change_page(3, ms(500)).unwrap().is_empty());
        assert_eq!(s.gate().mounted(), Page::Home);
        let report = s.frame_headless(ms(900));
        assert_eq!(
            report.view_events,
            vec![ViewEvent::Unmount(Page::Home), ViewEvent::Mount(Page::Projects)]
        );
        assert!(s.change_page(7, ms(950)).is_err());
        assert_eq!(s.store().page(), Page::Projects);
    }
}
