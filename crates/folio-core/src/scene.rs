// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph host: node lifecycle, readiness latch and per-frame animation.
//!
//! The host owns every node a backend creates and is the only thing that disposes
//! them. Backends stay dumb: they build GPU (or fake) resources for a [`NodeKind`],
//! report loads that have not finished yet as [`NodeLoad::Pending`], and apply the
//! derived per-frame quantities the host hands them. No time ownership in the
//! backend; all timing comes from the ticker.

use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::render_config::RenderConfig;
use crate::ticker::FrameTick;

/// Distance of the sun from the origin.
pub const SUN_RADIUS: f32 = 100.0;
/// Delay between the scene compiling and the ready notification.
pub const READY_SETTLE: Duration = Duration::from_millis(100);
/// Water shader time advances at this fraction of wall time.
pub const WATER_TIME_SCALE: f32 = 0.5;

/// Position of the sun for an azimuth/elevation pair (degrees) at `radius`.
///
/// Elevation 0 sits on the horizon, 90 straight overhead; azimuth rotates about +Y.
pub fn sun_position(azimuth_deg: f32, elevation_deg: f32, radius: f32) -> Vec3 {
    let phi = elevation_deg.to_radians();
    let theta = azimuth_deg.to_radians();
    Vec3::new(
        radius * phi.cos() * theta.cos(),
        radius * phi.sin(),
        radius * phi.cos() * theta.sin(),
    )
}

/// Nodes of the backdrop scene, in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Perspective camera orbiting the model.
    Camera,
    /// Uniform ambient term.
    AmbientLight,
    /// Directional, shadow-casting sun.
    SunLight,
    /// The centrepiece model.
    Model,
    /// Reflective water plane.
    Water,
    /// Environment background.
    Skybox,
}

impl NodeKind {
    /// Creation order; disposal runs in reverse.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Camera,
        NodeKind::AmbientLight,
        NodeKind::SunLight,
        NodeKind::Model,
        NodeKind::Water,
        NodeKind::Skybox,
    ];
}

/// Errors that make the scene unusable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The platform cannot run the scene (no adapter, missing features, ...).
    #[error("scene unsupported: {0}")]
    Unsupported(String),
    /// A node could not be created and has no fallback.
    #[error("failed to create {kind:?}: {reason}")]
    Node {
        /// Node that failed.
        kind: NodeKind,
        /// Backend description of the failure.
        reason: String,
    },
    /// Shader/pipeline compilation failed.
    #[error("scene compile failed: {0}")]
    Compile(String),
}

/// Outcome of asking a backend for a node.
#[derive(Debug)]
pub enum NodeLoad<N> {
    /// The node exists and can be rendered.
    Ready(N),
    /// The node's assets are still loading; ask again next frame.
    Pending,
    /// The real asset failed; a substitute was built instead.
    Fallback {
        /// Substitute node.
        node: N,
        /// Why the real asset was not used.
        reason: String,
    },
}

/// Per-frame quantities derived by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneFrame {
    /// Frame delta in seconds.
    pub dt: f32,
    /// Accumulated water animation time.
    pub water_time: f32,
    /// Camera orbit angle in radians, `[0, 2π)`.
    pub orbit_angle: f32,
    /// Sun position derived from azimuth/elevation.
    pub sun_position: Vec3,
}

/// Renderer side of the scene host.
pub trait SceneBackend {
    /// Backend resource handle for one node.
    type Node;

    /// Build the node for `kind`.
    fn create(
        &mut self,
        kind: NodeKind,
        cfg: &RenderConfig,
    ) -> Result<NodeLoad<Self::Node>, SceneError>;

    /// Re-apply configuration after it changed.
    fn sync(
        &mut self,
        kind: NodeKind,
        node: &mut Self::Node,
        cfg: &RenderConfig,
        frame: &SceneFrame,
    );

    /// Per-frame animation hook.
    fn animate(&mut self, _kind: NodeKind, _node: &mut Self::Node, _frame: &SceneFrame) {}

    /// Prepare pipelines once every node exists.
    fn compile(&mut self) -> Result<(), SceneError>;

    /// Release a node. Called exactly once per created node.
    fn dispose(&mut self, kind: NodeKind, node: Self::Node);
}

/// A node that was substituted during loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneFallback {
    /// Node that fell back.
    pub kind: NodeKind,
    /// Why.
    pub reason: String,
}

/// What a host tick produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneTick {
    /// The ready latch fired on this frame.
    pub ready_fired: bool,
    /// Nodes that fell back on this frame.
    pub fallbacks: Vec<SceneFallback>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Readiness {
    Detached,
    Loading,
    Settling { since: Duration },
    Ready,
}

/// Owns the backdrop scene for the lifetime of a mount.
pub struct SceneHost<B: SceneBackend> {
    backend: B,
    nodes: Vec<(NodeKind, B::Node)>,
    pending: Vec<NodeKind>,
    readiness: Readiness,
    settle: Duration,
    water_time: f32,
    orbit_angle: f32,
    synced_revision: Option<u64>,
}

impl<B: SceneBackend> std::fmt::Debug for SceneHost<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHost")
            .field("nodes", &self.nodes.iter().map(|(k, _)| *k).collect::<Vec<_>>())
            .field("pending", &self.pending)
            .field("readiness", &self.readiness)
            .field("water_time", &self.water_time)
            .field("orbit_angle", &self.orbit_angle)
            .finish_non_exhaustive()
    }
}

impl<B: SceneBackend> SceneHost<B> {
    /// Detached host around `backend`.
    pub fn new(backend: B) -> Self {
        Self::with_settle(backend, READY_SETTLE)
    }

    /// Detached host with a custom ready delay.
    pub fn with_settle(backend: B, settle: Duration) -> Self {
        Self {
            backend,
            nodes: Vec::new(),
            pending: Vec::new(),
            readiness: Readiness::Detached,
            settle,
            water_time: 0.0,
            orbit_angle: 0.0,
            synced_revision: None,
        }
    }

    /// Backend access for rendering.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access (resize, surface changes).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether the host currently holds a mounted scene.
    pub fn is_attached(&self) -> bool {
        self.readiness != Readiness::Detached
    }

    /// Some node is still waiting on its assets.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The ready latch has fired for the current mount.
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Node handle for `kind`, once created.
    pub fn node(&self, kind: NodeKind) -> Option<&B::Node> {
        self.nodes.iter().find(|(k, _)| *k == kind).map(|(_, n)| n)
    }

    /// Created nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKind, &B::Node)> {
        self.nodes.iter().map(|(k, n)| (*k, n))
    }

    /// Accumulated water time.
    pub fn water_time(&self) -> f32 {
        self.water_time
    }

    /// Current orbit angle in radians.
    pub fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    /// Create every node. On error everything created so far is disposed and the
    /// host stays detached.
    pub fn attach(
        &mut self,
        now: Duration,
        cfg: &RenderConfig,
        revision: u64,
    ) -> Result<SceneTick, SceneError> {
        if self.is_attached() {
            return Ok(SceneTick::default());
        }
        self.readiness = Readiness::Loading;
        self.water_time = 0.0;
        self.orbit_angle = 0.0;
        self.synced_revision = Some(revision);

        let mut tick = SceneTick::default();
        for kind in NodeKind::ALL {
            if let Err(err) = self.create(kind, cfg, &mut tick) {
                self.detach();
                return Err(err);
            }
        }
        info!(pending = self.pending.len(), "scene attached");
        if let Err(err) = self.settle_if_loaded(now) {
            self.detach();
            return Err(err);
        }
        Ok(tick)
    }

    /// Dispose every node in reverse creation order and cancel the ready latch.
    pub fn detach(&mut self) {
        if !self.is_attached() {
            return;
        }
        while let Some((kind, node)) = self.nodes.pop() {
            self.backend.dispose(kind, node);
        }
        self.pending.clear();
        self.readiness = Readiness::Detached;
        self.synced_revision = None;
        debug!("scene detached");
    }

    /// Advance one frame. A node failure detaches the host and is returned.
    pub fn tick(
        &mut self,
        frame: &FrameTick,
        cfg: &RenderConfig,
        revision: u64,
    ) -> Result<SceneTick, SceneError> {
        let mut out = SceneTick::default();
        if !self.is_attached() {
            return Ok(out);
        }

        for kind in std::mem::take(&mut self.pending) {
            if let Err(err) = self.create(kind, cfg, &mut out) {
                self.detach();
                return Err(err);
            }
        }
        if let Err(err) = self.settle_if_loaded(frame.now) {
            self.detach();
            return Err(err);
        }

        let dt = frame.dt.as_secs_f32();
        self.water_time += dt * WATER_TIME_SCALE;
        if cfg.auto_rotate {
            self.orbit_angle =
                (self.orbit_angle + TAU / 60.0 * cfg.auto_rotate_speed * dt).rem_euclid(TAU);
        }
        let derived = SceneFrame {
            dt,
            water_time: self.water_time,
            orbit_angle: self.orbit_angle,
            sun_position: sun_position(cfg.sun_azimuth, cfg.sun_elevation, SUN_RADIUS),
        };

        let resync = self.synced_revision != Some(revision);
        self.synced_revision = Some(revision);
        for (kind, node) in &mut self.nodes {
            if resync {
                self.backend.sync(*kind, node, cfg, &derived);
            }
            self.backend.animate(*kind, node, &derived);
        }

        if let Readiness::Settling { since } = self.readiness {
            if frame.now.saturating_sub(since) >= self.settle {
                self.readiness = Readiness::Ready;
                out.ready_fired = true;
                info!("scene ready");
            }
        }
        Ok(out)
    }

    fn create(
        &mut self,
        kind: NodeKind,
        cfg: &RenderConfig,
        tick: &mut SceneTick,
    ) -> Result<(), SceneError> {
        match self.backend.create(kind, cfg)? {
            NodeLoad::Ready(node) => self.nodes.push((kind, node)),
            NodeLoad::Pending => self.pending.push(kind),
            NodeLoad::Fallback { node, reason } => {
                warn!(?kind, %reason, "using fallback scene node");
                self.nodes.push((kind, node));
                tick.fallbacks.push(SceneFallback { kind, reason });
            }
        }
        Ok(())
    }

    fn settle_if_loaded(&mut self, now: Duration) -> Result<(), SceneError> {
        if self.readiness == Readiness::Loading && self.pending.is_empty() {
            // late loads are appended; restore canonical order for disposal
            self.nodes
                .sort_by_key(|(k, _)| NodeKind::ALL.iter().position(|a| a == k));
            self.backend.compile()?;
            self.readiness = Readiness::Settling { since: now };
            debug!("scene compiled; settling");
        }
        Ok(())
    }
}

impl<B: SceneBackend> Drop for SceneHost<B> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Fake {
        pending_model: u32,
        log: Vec<String>,
    }

    impl SceneBackend for Fake {
        type Node = NodeKind;

        fn create(
            &mut self,
            kind: NodeKind,
            _cfg: &RenderConfig,
        ) -> Result<NodeLoad<NodeKind>, SceneError> {
            if kind == NodeKind::Model && self.pending_model > 0 {
                self.pending_model -= 1;
                return Ok(NodeLoad::Pending);
            }
            Ok(NodeLoad::Ready(kind))
        }

        fn sync(&mut self, kind: NodeKind, _: &mut NodeKind, _: &RenderConfig, _: &SceneFrame) {
            self.log.push(format!("sync {kind:?}"));
        }

        fn compile(&mut self) -> Result<(), SceneError> {
            self.log.push("compile".into());
            Ok(())
        }

        fn dispose(&mut self, kind: NodeKind, _: NodeKind) {
            self.log.push(format!("dispose {kind:?}"));
        }
    }

    fn at(ms: u64, dt: u64) -> FrameTick {
        FrameTick {
            now: Duration::from_millis(ms),
            dt: Duration::from_millis(dt),
            frame: 1,
        }
    }

    #[test]
    fn sun_sits_on_the_sphere() {
        let p = sun_position(45.0, 63.0, SUN_RADIUS);
        assert_relative_eq!(p.length(), SUN_RADIUS, epsilon = 1e-3);
        let overhead = sun_position(0.0, 90.0, 10.0);
        assert_relative_eq!(overhead.y, 10.0, epsilon = 1e-5);
        assert_relative_eq!(overhead.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn pending_model_delays_compile_and_ready() {
        let mut host = SceneHost::new(Fake {
            pending_model: 2,
            ..Fake::default()
        });
        let cfg = RenderConfig::default();
        host.attach(Duration::ZERO, &cfg, 0).unwrap();
        assert!(host.is_loading());
        assert!(host.node(NodeKind::Model).is_none());

        assert!(!host.tick(&at(16, 16), &cfg, 0).unwrap().ready_fired);
        assert!(!host.tick(&at(32, 16), &cfg, 0).unwrap().ready_fired);
        assert!(!host.is_loading());
        assert_eq!(host.backend().log.iter().filter(|l| *l == "compile").count(), 1);

        assert!(!host.tick(&at(100, 16), &cfg, 0).unwrap().ready_fired);
        assert!(host.tick(&at(132, 16), &cfg, 0).unwrap().ready_fired);
        assert!(!host.tick(&at(150, 16), &cfg, 0).unwrap().ready_fired);
        assert!(host.is_ready());
    }

    #[test]
    fn detach_disposes_in_reverse_creation_order() {
        let mut host = SceneHost::new(Fake {
            pending_model: 1,
            ..Fake::default()
        });
        let cfg = RenderConfig::default();
        host.attach(Duration::ZERO, &cfg, 0).unwrap();
        host.tick(&at(16, 16), &cfg, 0).unwrap();
        host.detach();
        let disposed: Vec<_> = host
            .backend()
            .log
            .iter()
            .filter_map(|l| l.strip_prefix("dispose "))
            .map(str::to_string)
            .collect();
        assert_eq!(
            disposed,
            ["Skybox", "Water", "Model", "SunLight", "AmbientLight", "Camera"]
        );
        assert!(!host.is_attached());
    }

    #[test]
    fn detach_cancels_ready_latch() {
        let mut host = SceneHost::new(Fake::default());
        let cfg = RenderConfig::default();
        host.attach(Duration::ZERO, &cfg, 0).unwrap();
        host.detach();
        assert!(!host.tick(&at(500, 16), &cfg, 0).unwrap().ready_fired);
    }

    #[test]
    fn animation_follows_config() {
        let mut host = SceneHost::new(Fake::default());
        let mut cfg = RenderConfig::default();
        host.attach(Duration::ZERO, &cfg, 0).unwrap();
        host.tick(&at(1000, 1000), &cfg, 0).unwrap();
        assert_relative_eq!(host.water_time(), 0.5);
        assert_relative_eq!(host.orbit_angle(), TAU / 60.0, epsilon = 1e-6);

        cfg.auto_rotate = false;
        host.tick(&at(2000, 1000), &cfg, 1).unwrap();
        assert_relative_eq!(host.water_time(), 1.0);
        assert_relative_eq!(host.orbit_angle(), TAU / 60.0, epsilon = 1e-6);
        let syncs = host.backend().log.iter().filter(|l| l.starts_with("sync")).count();
        assert_eq!(syncs, NodeKind::ALL.len());
    }
}
