// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! folio-core: framework-free logic of the Folio portfolio viewer.
//!
//! Everything here is toolkit-agnostic and time-explicit: callers pass the current
//! time as a [`std::time::Duration`] since their session origin, which keeps the
//! crate usable from native front ends and from wasm alike.
//!
//! - [`device`] classifies the host once (constrained vs. capable).
//! - [`nav`] holds the active page and gates page views (exit before enter).
//! - [`render_config`] is the fully-populated renderer configuration.
//! - [`store`] is the observable, explicitly passed application store.
//! - [`scene`] owns the backdrop scene's nodes and readiness.
//! - [`perf`] and [`degrade`] implement adaptive render quality.
//! - [`ticker`] orders per-frame work; [`session`] wires it all together.
//! - [`content`] and [`views`] turn content documents into page view-models.

pub mod content;
pub mod degrade;
pub mod device;
pub mod nav;
pub mod perf;
pub mod render_config;
pub mod scene;
pub mod session;
pub mod store;
pub mod ticker;
pub mod views;

pub use degrade::{DegradationController, DegradationLevel, DegradeNotice};
pub use device::{is_constrained, DeviceCapability, DeviceProbe};
pub use nav::{NavError, Page, ViewEvent, ViewGate};
pub use perf::{PerfThresholds, PerformanceMonitor};
pub use render_config::{RenderConfig, RenderUpdate, Rgb};
pub use scene::{SceneBackend, SceneError, SceneHost};
pub use session::{FolioSession, FrameReport};
pub use store::{AppStore, StoreChange, SubscriptionId};
