// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Observable application store: navigation, render configuration and device capability.
//!
//! The store is an explicit value owned by the session and passed to whoever needs
//! it. Writes are last-writer-wins; listeners run synchronously after a write that
//! changed state and never for no-op writes.

use std::cell::OnceCell;
use std::fmt;

use crate::{
    device::DeviceCapability,
    nav::{NavChange, NavError, NavigationState, Page},
    render_config::{RenderConfig, RenderUpdate},
};

/// Handle returned by [`AppStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What changed in a store write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StoreChange {
    /// The active page changed.
    Page(NavChange),
    /// The render configuration changed; `revision` increases on every change.
    Render {
        /// New configuration revision.
        revision: u64,
    },
    /// Device capability was recorded (happens at most once).
    Device(DeviceCapability),
}

type Listener = Box<dyn FnMut(&StoreChange)>;

/// Shared mutable state for one session.
pub struct AppStore {
    nav: NavigationState,
    render: RenderConfig,
    render_revision: u64,
    device: OnceCell<DeviceCapability>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl fmt::Debug for AppStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppStore")
            .field("nav", &self.nav)
            .field("render_revision", &self.render_revision)
            .field("device", &self.device.get())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl AppStore {
    /// Store starting on the home page with the given render configuration.
    pub fn new(render: RenderConfig) -> Self {
        Self {
            nav: NavigationState::default(),
            render,
            render_revision: 0,
            device: OnceCell::new(),
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a listener; it sees every subsequent change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: &StoreChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }

    // ── navigation ─────────────────────────────────────────────────────

    /// Active page.
    pub fn page(&self) -> Page {
        self.nav.current()
    }

    /// Switch pages by index.
    pub fn change_page(&mut self, index: usize) -> Result<NavChange, NavError> {
        let change = self.nav.change_page(index)?;
        if change.changed() {
            self.notify(&StoreChange::Page(change));
        }
        Ok(change)
    }

    // ── render configuration ───────────────────────────────────────────

    /// Current render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Revision of the render configuration; bumps on every effective write.
    pub fn render_revision(&self) -> u64 {
        self.render_revision
    }

    /// Apply a single-field write. Returns whether anything changed.
    pub fn update_render(&mut self, update: RenderUpdate) -> bool {
        self.mutate_render(|cfg| cfg.apply(update))
    }

    /// Replace the whole configuration.
    pub fn replace_render(&mut self, cfg: RenderConfig) -> bool {
        self.mutate_render(|cur| *cur = cfg)
    }

    /// Run an arbitrary edit against a copy and commit it as one whole-object write.
    pub fn mutate_render(&mut self, edit: impl FnOnce(&mut RenderConfig)) -> bool {
        let mut next = self.render.clone();
        edit(&mut next);
        if next == self.render {
            return false;
        }
        self.render = next;
        self.render_revision += 1;
        let revision = self.render_revision;
        self.notify(&StoreChange::Render { revision });
        true
    }

    /// Flag the scene as loaded (or not).
    pub fn set_scene_loaded(&mut self, loaded: bool) -> bool {
        self.update_render(RenderUpdate::SceneLoaded(loaded))
    }

    // ── device ─────────────────────────────────────────────────────────

    /// Recorded capability, or the capable default if none was recorded yet.
    pub fn device(&self) -> DeviceCapability {
        self.device.get().copied().unwrap_or_default()
    }

    /// Whether a capability has been recorded.
    pub fn device_recorded(&self) -> bool {
        self.device.get().is_some()
    }

    /// Record the capability. Only the first call has any effect; the value that is
    /// in force afterwards is returned.
    pub fn record_device(&mut self, cap: DeviceCapability) -> DeviceCapability {
        if let Some(existing) = self.device.get() {
            return *existing;
        }
        let _ = self.device.set(cap);
        self.notify(&StoreChange::Device(cap));
        cap
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    fn recorder(store: &mut AppStore) -> (Rc<RefCell<Vec<StoreChange>>>, SubscriptionId) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = store.subscribe(move |c| sink.borrow_mut().push(*c));
        (log, id)
    }

    #[test]
    fn listeners_see_effective_writes_only() {
        let mut store = AppStore::default();
        let (log, _) = recorder(&mut store);

        store.change_page(2).unwrap();
        store.change_page(2).unwrap();
        assert!(store.update_render(RenderUpdate::FogEnabled(false)));
        assert!(!store.update_render(RenderUpdate::FogEnabled(false)));

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(matches!(log[0], StoreChange::Page(c) if c.to == Page::Experience));
        assert_eq!(log[1], StoreChange::Render { revision: 1 });
    }

    #[test]
    fn out_of_range_page_leaves_state_and_listeners_alone() {
        let mut store = AppStore::default();
        let (log, _) = recorder(&mut store);
        assert!(store.change_page(9).is_err());
        assert_eq!(store.page(), Page::Home);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn device_is_recorded_once() {
        let mut store = AppStore::default();
        assert!(!store.device().is_mobile);
        let first = store.record_device(DeviceCapability { is_mobile: true });
        let second = store.record_device(DeviceCapability { is_mobile: false });
        assert!(first.is_mobile && second.is_mobile);
        assert!(store.device().is_mobile);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = AppStore::default();
        let (log, id) = recorder(&mut store);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.change_page(1).unwrap();
        assert!(log.borrow().is_empty());
    }
}
