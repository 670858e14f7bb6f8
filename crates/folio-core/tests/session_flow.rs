// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Session wiring: device gating, navigation, scene readiness and empty content.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use folio_core::content::ContentBundle;
use folio_core::nav::TRANSITION_PHASE;
use folio_core::perf::PerfThresholds;
use folio_core::scene::{NodeKind, NodeLoad, SceneFrame};
use folio_core::views::{ExperienceList, ProjectList, EXPERIENCE_EMPTY, PROJECTS_EMPTY};
use folio_core::{
    is_constrained, DeviceProbe, FolioSession, Page, RenderConfig, SceneBackend, SceneError,
    SceneHost, StoreChange,
};
use proptest::prelude::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn session() -> FolioSession {
    FolioSession::new(RenderConfig::default(), PerfThresholds::default(), Duration::ZERO)
}

/// Backend whose model loads after `model_delay` frames, or fails outright.
#[derive(Default)]
struct FakeBackend {
    model_delay: u32,
    model_fallback: bool,
    fail_compile: bool,
    disposed: Rc<RefCell<Vec<NodeKind>>>,
}

impl SceneBackend for FakeBackend {
    type Node = NodeKind;

    fn create(
        &mut self,
        kind: NodeKind,
        _: &RenderConfig,
    ) -> Result<NodeLoad<NodeKind>, SceneError> {
        if kind != NodeKind::Model {
            return Ok(NodeLoad::Ready(kind));
        }
        if self.model_delay > 0 {
            self.model_delay -= 1;
            return Ok(NodeLoad::Pending);
        }
        if self.model_fallback {
            return Ok(NodeLoad::Fallback {
                node: kind,
                reason: "model.glb: not found".into(),
            });
        }
        Ok(NodeLoad::Ready(kind))
    }

    fn sync(&mut self, _: NodeKind, _: &mut NodeKind, _: &RenderConfig, _: &SceneFrame) {}

    fn compile(&mut self) -> Result<(), SceneError> {
        if self.fail_compile {
            return Err(SceneError::Compile("no shader support".into()));
        }
        Ok(())
    }

    fn dispose(&mut self, kind: NodeKind, _: NodeKind) {
        self.disposed.borrow_mut().push(kind);
    }
}

#[test]
fn scene_ready_reveals_menu_exactly_once() {
    let mut s = session();
    s.detect_device(None);
    assert!(s.should_mount_scene());

    let mut host = SceneHost::new(FakeBackend {
        model_delay: 3,
        ..FakeBackend::default()
    });
    s.attach_scene(&mut host, ms(0)).unwrap();

    let mut fired = Vec::new();
    for f in 1..=20u64 {
        let report = s.frame(ms(f * 16), Some(&mut host));
        if report.ready_fired {
            fired.push(f);
        }
        if f < 3 {
            assert!(!s.menu_ready());
        }
    }
    assert_eq!(fired.len(), 1);
    assert!(s.menu_ready());
    assert!(host.is_ready());
}

#[test]
fn model_fallback_is_reported_and_scene_still_loads() {
    let mut s = session();
    let mut host = SceneHost::new(FakeBackend {
        model_delay: 1,
        model_fallback: true,
        ..FakeBackend::default()
    });
    assert!(s.attach_scene(&mut host, ms(0)).unwrap().is_empty());
    let report = s.frame(ms(16), Some(&mut host));
    assert_eq!(report.fallbacks.len(), 1);
    assert_eq!(report.fallbacks[0].kind, NodeKind::Model);
    assert!(host.node(NodeKind::Model).is_some());
}

#[test]
fn scene_failure_unmounts_and_reveals_ui() {
    let mut s = session();
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let mut host = SceneHost::new(FakeBackend {
        fail_compile: true,
        disposed: Rc::clone(&disposed),
        ..FakeBackend::default()
    });
    assert!(s.attach_scene(&mut host, ms(0)).is_err());
    assert!(!host.is_attached());
    assert_eq!(disposed.borrow().len(), NodeKind::ALL.len());
    assert_eq!(disposed.borrow().first(), Some(&NodeKind::Skybox));
    assert!(!s.should_mount_scene());
    assert!(s.menu_ready());
}

#[test]
fn dropping_a_mounted_host_disposes_everything() {
    let disposed = Rc::new(RefCell::new(Vec::new()));
    {
        let mut s = session();
        let mut host = SceneHost::new(FakeBackend {
            disposed: Rc::clone(&disposed),
            ..FakeBackend::default()
        });
        s.attach_scene(&mut host, ms(0)).unwrap();
    }
    assert_eq!(
        *disposed.borrow(),
        NodeKind::ALL.iter().rev().copied().collect::<Vec<_>>()
    );
}

#[test]
fn constrained_device_never_mounts() {
    let mut s = session();
    let probe = DeviceProbe {
        user_agent: None,
        touch: true,
        viewport_width: Some(390.0),
    };
    assert!(s.detect_device(Some(&probe)).is_mobile);
    let mut host = SceneHost::new(FakeBackend::default());
    s.attach_scene(&mut host, ms(0)).unwrap();
    assert!(!host.is_attached());
    let report = s.frame(ms(16), Some(&mut host));
    assert!(!report.ready_fired);
    assert!(s.menu_ready());
}

#[test]
fn page_changes_notify_subscribers_and_swap_views() {
    let mut s = session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    s.store_mut().subscribe(move |c| {
        if let StoreChange::Page(p) = c {
            sink.borrow_mut().push(p.to);
        }
    });

    s.change_page(4, ms(1000)).unwrap();
    s.change_page(1, ms(1100)).unwrap();
    assert_eq!(s.gate().mounted(), Page::Home);
    s.frame_headless(ms(1000) + TRANSITION_PHASE);
    assert_eq!(s.gate().mounted(), Page::About);
    assert_eq!(*seen.borrow(), vec![Page::Skills, Page::About]);
}

#[test]
fn empty_content_renders_placeholders() {
    let bundle = ContentBundle::from_raw(|_| None);
    let none = |_: &str| -> Option<String> { None };
    let experiences = ExperienceList::new(&bundle.experiences);
    let projects = ProjectList::new(&bundle.projects, &none);
    assert!(experiences.items.is_empty());
    assert_eq!(experiences.placeholder, Some(EXPERIENCE_EMPTY));
    assert!(projects.cards.is_empty());
    assert_eq!(projects.placeholder, Some(PROJECTS_EMPTY));
}

proptest! {
    #[test]
    fn navigation_is_total_over_indices(
        steps in prop::collection::vec((0usize..10, 0u64..900), 0..40),
    ) {
        let mut s = session();
        let mut now = 0u64;
        for (index, gap) in steps {
            now += gap;
            let before = s.store().page();
            let res = s.change_page(index, ms(now));
            if index < Page::ALL.len() {
                prop_assert!(res.is_ok());
                prop_assert_eq!(s.store().page().index(), index);
            } else {
                prop_assert!(res.is_err());
                prop_assert_eq!(s.store().page(), before);
            }
            s.frame_headless(ms(now));
        }
        // long enough for any pending exit/enter to finish
        s.frame_headless(ms(now + 2000));
        prop_assert_eq!(s.gate().mounted(), s.store().page());
    }

    #[test]
    fn mobile_keywords_match_in_any_case(
        prefix in "[a-z ]{0,12}",
        keyword in prop::sample::select(vec![
            "Android", "webOS", "iPhone", "iPad", "iPod", "BlackBerry", "IEMobile", "Opera Mini",
        ]),
        upper in any::<bool>(),
    ) {
        let kw = if upper { keyword.to_uppercase() } else { keyword.to_lowercase() };
        let probe = DeviceProbe {
            user_agent: Some(format!("{prefix}{kw}/1.0")),
            ..DeviceProbe::default()
        };
        prop_assert!(is_constrained(&probe));
    }

    #[test]
    fn wide_or_touchless_desktops_are_capable(width in 769.0f32..4000.0, touch in any::<bool>()) {
        let probe = DeviceProbe {
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0".into()),
            touch,
            viewport_width: Some(width),
        };
        prop_assert!(!is_constrained(&probe));
    }
}
