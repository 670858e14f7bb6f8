// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Effect runner for UiEffect -> session/clipboard.

use std::time::Duration;

use folio_core::FolioSession;
use tracing::warn;

use crate::ui_state::{UiEffect, UiEvent};

pub trait UiEffectsRunner {
    /// Run effects, possibly emitting follow-up events (e.g., the confirmed page).
    fn run(
        &mut self,
        effects: Vec<UiEffect>,
        session: &mut FolioSession,
        egui_ctx: &egui::Context,
        now: Duration,
    ) -> Vec<UiEvent>;
}

pub struct RealEffectsRunner;

impl UiEffectsRunner for RealEffectsRunner {
    fn run(
        &mut self,
        effects: Vec<UiEffect>,
        session: &mut FolioSession,
        egui_ctx: &egui::Context,
        now: Duration,
    ) -> Vec<UiEvent> {
        let mut followups = Vec::new();
        for eff in effects {
            match eff {
                UiEffect::ChangePage(index) => match session.change_page(index, now) {
                    Ok(_) => followups.push(UiEvent::PageChanged(session.store().page())),
                    Err(err) => warn!(%err, "navigation rejected"),
                },
                UiEffect::CopyToClipboard(text) => {
                    egui_ctx.copy_text(text);
                    followups.push(UiEvent::EmailCopied);
                }
                UiEffect::QuitApp => followups.push(UiEvent::ShutdownRequested),
            }
        }
        followups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui_state::{reduce, UiState};
    use folio_core::{Page, PerfThresholds, RenderConfig};

    /// Test fake: records effects and lets tests reject navigation.
    #[derive(Default)]
    struct FakeEffectsRunner {
        calls: Vec<UiEffect>,
        reject_navigation: bool,
    }

    impl UiEffectsRunner for FakeEffectsRunner {
        fn run(
            &mut self,
            effects: Vec<UiEffect>,
            _session: &mut FolioSession,
            _egui_ctx: &egui::Context,
            _now: Duration,
        ) -> Vec<UiEvent> {
            let mut followups = Vec::new();
            for eff in effects {
                match &eff {
                    UiEffect::ChangePage(index) if !self.reject_navigation => {
                        if let Some(page) = Page::from_index(*index) {
                            followups.push(UiEvent::PageChanged(page));
                        }
                    }
                    UiEffect::CopyToClipboard(_) => followups.push(UiEvent::EmailCopied),
                    UiEffect::QuitApp => followups.push(UiEvent::ShutdownRequested),
                    UiEffect::ChangePage(_) => {}
                }
                self.calls.push(eff);
            }
            followups
        }
    }

    fn session() -> FolioSession {
        FolioSession::new(
            RenderConfig::default(),
            PerfThresholds::default(),
            Duration::ZERO,
        )
    }

    /// Reduce, run, and feed follow-ups back in, the way the App does.
    fn drive(
        runner: &mut impl UiEffectsRunner,
        session: &mut FolioSession,
        ui: UiState,
        ev: UiEvent,
    ) -> UiState {
        let ctx = egui::Context::default();
        let mut pending = vec![ev];
        let mut ui = ui;
        while let Some(ev) = pending.pop() {
            let (next, fx) = reduce(&ui, ev);
            ui = next;
            pending.extend(runner.run(fx, session, &ctx, Duration::from_secs(1)));
        }
        ui
    }

    #[test]
    fn real_runner_moves_the_store_and_mirrors_the_page() {
        let mut s = session();
        let ui = drive(
            &mut RealEffectsRunner,
            &mut s,
            UiState::default(),
            UiEvent::Navigate(3),
        );
        assert_eq!(s.store().page(), Page::Projects);
        assert_eq!(ui.page, Page::Projects);
    }

    #[test]
    fn real_runner_leaves_state_alone_on_bad_index() {
        let mut s = session();
        let ui = drive(
            &mut RealEffectsRunner,
            &mut s,
            UiState::default(),
            UiEvent::Navigate(9),
        );
        assert_eq!(s.store().page(), Page::Home);
        assert_eq!(ui.page, Page::Home);
    }

    #[test]
    fn fake_records_calls_and_can_reject_navigation() {
        let mut s = session();
        let mut fake = FakeEffectsRunner {
            reject_navigation: true,
            ..FakeEffectsRunner::default()
        };
        let ui = drive(&mut fake, &mut s, UiState::default(), UiEvent::Navigate(2));
        assert_eq!(ui.page, Page::Home);
        assert_eq!(fake.calls, vec![UiEffect::ChangePage(2)]);

        fake.reject_navigation = false;
        let ui = drive(&mut fake, &mut s, ui, UiEvent::Navigate(2));
        assert_eq!(ui.page, Page::Experience);
        let _ = drive(&mut fake, &mut s, ui, UiEvent::ExitClicked);
        assert_eq!(fake.calls.last(), Some(&UiEffect::QuitApp));
    }
}
