// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure state transitions for the viewer UI (page mirror, overlays, project detail).

use folio_core::Page;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    Controls,
}

/// Presentation-only UI state. The authoritative page lives in the store; `page`
/// mirrors it after every successful change so the reducer can decide what
/// Back and Escape mean.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub page: Page,
    pub overlay: Overlay,
    /// Index into the project list of the open detail view.
    pub open_project: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Navigate(usize),
    Back,
    Escape,
    ToggleControls,
    ToggleMusic,
    CloseOverlay,
    OpenProject(usize),
    CloseProject,
    CopyEmail(String),
    EmailCopied,
    PageChanged(Page),
    ExitClicked,
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    ChangePage(usize),
    CopyToClipboard(String),
    QuitApp,
}

pub fn reduce(ui: &UiState, ev: UiEvent) -> (UiState, Vec<UiEffect>) {
    let mut next = ui.clone();
    let mut fx = Vec::new();
    match ev {
        UiEvent::Navigate(index) => {
            next.open_project = None;
            fx.push(UiEffect::ChangePage(index));
        }
        UiEvent::Back => back(&mut next, &mut fx),
        UiEvent::Escape => {
            if next.overlay == Overlay::None {
                back(&mut next, &mut fx);
            } else {
                next.overlay = Overlay::None;
            }
        }
        UiEvent::ToggleControls => {
            next.overlay = match next.overlay {
                Overlay::None => Overlay::Controls,
                Overlay::Controls => Overlay::None,
            };
        }
        UiEvent::CloseOverlay => next.overlay = Overlay::None,
        UiEvent::OpenProject(index) => {
            if next.page == Page::Projects {
                next.open_project = Some(index);
            }
        }
        UiEvent::CloseProject => next.open_project = None,
        UiEvent::CopyEmail(email) => {
            if !email.trim().is_empty() {
                fx.push(UiEffect::CopyToClipboard(email));
            }
        }
        UiEvent::PageChanged(page) => {
            next.page = page;
            if page != Page::Projects {
                next.open_project = None;
            }
        }
        UiEvent::ExitClicked => fx.push(UiEffect::QuitApp),
        // handled by App
        UiEvent::EmailCopied | UiEvent::ShutdownRequested | UiEvent::ToggleMusic => {}
    }
    (next, fx)
}

/// Close the project detail if one is open, otherwise return to the home page.
fn back(next: &mut UiState, fx: &mut Vec<UiEffect>) {
    if next.open_project.take().is_none() && next.page != Page::Home {
        fx.push(UiEffect::ChangePage(Page::Home.index()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(page: Page) -> UiState {
        UiState {
            page,
            ..UiState::default()
        }
    }

    #[test]
    fn navigate_requests_page_change_and_closes_detail() {
        let ui = UiState {
            open_project: Some(2),
            ..on(Page::Projects)
        };
        let (next, fx) = reduce(&ui, UiEvent::Navigate(4));
        assert_eq!(next.open_project, None);
        assert_eq!(fx, vec![UiEffect::ChangePage(4)]);
        // the mirror only moves once the store confirms
        assert_eq!(next.page, Page::Projects);
    }

    #[test]
    fn escape_closes_overlay_then_detail_then_goes_home() {
        let ui = UiState {
            overlay: Overlay::Controls,
            open_project: Some(0),
            ..on(Page::Projects)
        };
        let (ui, fx) = reduce(&ui, UiEvent::Escape);
        assert_eq!(ui.overlay, Overlay::None);
        assert_eq!(ui.open_project, Some(0));
        assert!(fx.is_empty());

        let (ui, fx) = reduce(&ui, UiEvent::Escape);
        assert_eq!(ui.open_project, None);
        assert!(fx.is_empty());

        let (_, fx) = reduce(&ui, UiEvent::Escape);
        assert_eq!(fx, vec![UiEffect::ChangePage(0)]);
    }

    #[test]
    fn escape_on_home_does_nothing() {
        let (ui, fx) = reduce(&UiState::default(), UiEvent::Escape);
        assert_eq!(ui, UiState::default());
        assert!(fx.is_empty());
    }

    #[test]
    fn back_ignores_the_overlay() {
        let ui = UiState {
            overlay: Overlay::Controls,
            ..on(Page::Skills)
        };
        let (next, fx) = reduce(&ui, UiEvent::Back);
        assert_eq!(next.overlay, Overlay::Controls);
        assert_eq!(fx, vec![UiEffect::ChangePage(0)]);
    }

    #[test]
    fn controls_toggle() {
        let (ui, _) = reduce(&UiState::default(), UiEvent::ToggleControls);
        assert_eq!(ui.overlay, Overlay::Controls);
        let (ui, _) = reduce(&ui, UiEvent::ToggleControls);
        assert_eq!(ui.overlay, Overlay::None);
        let (ui, _) = reduce(&ui, UiEvent::ToggleControls);
        let (ui, _) = reduce(&ui, UiEvent::CloseOverlay);
        assert_eq!(ui.overlay, Overlay::None);
    }

    #[test]
    fn projects_open_only_on_the_projects_page() {
        let (ui, _) = reduce(&on(Page::About), UiEvent::OpenProject(1));
        assert_eq!(ui.open_project, None);
        let (ui, _) = reduce(&on(Page::Projects), UiEvent::OpenProject(1));
        assert_eq!(ui.open_project, Some(1));
        let (ui, _) = reduce(&ui, UiEvent::PageChanged(Page::Skills));
        assert_eq!(ui.page, Page::Skills);
        assert_eq!(ui.open_project, None);
    }

    #[test]
    fn copy_email_skips_blank_addresses() {
        let (_, fx) = reduce(&on(Page::About), UiEvent::CopyEmail("  ".into()));
        assert!(fx.is_empty());
        let (_, fx) = reduce(&on(Page::About), UiEvent::CopyEmail("me@example.com".into()));
        assert_eq!(fx, vec![UiEffect::CopyToClipboard("me@example.com".into())]);
    }

    #[test]
    fn exit_produces_quit_effect() {
        let (_, fx) = reduce(&UiState::default(), UiEvent::ExitClicked);
        assert_eq!(fx, vec![UiEffect::QuitApp]);
    }

    #[test]
    fn music_toggle_leaves_pages_alone() {
        let ui = on(Page::Skills);
        let (next, fx) = reduce(&ui, UiEvent::ToggleMusic);
        assert_eq!(next, ui);
        assert!(fx.is_empty());
    }
}
