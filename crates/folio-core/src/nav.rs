// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Page navigation state and the view gate that decides which page view is mounted.
//!
//! Navigation itself is a single value replaced by [`NavigationState::change_page`].
//! The [`ViewGate`] follows that value with an exit-before-enter animation: the
//! mounted page leaves, is unmounted, and only then is the target mounted. At no
//! point are two page views mounted at once.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of each half (leave, enter) of a page transition.
pub const TRANSITION_PHASE: Duration = Duration::from_millis(400);

/// The pages of the portfolio, in navigation-index order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    /// Title screen with the game-style menu.
    #[default]
    Home,
    /// Profile, contact details and stats.
    About,
    /// Work history.
    Experience,
    /// Project cards and details.
    Projects,
    /// Skill tree.
    Skills,
}

impl Page {
    /// Every page, ordered by index.
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::About,
        Page::Experience,
        Page::Projects,
        Page::Skills,
    ];

    /// Navigation index of this page.
    pub fn index(self) -> usize {
        match self {
            Page::Home => 0,
            Page::About => 1,
            Page::Experience => 2,
            Page::Projects => 3,
            Page::Skills => 4,
        }
    }

    /// Page for a navigation index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Menu label.
    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Experience => "Experience",
            Page::Projects => "Projects",
            Page::Skills => "Skills",
        }
    }
}

/// Navigation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// The requested index does not name a page.
    #[error("page index {index} out of range (0..{count})")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of pages.
        count: usize,
    },
}

/// Outcome of a page change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavChange {
    /// Page before the change.
    pub from: Page,
    /// Page after the change.
    pub to: Page,
}

impl NavChange {
    /// False when the change targeted the page that was already current.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// The single "which page is active" value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationState {
    current: Page,
}

impl NavigationState {
    /// Currently selected page.
    pub fn current(&self) -> Page {
        self.current
    }

    /// Replace the current page by index. Only the range is validated.
    pub fn change_page(&mut self, index: usize) -> Result<NavChange, NavError> {
        let to = Page::from_index(index).ok_or(NavError::OutOfRange {
            index,
            count: Page::ALL.len(),
        })?;
        let from = self.current;
        self.current = to;
        Ok(NavChange { from, to })
    }
}

/// Mount/unmount notifications emitted by the [`ViewGate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// A page view was mounted.
    Mount(Page),
    /// A page view was unmounted.
    Unmount(Page),
}

/// Animation phase of the mounted view. Visual only; never drives logic elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    /// The mounted view is animating in.
    Entering {
        /// Phase start.
        since: Duration,
    },
    /// Fully shown, no transition running.
    Shown,
    /// The mounted view is animating out; `next` mounts when it finishes.
    Leaving {
        /// Phase start.
        since: Duration,
        /// Page mounted once the exit completes.
        next: Page,
    },
}

/// Animated presentation values for the mounted view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewVisual {
    /// 0.0 transparent .. 1.0 opaque.
    pub opacity: f32,
    /// Vertical offset in logical pixels.
    pub offset_y: f32,
    /// Uniform scale.
    pub scale: f32,
}

impl ViewVisual {
    const SHOWN: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
        scale: 1.0,
    };
}

/// Keeps exactly one page view mounted and sequences the transitions between them.
#[derive(Clone, Debug)]
pub struct ViewGate {
    mounted: Page,
    phase: TransitionPhase,
    phase_len: Duration,
}

impl ViewGate {
    /// Mount `initial` and start its enter animation at `now`.
    pub fn new(initial: Page, now: Duration) -> Self {
        Self::with_phase_len(initial, now, TRANSITION_PHASE)
    }

    /// Like [`ViewGate::new`] with a custom phase length (zero disables animation).
    pub fn with_phase_len(initial: Page, now: Duration, phase_len: Duration) -> Self {
        let phase = if phase_len.is_zero() {
            TransitionPhase::Shown
        } else {
            TransitionPhase::Entering { since: now }
        };
        Self {
            mounted: initial,
            phase,
            phase_len,
        }
    }

    /// The one mounted page.
    pub fn mounted(&self) -> Page {
        self.mounted
    }

    /// Current animation phase.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Page the gate is heading to (the mounted page unless an exit is running).
    pub fn target(&self) -> Page {
        match self.phase {
            TransitionPhase::Leaving { next, .. } => next,
            _ => self.mounted,
        }
    }

    /// Ask the gate to show `target`; returns any mount/unmount that happens at `now`.
    pub fn request(&mut self, target: Page, now: Duration) -> Vec<ViewEvent> {
        match self.phase {
            TransitionPhase::Leaving { since, .. } if target == self.mounted => {
                // fade back in from the opacity the exit had reached
                let faded = now.saturating_sub(since).min(self.phase_len);
                self.phase = TransitionPhase::Entering {
                    since: now.saturating_sub(self.phase_len - faded),
                };
            }
            TransitionPhase::Leaving { next, .. } if next == target => {}
            TransitionPhase::Leaving { since, .. } => {
                self.phase = TransitionPhase::Leaving {
                    since,
                    next: target,
                };
            }
            _ if target == self.mounted => {}
            _ => {
                self.phase = TransitionPhase::Leaving {
                    since: now,
                    next: target,
                };
            }
        }
        self.advance(now)
    }

    /// Move the animation forward; swaps the mounted page when an exit completes.
    pub fn advance(&mut self, now: Duration) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        if let TransitionPhase::Leaving { since, next } = self.phase {
            if now.saturating_sub(since) >= self.phase_len {
                events.push(ViewEvent::Unmount(self.mounted));
                events.push(ViewEvent::Mount(next));
                self.mounted = next;
                self.phase = TransitionPhase::Entering { since: now };
            }
        }
        if let TransitionPhase::Entering { since } = self.phase {
            if now.saturating_sub(since) >= self.phase_len {
                self.phase = TransitionPhase::Shown;
            }
        }
        events
    }

    /// Presentation values for the mounted view at `now`.
    pub fn visual(&self, now: Duration) -> ViewVisual {
        let t = |since: Duration| {
            if self.phase_len.is_zero() {
                1.0
            } else {
                (now.saturating_sub(since).as_secs_f32() / self.phase_len.as_secs_f32()).min(1.0)
            }
        };
        match self.phase {
            TransitionPhase::Shown => ViewVisual::SHOWN,
            TransitionPhase::Entering { since } => {
                let t = t(since);
                ViewVisual {
                    opacity: t,
                    offset_y: 20.0 * (1.0 - t),
                    scale: 0.95 + 0.05 * t,
                }
            }
            TransitionPhase::Leaving { since, .. } => {
                let t = t(since);
                ViewVisual {
                    opacity: 1.0 - t,
                    offset_y: -20.0 * t,
                    scale: 1.0 + 0.05 * t,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MS: fn(u64) -> Duration = Duration::from_millis;

    #[test]
    fn change_page_replaces_and_validates_range() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.current(), Page::Home);
        let c = nav.change_page(3).unwrap();
        assert_eq!((c.from, c.to), (Page::Home, Page::Projects));
        assert!(c.changed());
        assert!(!nav.change_page(3).unwrap().changed());
        assert_eq!(
            nav.change_page(5),
            Err(NavError::OutOfRange { index: 5, count: 5 })
        );
        assert_eq!(nav.current(), Page::Projects);
    }

    #[test]
    fn exit_completes_before_enter() {
        let mut gate = ViewGate::new(Page::Home, MS(0));
        assert!(gate.advance(MS(400)).is_empty());
        assert_eq!(gate.phase(), TransitionPhase::Shown);

        assert!(gate.request(Page::About, MS(1000)).is_empty());
        assert_eq!(gate.mounted(), Page::Home);
        assert_eq!(gate.target(), Page::About);
        assert!(gate.advance(MS(1399)).is_empty());
        assert_eq!(
            gate.advance(MS(1400)),
            vec![ViewEvent::Unmount(Page::Home), ViewEvent::Mount(Page::About)]
        );
        assert_eq!(gate.mounted(), Page::About);
    }

    #[test]
    fn returning_to_mounted_page_cancels_exit() {
        let mut gate = ViewGate::new(Page::Skills, MS(0));
        gate.advance(MS(500));
        gate.request(Page::Home, MS(600));
        assert!(gate.request(Page::Skills, MS(700)).is_empty());
        assert!(matches!(gate.phase(), TransitionPhase::Entering { .. }));
        assert!(gate.advance(MS(5000)).is_empty());
        assert_eq!(gate.mounted(), Page::Skills);
    }

    #[test]
    fn cancelled_exit_fades_back_from_where_it_was() {
        let mut gate = ViewGate::new(Page::About, MS(0));
        gate.advance(MS(400));
        gate.request(Page::Home, MS(1000));
        let leaving = gate.visual(MS(1100));
        assert!((leaving.opacity - 0.75).abs() < 1e-5);

        gate.request(Page::About, MS(1100));
        let back = gate.visual(MS(1100));
        assert!((back.opacity - 0.75).abs() < 1e-5);
        assert!(gate.visual(MS(1200)).opacity > back.opacity);
        gate.advance(MS(1200));
        assert_eq!(gate.phase(), TransitionPhase::Shown);
    }

    #[test]
    fn retarget_while_leaving_keeps_single_swap() {
        let mut gate = ViewGate::new(Page::Home, MS(0));
        gate.request(Page::About, MS(0));
        gate.request(Page::Projects, MS(100));
        let events = gate.advance(MS(400));
        assert_eq!(
            events,
            vec![
                ViewEvent::Unmount(Page::Home),
                ViewEvent::Mount(Page::Projects)
            ]
        );
    }

    #[test]
    fn zero_length_phase_swaps_immediately() {
        let mut gate = ViewGate::with_phase_len(Page::Home, MS(0), Duration::ZERO);
        let events = gate.request(Page::Experience, MS(1));
        assert_eq!(events.len(), 2);
        assert_eq!(gate.mounted(), Page::Experience);
        assert_eq!(gate.visual(MS(1)), ViewVisual::SHOWN);
    }

    #[test]
    fn visual_fades_in_and_out() {
        let mut gate = ViewGate::new(Page::Home, MS(0));
        assert!(gate.visual(MS(0)).opacity.abs() < f32::EPSILON);
        assert!((gate.visual(MS(200)).opacity - 0.5).abs() < 1e-4);
        gate.advance(MS(400));
        gate.request(Page::About, MS(400));
        assert!((gate.visual(MS(500)).opacity - 0.75).abs() < 1e-4);
    }
}
