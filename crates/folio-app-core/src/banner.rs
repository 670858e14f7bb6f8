// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Notification banner queue with a fixed show/fade timeline and dedupe.
//!
//! Times are `Duration`s since the session origin (not `Instant`) so the queue
//! runs unchanged under wasm.

use std::collections::VecDeque;
use std::time::Duration;

use folio_core::degrade::DegradeNotice;
use folio_core::scene::SceneFallback;

/// Delay between pushing a banner and it becoming visible.
pub const SHOW_AFTER: Duration = Duration::from_millis(10);
/// Age at which the fade-out starts.
pub const FADE_AFTER: Duration = Duration::from_millis(4000);
/// Age at which the banner is removed.
pub const REMOVE_AFTER: Duration = Duration::from_millis(5000);
/// Identical banners pushed within this window collapse into one.
pub const DEDUPE_WINDOW: Duration = Duration::from_millis(500);

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Informational note.
    Info,
    /// Something degraded but the app carries on.
    Warn,
    /// Something failed.
    Error,
}

/// Identifier for a banner entry.
pub type BannerId = u64;

/// Where a banner is on its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    /// Pushed but not yet shown (lets the slide-in start from off-screen).
    Pending,
    /// Fully visible.
    Shown,
    /// Fading out.
    Fading,
}

#[derive(Debug, Clone)]
struct Banner {
    id: BannerId,
    kind: BannerKind,
    title: String,
    body: Option<String>,
    created: Duration,
}

/// Rendering-friendly view of a banner.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerRender {
    /// Stable identifier (pass to [`BannerQueue::dismiss`]).
    pub id: BannerId,
    /// Severity.
    pub kind: BannerKind,
    /// Short title line.
    pub title: String,
    /// Optional body text.
    pub body: Option<String>,
    /// Timeline phase.
    pub phase: BannerPhase,
    /// 0.0 hidden .. 1.0 fully visible.
    pub opacity: f32,
}

/// In-memory banner queue.
#[derive(Debug)]
pub struct BannerQueue {
    queue: VecDeque<Banner>,
    max: usize,
    next_id: BannerId,
}

impl BannerQueue {
    /// Create a new queue holding at most `max` banners (oldest dropped first).
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            next_id: 1,
        }
    }

    /// Push a banner, deduping an identical one pushed within [`DEDUPE_WINDOW`].
    pub fn push<S, B>(&mut self, kind: BannerKind, title: S, body: B, now: Duration) -> BannerId
    where
        S: Into<String>,
        B: Into<Option<String>>,
    {
        let title = title.into();
        let body = body.into();

        if let Some(existing) = self.queue.iter().find(|b| {
            b.kind == kind
                && b.title == title
                && b.body == body
                && now.saturating_sub(b.created) <= DEDUPE_WINDOW
        }) {
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Banner {
            id,
            kind,
            title,
            body,
            created: now,
        });
        id
    }

    /// Banner for a degradation step.
    pub fn push_notice(&mut self, notice: &DegradeNotice, now: Duration) -> BannerId {
        self.push(
            BannerKind::Warn,
            notice.title.clone(),
            Some(notice.body.clone()),
            now,
        )
    }

    /// Banner for a scene node that fell back to a substitute.
    pub fn push_fallback(&mut self, fallback: &SceneFallback, now: Duration) -> BannerId {
        self.push(
            BannerKind::Warn,
            format!("{:?} unavailable", fallback.kind),
            Some(fallback.reason.clone()),
            now,
        )
    }

    /// Remove a banner before its timeline ends. Returns whether it existed.
    pub fn dismiss(&mut self, id: BannerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|b| b.id != id);
        self.queue.len() != before
    }

    /// Drop banners whose timeline has ended (call once per frame).
    pub fn retain_visible(&mut self, now: Duration) {
        self.queue
            .retain(|b| now.saturating_sub(b.created) < REMOVE_AFTER);
    }

    /// Number of live banners.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// No banners at all.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Render-ready banners in push order.
    pub fn visible(&self, now: Duration) -> Vec<BannerRender> {
        self.queue
            .iter()
            .filter(|b| now.saturating_sub(b.created) < REMOVE_AFTER)
            .map(|b| {
                let (phase, opacity) = timeline(now.saturating_sub(b.created));
                BannerRender {
                    id: b.id,
                    kind: b.kind,
                    title: b.title.clone(),
                    body: b.body.clone(),
                    phase,
                    opacity,
                }
            })
            .collect()
    }
}

fn timeline(age: Duration) -> (BannerPhase, f32) {
    if age < SHOW_AFTER {
        (BannerPhase::Pending, 0.0)
    } else if age < FADE_AFTER {
        (BannerPhase::Shown, 1.0)
    } else {
        let span = (REMOVE_AFTER - FADE_AFTER).as_secs_f32();
        let t = (age - FADE_AFTER).as_secs_f32() / span;
        (BannerPhase::Fading, (1.0 - t).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn timeline_shows_fades_and_removes() {
        let mut q = BannerQueue::new(4);
        q.push(BannerKind::Info, "hi", None::<String>, ms(0));
        assert_eq!(q.visible(ms(5))[0].phase, BannerPhase::Pending);
        assert_eq!(q.visible(ms(10))[0].phase, BannerPhase::Shown);
        let fading = &q.visible(ms(4500))[0];
        assert_eq!(fading.phase, BannerPhase::Fading);
        assert!((fading.opacity - 0.5).abs() < 1e-3);
        assert!(q.visible(ms(5000)).is_empty());
        q.retain_visible(ms(5000));
        assert!(q.is_empty());
    }

    #[test]
    fn duplicates_within_window_collapse() {
        let mut q = BannerQueue::new(4);
        let a = q.push(BannerKind::Warn, "slow", Some("x".to_string()), ms(0));
        let b = q.push(BannerKind::Warn, "slow", Some("x".to_string()), ms(400));
        let c = q.push(BannerKind::Warn, "slow", Some("x".to_string()), ms(900));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn bounded_and_dismissible() {
        let mut q = BannerQueue::new(2);
        let first = q.push(BannerKind::Info, "1", None::<String>, ms(0));
        let second = q.push(BannerKind::Info, "2", None::<String>, ms(0));
        q.push(BannerKind::Info, "3", None::<String>, ms(0));
        assert_eq!(q.len(), 2);
        assert!(!q.dismiss(first));
        assert!(q.dismiss(second));
        assert_eq!(q.visible(ms(20))[0].title, "3");
    }
}
