// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render-loop ticker with a fixed stage order.

use std::time::Duration;

/// Per-frame work registered with the ticker. Declaration order is run order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TickStage {
    /// Scene host: animations, deferred loads, ready latch.
    Scene,
    /// Performance monitor; always after the scene.
    Monitor,
}

/// Timing of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTick {
    /// Frame timestamp since the session origin.
    pub now: Duration,
    /// Time since the previous frame (zero on the first).
    pub dt: Duration,
    /// Frame counter, starting at 1.
    pub frame: u64,
}

/// Produces [`FrameTick`]s and the ordered list of stages to run for them.
#[derive(Clone, Debug, Default)]
pub struct Ticker {
    stages: Vec<TickStage>,
    last: Option<Duration>,
    frame: u64,
}

impl Ticker {
    /// Add a stage; registering an existing stage is a no-op.
    pub fn register(&mut self, stage: TickStage) {
        if let Err(pos) = self.stages.binary_search(&stage) {
            self.stages.insert(pos, stage);
        }
    }

    /// Remove a stage. Returns whether it was registered.
    pub fn unregister(&mut self, stage: TickStage) -> bool {
        match self.stages.binary_search(&stage) {
            Ok(pos) => {
                self.stages.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether `stage` runs.
    pub fn is_registered(&self, stage: TickStage) -> bool {
        self.stages.binary_search(&stage).is_ok()
    }

    /// Registered stages in run order.
    pub fn stages(&self) -> &[TickStage] {
        &self.stages
    }

    /// Advance to `now`.
    pub fn tick(&mut self, now: Duration) -> FrameTick {
        let dt = self.last.map_or(Duration::ZERO, |t| now.saturating_sub(t));
        self.last = Some(now);
        self.frame += 1;
        FrameTick {
            now,
            dt,
            frame: self.frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_runs_after_scene_regardless_of_registration_order() {
        let mut t = Ticker::default();
        t.register(TickStage::Monitor);
        t.register(TickStage::Scene);
        t.register(TickStage::Monitor);
        assert_eq!(t.stages(), &[TickStage::Scene, TickStage::Monitor]);
        assert!(t.unregister(TickStage::Scene));
        assert!(!t.unregister(TickStage::Scene));
        assert_eq!(t.stages(), &[TickStage::Monitor]);
    }

    #[test]
    fn ticks_measure_deltas() {
        let mut t = Ticker::default();
        let a = t.tick(Duration::from_millis(5));
        let b = t.tick(Duration::from_millis(21));
        assert_eq!(a.dt, Duration::ZERO);
        assert_eq!(b.dt, Duration::from_millis(16));
        assert_eq!(b.frame, 2);
    }
}
