// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame-time sampling and the severity-weighted trigger that asks for degradation.
//!
//! Inter-frame deltas are collected in windows of `window` samples. Each full window
//! is reduced to an average FPS, classified into a severity band, and the band's
//! weight is added to a counter (a fast window resets it). Reaching `trigger`
//! requests one degradation step. A tier change wipes the counter and the buffer so
//! samples from the heavier configuration cannot count against the lighter one.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::degrade::DegradationLevel;

/// One "slower than `below_fps` adds `weight`" rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeverityBand {
    /// Windows averaging strictly below this FPS fall in the band.
    pub below_fps: f32,
    /// Counter increment for the band.
    pub weight: u32,
}

/// Tunable constants of the monitor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfThresholds {
    /// Bands ordered from mildest (highest FPS) to most severe.
    pub bands: Vec<SeverityBand>,
    /// Counter value that triggers a degradation request.
    pub trigger: u32,
    /// Samples per evaluation window.
    pub window: usize,
}

impl Default for PerfThresholds {
    fn default() -> Self {
        Self {
            bands: vec![
                SeverityBand {
                    below_fps: 55.0,
                    weight: 1,
                },
                SeverityBand {
                    below_fps: 49.0,
                    weight: 3,
                },
                SeverityBand {
                    below_fps: 30.0,
                    weight: 5,
                },
            ],
            trigger: 10,
            window: 30,
        }
    }
}

impl PerfThresholds {
    /// Weight of the most severe band `fps` falls into; `None` when it is fast
    /// enough to reset the counter.
    pub fn weight_for(&self, fps: f32) -> Option<u32> {
        self.bands
            .iter()
            .filter(|b| fps < b.below_fps)
            .min_by(|a, b| a.below_fps.total_cmp(&b.below_fps))
            .map(|b| b.weight)
    }
}

/// What the monitor did with a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameVerdict {
    /// First frame; only the timestamp was recorded.
    Primed,
    /// The maximum tier is reached; nothing is sampled any more.
    Inert,
    /// The tier changed since the last frame; counters and buffer were reset.
    Rebaselined,
    /// Sample added, window not yet full.
    Sampling,
    /// A window completed without triggering.
    Window {
        /// Average FPS over the window.
        fps: f32,
        /// Counter after the window.
        counter: u32,
    },
    /// A window completed and the counter reached the trigger.
    Degrade {
        /// Average FPS over the window.
        fps: f32,
    },
}

/// Rolling frame-time tracker with hysteresis.
#[derive(Clone, Debug)]
pub struct PerformanceMonitor {
    thresholds: PerfThresholds,
    samples: VecDeque<f32>,
    last_frame: Option<Duration>,
    counter: u32,
    seen_level: DegradationLevel,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(PerfThresholds::default())
    }
}

impl PerformanceMonitor {
    /// Monitor with the given constants, baselined at tier 0.
    pub fn new(thresholds: PerfThresholds) -> Self {
        let window = thresholds.window.max(1);
        Self {
            thresholds: PerfThresholds {
                window,
                ..thresholds
            },
            samples: VecDeque::with_capacity(window),
            last_frame: None,
            counter: 0,
            seen_level: DegradationLevel::default(),
        }
    }

    /// Active constants.
    pub fn thresholds(&self) -> &PerfThresholds {
        &self.thresholds
    }

    /// Samples in the current, incomplete window.
    pub fn samples_len(&self) -> usize {
        self.samples.len()
    }

    /// Current severity counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Observe a frame at `now` rendered at tier `level` (of at most `max`).
    pub fn on_frame(
        &mut self,
        now: Duration,
        level: DegradationLevel,
        max: DegradationLevel,
    ) -> FrameVerdict {
        let delta = self.last_frame.map(|t| now.saturating_sub(t));
        self.last_frame = Some(now);

        if level >= max {
            self.reset();
            self.seen_level = level;
            return FrameVerdict::Inert;
        }
        if level != self.seen_level {
            debug!(from = self.seen_level.0, to = level.0, "tier changed; rebaselining");
            self.reset();
            self.seen_level = level;
            return FrameVerdict::Rebaselined;
        }
        match delta {
            None => FrameVerdict::Primed,
            Some(d) => self.record_delta(d.as_secs_f32() * 1000.0),
        }
    }

    /// Feed one inter-frame delta in milliseconds.
    pub fn record_delta(&mut self, delta_ms: f32) -> FrameVerdict {
        if self.samples.len() >= self.thresholds.window {
            self.samples.pop_front();
        }
        self.samples.push_back(delta_ms);
        if self.samples.len() < self.thresholds.window {
            return FrameVerdict::Sampling;
        }

        let avg = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        self.samples.clear();
        let fps = if avg > 0.0 { 1000.0 / avg } else { f32::INFINITY };

        match self.thresholds.weight_for(fps) {
            Some(w) => self.counter = self.counter.saturating_add(w),
            None => self.counter = 0,
        }
        debug!(fps, counter = self.counter, "frame window evaluated");

        if self.counter >= self.thresholds.trigger {
            self.counter = 0;
            info!(fps, "sustained low frame rate; requesting degradation");
            return FrameVerdict::Degrade { fps };
        }
        FrameVerdict::Window {
            fps,
            counter: self.counter,
        }
    }

    /// Drop the counter and any partial window.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(m: &mut PerformanceMonitor, delta_ms: f32) -> FrameVerdict {
        let mut last = FrameVerdict::Sampling;
        for _ in 0..m.thresholds().window {
            last = m.record_delta(delta_ms);
        }
        last
    }

    #[test]
    fn bands_pick_most_severe_match() {
        let t = PerfThresholds::default();
        assert_eq!(t.weight_for(60.0), None);
        assert_eq!(t.weight_for(55.0), None);
        assert_eq!(t.weight_for(50.0), Some(1));
        assert_eq!(t.weight_for(49.0), Some(1));
        assert_eq!(t.weight_for(40.0), Some(3));
        assert_eq!(t.weight_for(12.0), Some(5));
    }

    #[test]
    fn no_evaluation_before_window_fills() {
        let mut m = PerformanceMonitor::default();
        for _ in 0..29 {
            assert_eq!(m.record_delta(100.0), FrameVerdict::Sampling);
        }
        assert_eq!(m.samples_len(), 29);
        assert_eq!(m.counter(), 0);
    }

    #[test]
    fn severe_windows_escalate_faster() {
        let mut m = PerformanceMonitor::default();
        // 10 fps: +5 per window, trigger after two windows
        assert_eq!(window(&mut m, 100.0), FrameVerdict::Window { fps: 10.0, counter: 5 });
        assert!(matches!(window(&mut m, 100.0), FrameVerdict::Degrade { .. }));
        assert_eq!(m.counter(), 0);
    }

    #[test]
    fn fast_window_resets_counter() {
        let mut m = PerformanceMonitor::default();
        window(&mut m, 25.0); // 40 fps, +3
        assert_eq!(m.counter(), 3);
        window(&mut m, 10.0); // 100 fps
        assert_eq!(m.counter(), 0);
    }

    #[test]
    fn first_frame_primes_and_tier_change_rebaselines() {
        let mut m = PerformanceMonitor::default();
        let max = DegradationLevel(2);
        let ms = Duration::from_millis;
        assert_eq!(m.on_frame(ms(0), DegradationLevel(0), max), FrameVerdict::Primed);
        assert_eq!(m.on_frame(ms(20), DegradationLevel(0), max), FrameVerdict::Sampling);
        assert_eq!(m.samples_len(), 1);
        assert_eq!(
            m.on_frame(ms(40), DegradationLevel(1), max),
            FrameVerdict::Rebaselined
        );
        assert_eq!(m.samples_len(), 0);
        assert_eq!(m.on_frame(ms(60), DegradationLevel(2), max), FrameVerdict::Inert);
        assert_eq!(m.samples_len(), 0);
    }
}
