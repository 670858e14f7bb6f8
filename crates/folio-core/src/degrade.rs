// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Monotonic fidelity tiers and the configuration edits each tier applies.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render_config::RenderConfig;

/// Rendering-fidelity step; higher means cheaper.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DegradationLevel(pub u8);

/// Reflection resolution after the first step.
pub const REDUCED_REFLECTION_SIZE: u32 = 256;
/// Reflection resolution after the last step.
pub const MIN_REFLECTION_SIZE: u32 = 64;

/// The edit applied when entering a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierStep {
    /// Turn off depth of field, chromatic aberration and vignette; shrink reflections.
    DisablePostAndShrinkReflection(u32),
    /// Shrink reflections further.
    ShrinkReflection(u32),
}

impl TierStep {
    fn apply(self, cfg: &mut RenderConfig) {
        match self {
            TierStep::DisablePostAndShrinkReflection(size) => {
                cfg.depth_of_field_enabled = false;
                cfg.chromatic_aberration_enabled = false;
                cfg.vignette_enabled = false;
                cfg.water_reflection_size = size;
            }
            TierStep::ShrinkReflection(size) => cfg.water_reflection_size = size,
        }
    }

    fn notice(self, level: DegradationLevel) -> DegradeNotice {
        let (title, body) = match self {
            TierStep::DisablePostAndShrinkReflection(_) => (
                "Performance mode enabled",
                "Post-processing effects were turned off and water reflections reduced to keep things smooth.",
            ),
            TierStep::ShrinkReflection(_) => (
                "Reducing quality further",
                "Water reflections dropped to the lowest resolution.",
            ),
        };
        DegradeNotice {
            level,
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

/// Tier steps in order; entering tier `n` applies `TIERS[n - 1]`.
pub const TIERS: [TierStep; 2] = [
    TierStep::DisablePostAndShrinkReflection(REDUCED_REFLECTION_SIZE),
    TierStep::ShrinkReflection(MIN_REFLECTION_SIZE),
];

/// User-facing description of a tier change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DegradeNotice {
    /// Tier that was entered.
    pub level: DegradationLevel,
    /// Banner title.
    pub title: String,
    /// Banner body.
    pub body: String,
}

/// Strictly monotonic tier state machine.
#[derive(Clone, Debug, Default)]
pub struct DegradationController {
    level: DegradationLevel,
}

impl DegradationController {
    /// Highest tier.
    pub const MAX: DegradationLevel = DegradationLevel(TIERS.len() as u8);

    /// Current tier.
    pub fn level(&self) -> DegradationLevel {
        self.level
    }

    /// True once no further step exists.
    pub fn at_max(&self) -> bool {
        self.level >= Self::MAX
    }

    /// Enter the next tier, editing `cfg`. No-op (returns `None`) at the maximum.
    pub fn degrade(&mut self, cfg: &mut RenderConfig) -> Option<DegradeNotice> {
        let step = *TIERS.get(usize::from(self.level.0))?;
        step.apply(cfg);
        self.level = DegradationLevel(self.level.0 + 1);
        info!(
            level = self.level.0,
            reflection = cfg.water_reflection_size,
            "render quality degraded"
        );
        Some(step.notice(self.level))
    }

    /// Jump straight to the maximum tier, applying every remaining step silently.
    pub fn pin_to_max(&mut self, cfg: &mut RenderConfig) {
        while let Some(step) = TIERS.get(usize::from(self.level.0)) {
            step.apply(cfg);
            self.level = DegradationLevel(self.level.0 + 1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn steps_apply_in_order_then_stop() {
        let mut cfg = RenderConfig::default();
        let mut ctl = DegradationController::default();

        let first = ctl.degrade(&mut cfg).unwrap();
        assert_eq!(first.level, DegradationLevel(1));
        assert!(!cfg.depth_of_field_enabled);
        assert!(!cfg.chromatic_aberration_enabled);
        assert!(!cfg.vignette_enabled);
        assert_eq!(cfg.water_reflection_size, 256);

        let second = ctl.degrade(&mut cfg).unwrap();
        assert_eq!(second.level, DegradationLevel(2));
        assert_eq!(cfg.water_reflection_size, 64);
        assert!(ctl.at_max());

        let before = cfg.clone();
        assert!(ctl.degrade(&mut cfg).is_none());
        assert_eq!(cfg, before);
    }

    #[test]
    fn pinning_matches_stepping() {
        let mut stepped = RenderConfig::default();
        let mut a = DegradationController::default();
        while a.degrade(&mut stepped).is_some() {}

        let mut pinned = RenderConfig::default();
        let mut b = DegradationController::default();
        b.pin_to_max(&mut pinned);

        assert_eq!(stepped, pinned);
        assert_eq!(a.level(), b.level());
    }
}
