// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One-shot classification of the client as constrained (mobile/low-power) or capable.

use serde::{Deserialize, Serialize};

/// User-agent fragments (lower-case) that mark a mobile or tablet platform.
pub const MOBILE_KEYWORDS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Touch devices at or below this logical width count as constrained.
pub const NARROW_VIEWPORT_PX: f32 = 768.0;

/// Raw environment inputs to device classification.
///
/// Every field is optional in spirit: a host that cannot read the user agent or
/// the viewport leaves them empty and the probe classifies as capable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProbe {
    /// Browser/user-agent string, if the host has one.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Whether the environment reports touch input.
    #[serde(default)]
    pub touch: bool,
    /// Viewport width in logical pixels.
    #[serde(default)]
    pub viewport_width: Option<f32>,
}

/// Returns `true` when the probe describes a constrained device.
pub fn is_constrained(probe: &DeviceProbe) -> bool {
    let ua_match = probe.user_agent.as_deref().is_some_and(|ua| {
        let ua = ua.to_ascii_lowercase();
        MOBILE_KEYWORDS.iter().any(|k| ua.contains(k))
    });
    let narrow_touch = probe.touch
        && probe
            .viewport_width
            .is_some_and(|w| w.is_finite() && w <= NARROW_VIEWPORT_PX);
    ua_match || narrow_touch
}

/// Result of device classification, recorded once per session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapability {
    /// True for constrained (mobile/low-power) clients.
    pub is_mobile: bool,
}

impl DeviceCapability {
    /// Classify the environment; `None` (no environment at all) is never constrained.
    pub fn detect(probe: Option<&DeviceProbe>) -> Self {
        Self {
            is_mobile: probe.is_some_and(is_constrained),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(ua: Option<&str>, touch: bool, width: Option<f32>) -> DeviceProbe {
        DeviceProbe {
            user_agent: ua.map(String::from),
            touch,
            viewport_width: width,
        }
    }

    #[test]
    fn mobile_user_agents_are_constrained_regardless_of_width() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert!(is_constrained(&probe(Some(ua), false, Some(1920.0))));
        assert!(is_constrained(&probe(Some("Opera Mini/8.0"), false, None)));
        assert!(is_constrained(&probe(Some("... ANDROID 14 ..."), false, None)));
    }

    #[test]
    fn narrow_touch_is_constrained_but_narrow_mouse_is_not() {
        let desktop = "Mozilla/5.0 (X11; Linux x86_64)";
        assert!(is_constrained(&probe(Some(desktop), true, Some(768.0))));
        assert!(!is_constrained(&probe(Some(desktop), true, Some(769.0))));
        assert!(!is_constrained(&probe(Some(desktop), false, Some(320.0))));
    }

    #[test]
    fn missing_environment_defaults_to_capable() {
        assert!(!DeviceCapability::detect(None).is_mobile);
        assert!(!DeviceCapability::detect(Some(&DeviceProbe::default())).is_mobile);
        // touch without a known width cannot be classified as narrow
        assert!(!is_constrained(&probe(None, true, None)));
    }
}
