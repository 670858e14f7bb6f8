// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunable rendering parameters shared by the controls, the degradation controller
//! and the scene host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selectable skybox texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkyboxOption {
    /// Human-readable name.
    pub label: &'static str,
    /// Logical asset file under `skyboxes/`.
    pub file: &'static str,
}

/// Skyboxes offered by the environment controls.
pub const SKYBOX_OPTIONS: [SkyboxOption; 5] = [
    SkyboxOption {
        label: "Purply Blue Sky",
        file: "PurplyBlueSky.png",
    },
    SkyboxOption {
        label: "Blue Sky",
        file: "BlueSkySkybox.png",
    },
    SkyboxOption {
        label: "Green Sky",
        file: "GreenSky.png",
    },
    SkyboxOption {
        label: "Purple Sky",
        file: "SkySkybox.png",
    },
    SkyboxOption {
        label: "Sunset Sky",
        file: "SunsetSky.png",
    },
];

/// Allowed shadow map resolutions.
pub const SHADOW_MAP_SIZES: [u32; 4] = [512, 1024, 2048, 4096];

/// Allowed water reflection buffer resolutions, cheapest first.
pub const WATER_REFLECTION_SIZES: [u32; 4] = [64, 128, 256, 512];

/// Shadow filtering technique.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowType {
    /// Single-tap hard shadows.
    Basic,
    /// Percentage-closer filtered shadows.
    #[default]
    Soft,
}

/// Failure to parse a `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid colour {0:?}, expected #rrggbb")]
pub struct ColorParseError(pub String);

/// 8-bit sRGB colour, `#rrggbb` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// White.
    pub const WHITE: Self = Self([0xff, 0xff, 0xff]);

    /// Linear-ish float triple in 0..1 (no gamma conversion).
    pub fn to_f32(self) -> [f32; 3] {
        self.0.map(|c| f32::from(c) / 255.0)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self([byte(0)?, byte(2)?, byte(4)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Every rendering knob. Always fully populated; see [`RenderConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Set once the scene host reports ready (or when no scene is mounted).
    pub scene_loaded: bool,

    /// Ambient light intensity, 0..2.
    pub ambient_light_intensity: f32,
    /// Sun (directional light) intensity, 0..2.
    pub directional_light_intensity: f32,
    /// Sun colour.
    pub sun_color: Rgb,
    /// Sun azimuth in degrees, 0..360.
    pub sun_azimuth: f32,
    /// Sun elevation in degrees, 0..90.
    pub sun_elevation: f32,

    /// Shadow filtering.
    pub shadow_type: ShadowType,
    /// Shadow map resolution, one of [`SHADOW_MAP_SIZES`].
    pub shadow_map_size: u32,

    /// Water reflection buffer resolution, one of [`WATER_REFLECTION_SIZES`].
    pub water_reflection_size: u32,
    /// Deep water tint.
    pub water_color: Rgb,
    /// Whether the water surface is affected by fog.
    pub water_fog_enabled: bool,

    /// Distance fog on the scene.
    pub fog_enabled: bool,

    /// Vignette post effect.
    pub vignette_enabled: bool,
    /// Vignette offset, 0..1.
    pub vignette_offset: f32,
    /// Vignette darkness, 0..1.
    pub vignette_darkness: f32,
    /// Depth-of-field post effect.
    pub depth_of_field_enabled: bool,
    /// Depth-of-field focal length, 1..100.
    pub dof_focal_length: f32,
    /// Depth-of-field bokeh scale, 0..10.
    pub dof_bokeh_scale: f32,
    /// Chromatic aberration post effect.
    pub chromatic_aberration_enabled: bool,
    /// Chromatic aberration offset (x, y), each 0..0.01.
    pub chromatic_aberration_offset: [f32; 2],

    /// Skybox asset file, one of [`SKYBOX_OPTIONS`].
    pub skybox: String,
    /// Orbit the camera automatically.
    pub auto_rotate: bool,
    /// Auto-rotation speed multiplier, 0..10.
    pub auto_rotate_speed: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scene_loaded: false,
            ambient_light_intensity: 0.5,
            directional_light_intensity: 0.7,
            sun_color: Rgb::WHITE,
            sun_azimuth: 45.0,
            sun_elevation: 63.0,
            shadow_type: ShadowType::Soft,
            shadow_map_size: 2048,
            water_reflection_size: 512,
            water_color: Rgb([0x00, 0x1e, 0x0f]),
            water_fog_enabled: true,
            fog_enabled: true,
            vignette_enabled: true,
            vignette_offset: 0.4,
            vignette_darkness: 0.5,
            depth_of_field_enabled: true,
            dof_focal_length: 40.0,
            dof_bokeh_scale: 1.0,
            chromatic_aberration_enabled: true,
            chromatic_aberration_offset: [0.002, 0.002],
            skybox: SKYBOX_OPTIONS[0].file.to_string(),
            auto_rotate: true,
            auto_rotate_speed: 1.0,
        }
    }
}

/// A single-field write. The controls and the degradation controller both speak this.
///
/// On the wire: `{"field":"sunElevation","value":40}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum RenderUpdate {
    /// Scene readiness flag.
    SceneLoaded(bool),
    /// Ambient light intensity.
    AmbientLightIntensity(f32),
    /// Sun intensity.
    DirectionalLightIntensity(f32),
    /// Sun colour.
    SunColor(Rgb),
    /// Sun azimuth (degrees).
    SunAzimuth(f32),
    /// Sun elevation (degrees).
    SunElevation(f32),
    /// Shadow filtering.
    ShadowType(ShadowType),
    /// Shadow map resolution.
    ShadowMapSize(u32),
    /// Water reflection resolution.
    WaterReflectionSize(u32),
    /// Water tint.
    WaterColor(Rgb),
    /// Water fog flag.
    WaterFogEnabled(bool),
    /// Scene fog flag.
    FogEnabled(bool),
    /// Vignette flag.
    VignetteEnabled(bool),
    /// Vignette offset.
    VignetteOffset(f32),
    /// Vignette darkness.
    VignetteDarkness(f32),
    /// Depth-of-field flag.
    DepthOfFieldEnabled(bool),
    /// Depth-of-field focal length.
    DofFocalLength(f32),
    /// Depth-of-field bokeh scale.
    DofBokehScale(f32),
    /// Chromatic aberration flag.
    ChromaticAberrationEnabled(bool),
    /// Chromatic aberration x offset.
    ChromaticAberrationOffsetX(f32),
    /// Chromatic aberration y offset.
    ChromaticAberrationOffsetY(f32),
    /// Skybox file; unknown files are ignored.
    Skybox(String),
    /// Auto-rotate flag.
    AutoRotate(bool),
    /// Auto-rotate speed.
    AutoRotateSpeed(f32),
}

fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

/// Largest allowed size not above `v` (smallest allowed size if `v` is below all).
fn snap(v: u32, allowed: &[u32]) -> u32 {
    allowed
        .iter()
        .copied()
        .filter(|&s| s <= v)
        .max()
        .or_else(|| allowed.iter().copied().min())
        .unwrap_or(v)
}

impl RenderConfig {
    /// Apply one write. Numbers are clamped to the control ranges; sizes snap to
    /// the allowed sets.
    pub fn apply(&mut self, update: RenderUpdate) {
        match update {
            RenderUpdate::SceneLoaded(v) => self.scene_loaded = v,
            RenderUpdate::AmbientLightIntensity(v) => {
                self.ambient_light_intensity = clamp(v, 0.0, 2.0);
            }
            RenderUpdate::DirectionalLightIntensity(v) => {
                self.directional_light_intensity = clamp(v, 0.0, 2.0);
            }
            RenderUpdate::SunColor(c) => self.sun_color = c,
            RenderUpdate::SunAzimuth(v) => self.sun_azimuth = clamp(v, 0.0, 360.0),
            RenderUpdate::SunElevation(v) => self.sun_elevation = clamp(v, 0.0, 90.0),
            RenderUpdate::ShadowType(t) => self.shadow_type = t,
            RenderUpdate::ShadowMapSize(s) => self.shadow_map_size = snap(s, &SHADOW_MAP_SIZES),
            RenderUpdate::WaterReflectionSize(s) => {
                self.water_reflection_size = snap(s, &WATER_REFLECTION_SIZES);
            }
            RenderUpdate::WaterColor(c) => self.water_color = c,
            RenderUpdate::WaterFogEnabled(v) => self.water_fog_enabled = v,
            RenderUpdate::FogEnabled(v) => self.fog_enabled = v,
            RenderUpdate::VignetteEnabled(v) => self.vignette_enabled = v,
            RenderUpdate::VignetteOffset(v) => self.vignette_offset = clamp(v, 0.0, 1.0),
            RenderUpdate::VignetteDarkness(v) => self.vignette_darkness = clamp(v, 0.0, 1.0),
            RenderUpdate::DepthOfFieldEnabled(v) => self.depth_of_field_enabled = v,
            RenderUpdate::DofFocalLength(v) => self.dof_focal_length = clamp(v, 1.0, 100.0),
            RenderUpdate::DofBokehScale(v) => self.dof_bokeh_scale = clamp(v, 0.0, 10.0),
            RenderUpdate::ChromaticAberrationEnabled(v) => self.chromatic_aberration_enabled = v,
            RenderUpdate::ChromaticAberrationOffsetX(v) => {
                self.chromatic_aberration_offset[0] = clamp(v, 0.0, 0.01);
            }
            RenderUpdate::ChromaticAberrationOffsetY(v) => {
                self.chromatic_aberration_offset[1] = clamp(v, 0.0, 0.01);
            }
            RenderUpdate::Skybox(file) => {
                if SKYBOX_OPTIONS.iter().any(|o| o.file == file) {
                    self.skybox = file;
                }
            }
            RenderUpdate::AutoRotate(v) => self.auto_rotate = v,
            RenderUpdate::AutoRotateSpeed(v) => self.auto_rotate_speed = clamp(v, 0.0, 10.0),
        }
    }

    /// True if any post-processing pass is enabled.
    pub fn post_processing_active(&self) -> bool {
        self.vignette_enabled || self.depth_of_field_enabled || self.chromatic_aberration_enabled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn colours_round_trip_through_hex() {
        let c: Rgb = "#001E0f".parse().unwrap();
        assert_eq!(c, Rgb([0x00, 0x1e, 0x0f]));
        assert_eq!(c.to_string(), "#001e0f");
        assert!("001e0f".parse::<Rgb>().is_err());
        assert!("#00é0f".parse::<Rgb>().is_err());
    }

    #[test]
    fn updates_clamp_and_snap() {
        let mut cfg = RenderConfig::default();
        cfg.apply(RenderUpdate::SunElevation(120.0));
        assert!((cfg.sun_elevation - 90.0).abs() < f32::EPSILON);
        cfg.apply(RenderUpdate::AmbientLightIntensity(f32::NAN));
        assert!(cfg.ambient_light_intensity.abs() < f32::EPSILON);
        cfg.apply(RenderUpdate::WaterReflectionSize(300));
        assert_eq!(cfg.water_reflection_size, 256);
        cfg.apply(RenderUpdate::WaterReflectionSize(10));
        assert_eq!(cfg.water_reflection_size, 64);
        cfg.apply(RenderUpdate::ShadowMapSize(9999));
        assert_eq!(cfg.shadow_map_size, 4096);
    }

    #[test]
    fn unknown_skybox_is_ignored() {
        let mut cfg = RenderConfig::default();
        cfg.apply(RenderUpdate::Skybox("Nope.png".into()));
        assert_eq!(cfg.skybox, "PurplyBlueSky.png");
        cfg.apply(RenderUpdate::Skybox("SunsetSky.png".into()));
        assert_eq!(cfg.skybox, "SunsetSky.png");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: RenderConfig =
            serde_json::from_str(r##"{"sunColor":"#ff8800","shadowType":"basic"}"##).unwrap();
        assert_eq!(cfg.sun_color, Rgb([0xff, 0x88, 0x00]));
        assert_eq!(cfg.shadow_type, ShadowType::Basic);
        assert_eq!(cfg.water_reflection_size, 512);
        assert!(cfg.auto_rotate);
    }

    #[test]
    fn updates_decode_from_field_value_pairs() {
        let u: RenderUpdate =
            serde_json::from_str(r##"{"field":"waterColor","value":"#001e0f"}"##).unwrap();
        assert_eq!(u, RenderUpdate::WaterColor(Rgb([0x00, 0x1e, 0x0f])));
        let u: RenderUpdate =
            serde_json::from_str(r#"{"field":"shadowMapSize","value":1000}"#).unwrap();
        let mut cfg = RenderConfig::default();
        cfg.apply(u);
        assert_eq!(cfg.shadow_map_size, 512);
        assert!(serde_json::from_str::<RenderUpdate>(r#"{"field":"bogus","value":1}"#).is_err());
    }
}
