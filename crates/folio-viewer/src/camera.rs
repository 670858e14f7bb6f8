// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orbit camera around the street, its planar-reflection twin, and the sun's
//! shadow projection.

use glam::{Mat4, Vec3};

/// Near/far planes shared by the main and reflection cameras (the depth-of-field
/// pass linearises depth with the same values).
pub const NEAR: f32 = 0.5;
pub const FAR: f32 = 900.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub height: f32,
    pub fov_y: f32,
    /// Radians around +Y, driven by the scene's auto-rotation.
    pub angle: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 3.0, 0.0),
            distance: 46.0,
            height: 16.0,
            fov_y: 50f32.to_radians(),
            angle: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.angle.cos(),
                self.height,
                self.distance * self.angle.sin(),
            )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(0.1), NEAR, FAR)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }

    /// View-projection of the scene mirrored through the plane `y = water_y`.
    ///
    /// A point rendered with this matrix lands on the screen position where its
    /// reflection appears on the water, so the water shader can sample the
    /// reflection target with its own screen coordinates.
    pub fn reflected_view_proj(&self, aspect: f32, water_y: f32) -> Mat4 {
        let mirror = Mat4::from_translation(Vec3::new(0.0, water_y, 0.0))
            * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
            * Mat4::from_translation(Vec3::new(0.0, -water_y, 0.0));
        self.view_proj(aspect) * mirror
    }
}

/// Orthographic projection from the sun covering the street.
pub fn light_view_proj(sun_dir: Vec3) -> Mat4 {
    const HALF: f32 = 48.0;
    let dir = sun_dir.try_normalize().unwrap_or(Vec3::Y);
    let up = if dir.abs_diff_eq(Vec3::Y, 1e-3) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(dir * 120.0, Vec3::ZERO, up);
    let proj = Mat4::orthographic_rh(-HALF, HALF, -HALF, HALF, 1.0, 260.0);
    proj * view
}
