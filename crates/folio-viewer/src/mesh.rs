// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CPU-side meshes: the model file format, the procedural street used when no
//! model is configured (or the configured one fails), and the water plane.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Indexed triangle list. This is also the on-disk model format
/// (`{"vertices":[{"pos":..,"normal":..,"color":..}],"indices":[..]}`), as JSON or CBOR.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("reading model: {0}")]
    Io(#[from] std::io::Error),
    #[error("model JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model CBOR: {0}")]
    Cbor(String),
    #[error("model has no triangles")]
    Empty,
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("index {index} out of range for {len} vertices")]
    IndexOutOfRange { index: u32, len: usize },
}

impl MeshData {
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.is_empty() || self.vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(self.indices.len()));
        }
        let len = self.vertices.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= len) {
            return Err(MeshError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Axis-aligned box with flat-shaded faces.
    pub fn push_box(&mut self, center: Vec3, half: Vec3, color: [f32; 3]) {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        for (n, u, v) in FACES {
            let (n, u, v) = (Vec3::from(n), Vec3::from(u), Vec3::from(v));
            let c = center + n * half;
            let du = u * half;
            let dv = v * half;
            let base = self.vertices.len() as u32;
            for p in [c - du - dv, c + du - dv, c + du + dv, c - du + dv] {
                self.vertices.push(Vertex {
                    pos: p.to_array(),
                    normal: n.to_array(),
                    color,
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Square in the XZ plane at height `y`, facing up.
    pub fn plane(half_extent: f32, y: f32, color: [f32; 3]) -> Self {
        let h = half_extent;
        let corners = [[-h, y, -h], [-h, y, h], [h, y, h], [h, y, -h]];
        Self {
            vertices: corners
                .into_iter()
                .map(|pos| Vertex {
                    pos,
                    normal: [0.0, 1.0, 0.0],
                    color,
                })
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Half extent of the water plane; far enough that fog hides the edge.
pub const WATER_HALF_EXTENT: f32 = 400.0;

pub fn water_plane() -> MeshData {
    MeshData::plane(WATER_HALF_EXTENT, 0.0, [0.0, 0.0, 0.0])
}

/// Cheap deterministic hash for building heights and window colours.
fn jitter(i: u32) -> f32 {
    let mut x = i.wrapping_mul(0x9E37_79B9) ^ 0x85EB_CA6B;
    x ^= x >> 15;
    x = x.wrapping_mul(0x2C1B_3C6D);
    x ^= x >> 12;
    (x & 0xFFFF) as f32 / 65535.0
}

/// A short harbour street on a pier: road, kerbs, two rows of buildings and
/// lamp posts. Sits just above the water plane at the origin.
pub fn procedural_street() -> MeshData {
    const PIER: [f32; 3] = [0.28, 0.24, 0.22];
    const ROAD: [f32; 3] = [0.12, 0.12, 0.14];
    const KERB: [f32; 3] = [0.45, 0.44, 0.42];
    const POST: [f32; 3] = [0.08, 0.08, 0.09];
    const LAMP: [f32; 3] = [1.0, 0.85, 0.55];

    let mut mesh = MeshData::default();
    mesh.push_box(Vec3::new(0.0, 0.4, 0.0), Vec3::new(14.0, 0.4, 34.0), PIER);
    mesh.push_box(Vec3::new(0.0, 0.85, 0.0), Vec3::new(3.5, 0.05, 34.0), ROAD);
    for side in [-1.0_f32, 1.0] {
        mesh.push_box(
            Vec3::new(side * 4.6, 0.95, 0.0),
            Vec3::new(1.1, 0.15, 34.0),
            KERB,
        );
        for slot in 0..8_u32 {
            let seed = slot * 2 + u32::from(side > 0.0);
            let height = 3.0 + jitter(seed) * 9.0;
            let depth = 2.6 + jitter(seed + 101) * 1.2;
            let z = -29.75 + slot as f32 * 8.5;
            let tint = 0.35 + jitter(seed + 7) * 0.4;
            let color = [tint, tint * 0.82, tint * 0.7 + 0.08];
            mesh.push_box(
                Vec3::new(side * (9.0 + depth * 0.5), 0.8 + height * 0.5, z),
                Vec3::new(depth * 0.5 + 1.5, height * 0.5, 3.8),
                color,
            );
        }
        for slot in 0..6_u32 {
            let z = -27.5 + slot as f32 * 11.0;
            mesh.push_box(
                Vec3::new(side * 4.0, 2.6, z),
                Vec3::new(0.08, 1.6, 0.08),
                POST,
            );
            mesh.push_box(
                Vec3::new(side * 4.0, 4.3, z),
                Vec3::new(0.25, 0.12, 0.25),
                LAMP,
            );
        }
    }
    mesh
}

/// Load a model file: `.cbor` is decoded with ciborium, anything else as JSON.
pub fn load_mesh(path: &Path) -> Result<MeshData, MeshError> {
    let bytes = std::fs::read(path)?;
    let is_cbor = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cbor"));
    let mesh: MeshData = if is_cbor {
        ciborium::from_reader(bytes.as_slice()).map_err(|e| MeshError::Cbor(e.to_string()))?
    } else {
        serde_json::from_slice(&bytes)?
    };
    mesh.validate()?;
    Ok(mesh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("folio-mesh-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn procedural_street_is_valid_and_above_water() {
        let street = procedural_street();
        street.validate().unwrap();
        assert!(street.triangle_count() > 100);
        assert!(street.vertices.iter().all(|v| v.pos[1] >= 0.0));
    }

    #[test]
    fn json_model_loads() {
        let path = scratch("tri.json");
        std::fs::write(
            &path,
            r#"{"vertices":[
                {"pos":[0,0,0],"normal":[0,1,0],"color":[1,0,0]},
                {"pos":[1,0,0],"normal":[0,1,0],"color":[0,1,0]},
                {"pos":[0,0,1],"normal":[0,1,0],"color":[0,0,1]}],
              "indices":[0,1,2]}"#,
        )
        .unwrap();
        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn cbor_model_loads() {
        let path = scratch("plane.cbor");
        let mut bytes = Vec::new();
        ciborium::into_writer(&MeshData::plane(1.0, 0.0, [1.0; 3]), &mut bytes).unwrap();
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(load_mesh(&path).unwrap().triangle_count(), 2);
    }

    #[test]
    fn bad_models_are_rejected() {
        let mut mesh = MeshData::plane(1.0, 0.0, [1.0; 3]);
        mesh.indices.push(9);
        assert!(matches!(mesh.validate(), Err(MeshError::NotTriangles(7))));
        mesh.indices.extend_from_slice(&[0, 1]);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange { index: 9, len: 4 })
        ));
        assert!(matches!(
            load_mesh(&scratch("missing.json")),
            Err(MeshError::Io(_))
        ));
        assert!(matches!(
            MeshData::default().validate(),
            Err(MeshError::Empty)
        ));
    }
}
