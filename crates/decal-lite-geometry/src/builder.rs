// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh synthesis from clipped polygons

use crate::polygon::Polygon;
use crate::volume::ProjectionVolume;
use decal_lite_model::{DecalConfig, DecalMesh};
use nalgebra::{Point3, Vector2};

/// How projected coordinates are turned into texture coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvMapping {
    pub tiling: Vector2<f32>,
    pub offset: Vector2<f32>,
    /// Rotation around the decal center (degrees)
    pub rotation_degrees: f32,
}

impl UvMapping {
    pub fn new(tiling: Vector2<f32>, offset: Vector2<f32>, rotation_degrees: f32) -> Self {
        Self {
            tiling,
            offset,
            rotation_degrees,
        }
    }

    pub fn from_config(config: &DecalConfig) -> Self {
        Self::new(
            Vector2::from(config.uv_tiling),
            Vector2::from(config.uv_offset),
            config.uv_rotation_degrees,
        )
    }

    /// Texture coordinate of a world-space point
    pub fn project(&self, volume: &ProjectionVolume, position: &Point3<f32>) -> [f32; 2] {
        UvProjector::new(self, volume).project(position)
    }
}

impl Default for UvMapping {
    fn default() -> Self {
        Self::new(Vector2::new(1.0, 1.0), Vector2::zeros(), 0.0)
    }
}

/// Per-call projection state with the rotation resolved once
struct UvProjector<'a> {
    mapping: &'a UvMapping,
    volume: &'a ProjectionVolume,
    sin: f32,
    cos: f32,
}

impl<'a> UvProjector<'a> {
    fn new(mapping: &'a UvMapping, volume: &'a ProjectionVolume) -> Self {
        let (sin, cos) = mapping.rotation_degrees.to_radians().sin_cos();
        Self {
            mapping,
            volume,
            sin,
            cos,
        }
    }

    #[inline]
    fn project(&self, position: &Point3<f32>) -> [f32; 2] {
        let local = self.volume.local_coordinates(position);
        let extents = self.volume.half_extents();

        // The box face maps onto [-0.5, 0.5]
        let u = local.x / (2.0 * extents.x);
        let v = local.y / (2.0 * extents.y);

        let ru = u * self.cos - v * self.sin + 0.5;
        let rv = u * self.sin + v * self.cos + 0.5;

        [
            ru * self.mapping.tiling.x + self.mapping.offset.x,
            rv * self.mapping.tiling.y + self.mapping.offset.y,
        ]
    }
}

/// Fan-triangulation indices of an `n`-gon, offset by `base`
#[inline]
fn push_fan(indices: &mut Vec<u32>, base: u32, n: usize) {
    for k in 0..n.saturating_sub(2) as u32 {
        indices.push(base);
        indices.push(base + k + 1);
        indices.push(base + k + 2);
    }
}

/// Build a renderable mesh from clipped polygons
///
/// Each polygon becomes a triangle fan anchored at its first vertex and every
/// vertex gets a texture coordinate projected through `volume`. Positions,
/// normals and tangents are copied unchanged. Fewer than three vertices in
/// total yields an empty mesh.
pub fn build_mesh(polygons: &[Polygon], volume: &ProjectionVolume, uv: &UvMapping) -> DecalMesh {
    let (vertex_count, triangle_count) = polygons
        .iter()
        .filter(|p| !p.is_degenerate())
        .fold((0, 0), |(v, t), p| (v + p.len(), t + p.triangle_count()));

    if vertex_count < 3 {
        return DecalMesh::new();
    }

    let projector = UvProjector::new(uv, volume);
    let mut mesh = DecalMesh::with_capacity(vertex_count, triangle_count * 3);

    for polygon in polygons.iter().filter(|p| !p.is_degenerate()) {
        let base = mesh.vertex_count() as u32;

        for vertex in polygon.iter() {
            mesh.push_vertex(
                vertex.position.coords.into(),
                vertex.normal.into(),
                vertex.tangent.into(),
                projector.project(&vertex.position),
            );
        }

        push_fan(&mut mesh.indices, base, polygon.len());
    }

    mesh
}
