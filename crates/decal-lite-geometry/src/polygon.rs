// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex planar polygons carried through the clipper

use nalgebra::{Point3, Vector3, Vector4};
use smallvec::SmallVec;

/// Inline vertex capacity of a [`Polygon`]
///
/// A triangle clipped by the six faces of a box gains at most one vertex per
/// plane, so 9 vertices cover every clipped triangle without spilling.
pub const MAX_POLYGON_VERTICES: usize = 9;

/// Polygon vertex with the attributes interpolated during clipping
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    /// xyz tangent, w handedness
    pub tangent: Vector4<f32>,
}

impl ClipVertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, tangent: Vector4<f32>) -> Self {
        Self {
            position,
            normal,
            tangent,
        }
    }

    /// Linear interpolation of every attribute, `t = 0` yields `self`
    #[inline]
    pub fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
            tangent: self.tangent + (other.tangent - self.tangent) * t,
        }
    }
}

/// Ordered vertex loop of a convex planar face
///
/// Fewer than three vertices means the face was clipped away.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    vertices: SmallVec<[ClipVertex; MAX_POLYGON_VERTICES]>,
}

impl Polygon {
    /// Create an empty polygon
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a polygon from a triangle
    pub fn triangle(a: ClipVertex, b: ClipVertex, c: ClipVertex) -> Self {
        let mut polygon = Self::new();
        polygon.push(a);
        polygon.push(b);
        polygon.push(c);
        polygon
    }

    /// Append a vertex
    #[inline]
    pub fn push(&mut self, vertex: ClipVertex) {
        self.vertices.push(vertex);
    }

    /// Remove all vertices, keeping the storage
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the polygon no longer encloses any area
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    pub fn vertices(&self) -> &[ClipVertex] {
        &self.vertices
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipVertex> {
        self.vertices.iter()
    }

    /// Triangles produced by fan triangulation
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    /// True once the polygon has outgrown its inline storage
    pub fn spilled(&self) -> bool {
        self.vertices.spilled()
    }
}

impl FromIterator<ClipVertex> for Polygon {
    fn from_iter<I: IntoIterator<Item = ClipVertex>>(iter: I) -> Self {
        Self {
            vertices: iter.into_iter().collect(),
        }
    }
}
