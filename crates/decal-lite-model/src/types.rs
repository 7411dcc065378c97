// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types shared between the decal kernel, the runtime and host renderers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Column-major identity matrix
pub const IDENTITY_TRANSFORM: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Type-safe identifier of a source surface (a renderable the host owns)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

impl From<u64> for SurfaceId {
    fn from(id: u64) -> Self {
        SurfaceId(id)
    }
}

/// Identifier of a decal material chosen by the host's material lookup
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Handle to a live decal
///
/// The index addresses a slot in the runtime's mesh pool. The generation is
/// bumped every time the slot is released, so a handle to a destroyed decal
/// never resolves to whatever reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DecalHandle {
    pub index: u32,
    pub generation: u32,
}

impl DecalHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for DecalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decal#{}v{}", self.index, self.generation)
    }
}

/// Bitmask of surface layers a decal may be projected onto
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceLayers(pub u32);

impl SurfaceLayers {
    pub const NONE: Self = Self(0);
    pub const DEFAULT: Self = Self(1);
    pub const ALL: Self = Self(u32::MAX);

    /// Layer mask with only bit `layer` set
    pub const fn layer(layer: u32) -> Self {
        Self(1 << (layer & 31))
    }

    /// Check whether any bit is shared with `other`
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check whether every bit of `other` is set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for SurfaceLayers {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SurfaceLayers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for SurfaceLayers {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Synthesized decal geometry
///
/// Buffers are flattened the way GPU vertex streams expect them. Every vertex
/// has a position, normal, tangent (xyz + handedness) and uv.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecalMesh {
    /// Vertex positions as flattened [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals as flattened [nx, ny, nz, ...]
    pub normals: Vec<f32>,
    /// Vertex tangents as flattened [tx, ty, tz, tw, ...]
    pub tangents: Vec<f32>,
    /// Texture coordinates as flattened [u, v, u, v, ...]
    pub uvs: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl DecalMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create mesh with pre-allocated capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            tangents: Vec::with_capacity(vertex_count * 4),
            uvs: Vec::with_capacity(vertex_count * 2),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check that every buffer agrees with the vertex count
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_buffers(&self) -> Result<(), String> {
        if self.positions.len() % 3 != 0 {
            return Err(format!(
                "{} position floats is not a multiple of 3",
                self.positions.len()
            ));
        }

        let vertex_count = self.vertex_count();
        let expected = [
            ("normals", self.normals.len(), vertex_count * 3),
            ("tangents", self.tangents.len(), vertex_count * 4),
            ("uvs", self.uvs.len(), vertex_count * 2),
        ];
        for (name, len, want) in expected {
            if len != want {
                return Err(format!(
                    "{name} hold {len} floats, expected {want} for {vertex_count} vertices"
                ));
            }
        }

        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "{} indices is not a multiple of 3",
                self.indices.len()
            ));
        }

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!(
                "index {index} out of range for {vertex_count} vertices"
            ));
        }

        Ok(())
    }

    /// Append one vertex
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], tangent: [f32; 4], uv: [f32; 2]) {
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.tangents.extend_from_slice(&tangent);
        self.uvs.extend_from_slice(&uv);
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> [f32; 3] {
        [
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        ]
    }

    /// Normal of vertex `i`
    pub fn normal(&self, i: usize) -> [f32; 3] {
        [self.normals[i * 3], self.normals[i * 3 + 1], self.normals[i * 3 + 2]]
    }

    /// Tangent of vertex `i`
    pub fn tangent(&self, i: usize) -> [f32; 4] {
        [
            self.tangents[i * 4],
            self.tangents[i * 4 + 1],
            self.tangents[i * 4 + 2],
            self.tangents[i * 4 + 3],
        ]
    }

    /// Texture coordinate of vertex `i`
    pub fn uv(&self, i: usize) -> [f32; 2] {
        [self.uvs[i * 2], self.uvs[i * 2 + 1]]
    }

    /// Merge another mesh into this one
    pub fn merge(&mut self, other: &DecalMesh) {
        let vertex_offset = self.vertex_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.tangents.extend_from_slice(&other.tangents);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|i| i + vertex_offset));
    }

    /// Drop all geometry but keep the allocations
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.tangents.clear();
        self.uvs.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> DecalMesh {
        let mut mesh = DecalMesh::with_capacity(4, 6);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.push_vertex([x, y, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [x, y]);
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut combined = quad();
        combined.merge(&quad());

        assert_eq!(combined.vertex_count(), 8);
        assert_eq!(combined.triangle_count(), 4);
        assert_eq!(&combined.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(combined.tangents.len(), 32);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut mesh = quad();
        let capacity = mesh.positions.capacity();
        mesh.clear();

        assert!(mesh.is_empty());
        assert_eq!(mesh.positions.capacity(), capacity);
    }

    #[test]
    fn test_surface_layers() {
        let walls = SurfaceLayers::layer(3);
        let mask = SurfaceLayers::DEFAULT | walls;

        assert!(mask.intersects(walls));
        assert!(mask.contains(SurfaceLayers::DEFAULT));
        assert!(!SurfaceLayers::DEFAULT.intersects(walls));
        assert_eq!(mask & walls, walls);
    }

    #[test]
    fn test_check_buffers() {
        assert!(quad().check_buffers().is_ok());
        assert!(DecalMesh::new().check_buffers().is_ok());

        let mut short_normals = quad();
        short_normals.normals.truncate(3);
        assert!(short_normals.check_buffers().unwrap_err().contains("normals"));

        let mut short_uvs = quad();
        short_uvs.uvs.pop();
        assert!(short_uvs.check_buffers().unwrap_err().contains("uvs"));

        let mut ragged = quad();
        ragged.positions.pop();
        assert!(ragged.check_buffers().is_err());

        let mut partial = quad();
        partial.indices.pop();
        assert!(partial.check_buffers().is_err());

        let mut stray = quad();
        stray.indices[4] = 4;
        assert!(stray.check_buffers().unwrap_err().contains("index 4"));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(DecalHandle::new(3, 2).to_string(), "decal#3v2");
        assert_eq!(SurfaceId(12).to_string(), "surface#12");
    }
}
