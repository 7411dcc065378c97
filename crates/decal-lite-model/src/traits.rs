// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator traits
//!
//! The decal kernel reads scene geometry through [`MeshSource`] and hands
//! finished decals to a [`RenderableSink`]. Both are deliberately narrow so a
//! host can implement them over any engine's renderable and collider types.

use crate::{DecalHandle, DecalMesh, MaterialId, SurfaceId, SurfaceLayers, IDENTITY_TRANSFORM};

/// Read-only access to a surface that decals can be projected onto
///
/// Buffers are flattened: positions and normals hold 3 floats per vertex,
/// tangents hold 4 (xyz + handedness). The surface is never mutated.
///
/// # Example
///
/// ```ignore
/// use decal_lite_model::MeshSource;
///
/// fn describe(surface: &dyn MeshSource) {
///     println!(
///         "{}: {} vertices, {} triangles",
///         surface.id(),
///         surface.vertex_count(),
///         surface.triangle_count()
///     );
/// }
/// ```
pub trait MeshSource: Send + Sync {
    /// Stable identifier of the surface
    fn id(&self) -> SurfaceId;

    /// Vertex positions in surface-local space
    fn positions(&self) -> &[f32];

    /// Vertex normals in surface-local space
    fn normals(&self) -> &[f32];

    /// Vertex tangents, if the surface carries them
    ///
    /// Surfaces without tangents cannot produce lit decals and are skipped.
    fn tangents(&self) -> Option<&[f32]>;

    /// Triangle list indices
    fn indices(&self) -> &[u32];

    /// Surface-local to world transform (column-major)
    fn transform(&self) -> [f32; 16];

    /// Layers the surface belongs to
    fn layers(&self) -> SurfaceLayers {
        SurfaceLayers::DEFAULT
    }

    /// Whether the surface is itself a decal or combined decal mesh
    ///
    /// Such surfaces are never decaled again.
    fn is_decal(&self) -> bool {
        false
    }

    /// Number of vertices
    fn vertex_count(&self) -> usize {
        self.positions().len() / 3
    }

    /// Number of triangles
    fn triangle_count(&self) -> usize {
        self.indices().len() / 3
    }
}

/// A finished decal handed to the renderer
#[derive(Clone, Copy, Debug)]
pub struct DecalRenderable<'a> {
    /// Handle the decal is known by until it is released
    pub handle: DecalHandle,
    /// Geometry in the decal's local space
    pub mesh: &'a DecalMesh,
    /// Material chosen by the host's lookup
    pub material: MaterialId,
    /// Surface the decal should be attached under
    pub parent: SurfaceId,
    /// Decal-local to world transform (column-major)
    pub transform: [f32; 16],
}

/// Renderer-side owner of decal meshes
///
/// `attach` is called once per accepted decal, `release` once when the decal
/// is evicted, superseded or cleared. After `release` the handle is dead.
pub trait RenderableSink {
    /// Display a new decal
    fn attach(&mut self, decal: DecalRenderable<'_>);

    /// Free everything held for `handle`
    fn release(&mut self, handle: DecalHandle);
}

/// Sink that drops everything, for headless use
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderableSink for NullSink {
    fn attach(&mut self, _decal: DecalRenderable<'_>) {}

    fn release(&mut self, _handle: DecalHandle) {}
}

/// Owned surface buffers implementing [`MeshSource`]
#[derive(Clone, Debug)]
pub struct SurfaceData {
    pub id: SurfaceId,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tangents: Option<Vec<f32>>,
    pub indices: Vec<u32>,
    /// Column-major local to world transform
    pub transform: [f32; 16],
    pub layers: SurfaceLayers,
    pub is_decal: bool,
}

impl SurfaceData {
    /// Create surface data with identity transform and no tangents
    pub fn new(id: SurfaceId, positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            id,
            positions,
            normals,
            tangents: None,
            indices,
            transform: IDENTITY_TRANSFORM,
            layers: SurfaceLayers::DEFAULT,
            is_decal: false,
        }
    }

    pub fn with_tangents(mut self, tangents: Vec<f32>) -> Self {
        self.tangents = Some(tangents);
        self
    }

    pub fn with_transform(mut self, transform: [f32; 16]) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_layers(mut self, layers: SurfaceLayers) -> Self {
        self.layers = layers;
        self
    }

    /// Mark the surface as decal output so it is never decaled again
    pub fn as_decal(mut self) -> Self {
        self.is_decal = true;
        self
    }
}

impl MeshSource for SurfaceData {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn positions(&self) -> &[f32] {
        &self.positions
    }

    fn normals(&self) -> &[f32] {
        &self.normals
    }

    fn tangents(&self) -> Option<&[f32]> {
        self.tangents.as_deref()
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn transform(&self) -> [f32; 16] {
        self.transform
    }

    fn layers(&self) -> SurfaceLayers {
        self.layers
    }

    fn is_decal(&self) -> bool {
        self.is_decal
    }
}
