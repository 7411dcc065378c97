// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decal Projector - clips a set of surfaces into one decal mesh
//!
//! Filters candidate surfaces, clips the survivors in parallel, synthesizes
//! one partial mesh per surface and combines them into the decal's local
//! space. Welding is left to the caller because the push distance depends on
//! neighboring decals.

use crate::builder::{build_mesh, UvMapping};
use crate::clipper::clip_surface;
use crate::combine::{combine, PartialMesh};
use crate::volume::ProjectionVolume;
use crate::Result;
use decal_lite_model::{DecalConfig, DecalMesh, MeshSource, SurfaceId, SurfaceLayers};
use rayon::prelude::*;
use std::fmt;

/// Why a candidate surface was not clipped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceRejection {
    /// Not on any affected layer
    LayerMasked,
    /// Already a decal mesh
    DecalSurface,
    /// No tangent data
    MissingTangents,
    /// Buffer lengths disagree with the vertex count
    MalformedBuffers,
}

impl fmt::Display for SurfaceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SurfaceRejection::LayerMasked => "layer not affected",
            SurfaceRejection::DecalSurface => "surface is a decal",
            SurfaceRejection::MissingTangents => "surface has no tangents",
            SurfaceRejection::MalformedBuffers => "vertex buffers have mismatched lengths",
        };
        f.write_str(reason)
    }
}

/// Check whether `surface` can receive decals on `layers`
pub fn check_surface(surface: &dyn MeshSource, layers: SurfaceLayers) -> Option<SurfaceRejection> {
    if !surface.layers().intersects(layers) {
        return Some(SurfaceRejection::LayerMasked);
    }

    if surface.is_decal() {
        return Some(SurfaceRejection::DecalSurface);
    }

    let Some(tangents) = surface.tangents() else {
        return Some(SurfaceRejection::MissingTangents);
    };

    let vertex_count = surface.vertex_count();
    if surface.positions().len() % 3 != 0
        || surface.normals().len() != vertex_count * 3
        || tangents.len() != vertex_count * 4
    {
        return Some(SurfaceRejection::MalformedBuffers);
    }

    None
}

/// Result of projecting a decal
#[derive(Clone, Debug, Default)]
pub struct ProjectedDecal {
    /// Combined geometry in decal-local space, not yet pushed off the surface
    pub mesh: DecalMesh,
    /// Surfaces that contributed at least one polygon, in input order
    pub surfaces: Vec<SurfaceId>,
    /// Vertices that survived clipping
    pub clipped_vertex_count: usize,
}

impl ProjectedDecal {
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

/// Builds decal meshes from candidate surfaces
///
/// # Example
///
/// ```ignore
/// use decal_lite_geometry::{DecalProjector, ProjectionVolume};
///
/// let projector = DecalProjector::new(config)?;
/// let volume = ProjectionVolume::from_hit(point, normal, up, size, 80.0)?;
/// let decal = projector.project(&volume, &[&wall, &floor])?;
/// println!("{} triangles", decal.mesh.triangle_count());
/// ```
#[derive(Clone, Debug)]
pub struct DecalProjector {
    config: DecalConfig,
    uv: UvMapping,
}

impl DecalProjector {
    /// Create a projector, validating `config`
    pub fn new(config: DecalConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            log::warn!("rejected decal config: {}", e);
            return Err(e.into());
        }
        let uv = UvMapping::from_config(&config);
        Ok(Self { config, uv })
    }

    pub fn config(&self) -> &DecalConfig {
        &self.config
    }

    pub fn uv_mapping(&self) -> &UvMapping {
        &self.uv
    }

    /// Clip `surfaces` against `volume` and build one decal mesh
    ///
    /// Rejected surfaces are skipped. An empty result is not an error.
    pub fn project(
        &self,
        volume: &ProjectionVolume,
        surfaces: &[&dyn MeshSource],
    ) -> Result<ProjectedDecal> {
        let layers = self.config.affected_layers;

        let pieces: Vec<(SurfaceId, DecalMesh, usize)> = surfaces
            .par_iter()
            .filter_map(|surface| {
                if let Some(reason) = check_surface(*surface, layers) {
                    log::debug!("skipping {}: {}", surface.id(), reason);
                    return None;
                }

                let mut polygons = Vec::new();
                let vertex_count = clip_surface(*surface, volume, &mut polygons);
                if vertex_count < 3 {
                    return None;
                }

                let mesh = build_mesh(&polygons, volume, &self.uv);
                Some((surface.id(), mesh, vertex_count))
            })
            .collect();

        if pieces.is_empty() {
            return Ok(ProjectedDecal::default());
        }

        let to_decal = volume.world_to_local();
        let clipped_vertex_count = pieces.iter().map(|(_, _, count)| count).sum();
        let surfaces = pieces.iter().map(|(id, _, _)| *id).collect();
        let parts: Vec<PartialMesh> = pieces
            .into_iter()
            .map(|(id, mesh, _)| PartialMesh::new(id, mesh, to_decal))
            .collect();

        let mesh = combine(&parts)?;

        log::trace!(
            "projected decal: {} surfaces, {} triangles",
            parts.len(),
            mesh.triangle_count()
        );

        Ok(ProjectedDecal {
            mesh,
            surfaces,
            clipped_vertex_count,
        })
    }
}
