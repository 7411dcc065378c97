// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merging per-surface decal pieces into one mesh

use crate::transform::AffineTransform;
use crate::Result;
use decal_lite_model::{DecalMesh, SurfaceId};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// One contributor to a combined decal
#[derive(Clone, Debug)]
pub struct PartialMesh {
    /// Surface the piece was clipped from
    pub source: SurfaceId,
    /// Geometry in the contributor's own space
    pub mesh: DecalMesh,
    /// Contributor space to decal-local space
    pub to_decal: Matrix4<f32>,
}

impl PartialMesh {
    pub fn new(source: SurfaceId, mesh: DecalMesh, to_decal: Matrix4<f32>) -> Self {
        Self {
            source,
            mesh,
            to_decal,
        }
    }
}

/// Apply an affine transform to every vertex of `mesh` in place
pub fn transform_mesh(mesh: &mut DecalMesh, transform: &AffineTransform) {
    transform_vertices(
        &mut mesh.positions,
        &mut mesh.normals,
        &mut mesh.tangents,
        transform,
    );
}

fn transform_vertices(
    positions: &mut [f32],
    normals: &mut [f32],
    tangents: &mut [f32],
    transform: &AffineTransform,
) {
    for p in positions.chunks_exact_mut(3) {
        let t = transform.transform_point(&Point3::new(p[0], p[1], p[2]));
        p.copy_from_slice(t.coords.as_slice());
    }

    for n in normals.chunks_exact_mut(3) {
        let t = transform.transform_normal(&Vector3::new(n[0], n[1], n[2]));
        n.copy_from_slice(t.as_slice());
    }

    for t in tangents.chunks_exact_mut(4) {
        let r = transform.transform_tangent(&Vector4::new(t[0], t[1], t[2], t[3]));
        t.copy_from_slice(r.as_slice());
    }
}

/// Concatenate contributors into one mesh in decal-local space
///
/// Indices are offset by the running vertex count. Empty contributors are
/// skipped. Fails if a contributor's transform is singular.
pub fn combine(parts: &[PartialMesh]) -> Result<DecalMesh> {
    let (vertex_count, index_count) = parts.iter().fold((0, 0), |(v, i), part| {
        (v + part.mesh.vertex_count(), i + part.mesh.indices.len())
    });

    let mut combined = DecalMesh::with_capacity(vertex_count, index_count);

    for part in parts.iter().filter(|part| !part.mesh.is_empty()) {
        let transform = AffineTransform::new(part.to_decal)?;
        let base = combined.vertex_count();

        combined.merge(&part.mesh);
        transform_vertices(
            &mut combined.positions[base * 3..],
            &mut combined.normals[base * 3..],
            &mut combined.tangents[base * 4..],
            &transform,
        );
    }

    Ok(combined)
}
