// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex welding and surface offset
//!
//! Decal pieces clipped from different triangles or surfaces share seam
//! vertices that must move together, otherwise pushing each piece along its
//! own normal tears the decal open at the seam.

use decal_lite_model::DecalMesh;
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Vertices closer than this are treated as one
pub const WELD_EPSILON: f32 = 0.001;

type Cell = (i64, i64, i64);

#[inline]
fn cell_of(p: &Point3<f32>) -> Cell {
    (
        (p.x / WELD_EPSILON).floor() as i64,
        (p.y / WELD_EPSILON).floor() as i64,
        (p.z / WELD_EPSILON).floor() as i64,
    )
}

#[inline]
fn read_position(mesh: &DecalMesh, i: usize) -> Point3<f32> {
    Point3::from(mesh.position(i))
}

/// Assign every vertex to a cluster of coincident vertices
///
/// Returns the cluster index of each vertex and the number of clusters.
/// Cluster indices follow first appearance.
pub fn cluster_vertices(mesh: &DecalMesh) -> (Vec<u32>, usize) {
    let count = mesh.vertex_count();
    let mut grid: FxHashMap<Cell, SmallVec<[u32; 4]>> = FxHashMap::default();
    grid.reserve(count);

    let mut clusters = Vec::with_capacity(count);
    let mut cluster_count = 0u32;
    let threshold = WELD_EPSILON * WELD_EPSILON;

    for i in 0..count {
        let p = read_position(mesh, i);
        let (cx, cy, cz) = cell_of(&p);

        let mut found: Option<u32> = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        let q = read_position(mesh, j as usize);
                        if (p - q).norm_squared() <= threshold {
                            found = Some(clusters[j as usize]);
                            break 'search;
                        }
                    }
                }
            }
        }

        let cluster = found.unwrap_or_else(|| {
            cluster_count += 1;
            cluster_count - 1
        });
        clusters.push(cluster);
        grid.entry((cx, cy, cz)).or_default().push(i as u32);
    }

    (clusters, cluster_count as usize)
}

/// Weld coincident vertices and push them off the surface
///
/// Each cluster's normals are averaged to a unit vector and every vertex of
/// the cluster moves `push_distance` along it. Normals, tangents and uvs are
/// left as they are. Clusters whose normals cancel out stay in place.
/// Returns the number of clusters.
pub fn weld_and_push(mesh: &mut DecalMesh, push_distance: f32) -> usize {
    let (clusters, cluster_count) = cluster_vertices(mesh);

    let mut sums = vec![Vector3::<f32>::zeros(); cluster_count];
    for (i, &cluster) in clusters.iter().enumerate() {
        sums[cluster as usize] += Vector3::from(mesh.normal(i));
    }

    let offsets: Vec<Vector3<f32>> = sums
        .iter()
        .map(|sum| {
            sum.try_normalize(f32::EPSILON)
                .map(|n| n * push_distance)
                .unwrap_or_else(Vector3::zeros)
        })
        .collect();

    for (i, &cluster) in clusters.iter().enumerate() {
        let offset = offsets[cluster as usize];
        mesh.positions[i * 3] += offset.x;
        mesh.positions[i * 3 + 1] += offset.y;
        mesh.positions[i * 3 + 2] += offset.z;
    }

    log::trace!(
        "welded {} vertices into {} clusters",
        clusters.len(),
        cluster_count
    );

    cluster_count
}
