// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Half-space and volume clipping
//!
//! Sutherland–Hodgman clipping of convex polygons against the six faces of a
//! [`ProjectionVolume`]. All scratch storage is owned by the caller or local
//! to the call, so clipping is re-entrant and can run on any thread.

use crate::polygon::{ClipVertex, Polygon};
use crate::transform::AffineTransform;
use crate::volume::{ClipPlane, ProjectionVolume};
use decal_lite_model::MeshSource;
use nalgebra::{Point3, Vector3, Vector4};

/// Points within this distance of a plane count as lying on it
///
/// Intersection vertices land within this band, which keeps a second clip
/// against the same plane from generating new vertices.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Clip `polygon` against one half-space, writing the kept part into `out`
///
/// `out` is cleared first. Vertices on the plane are kept and never produce
/// an intersection vertex of their own.
pub fn clip_polygon_into(polygon: &Polygon, plane: &ClipPlane, out: &mut Polygon) {
    out.clear();

    let vertices = polygon.vertices();
    let n = vertices.len();

    for i in 0..n {
        let current = &vertices[i];
        let next = &vertices[(i + 1) % n];
        let current_distance = plane.signed_distance(&current.position);
        let next_distance = plane.signed_distance(&next.position);

        if current_distance <= PLANE_EPSILON {
            out.push(*current);
        }

        let straddles = (current_distance < -PLANE_EPSILON && next_distance > PLANE_EPSILON)
            || (current_distance > PLANE_EPSILON && next_distance < -PLANE_EPSILON);
        if straddles {
            let t = current_distance / (current_distance - next_distance);
            out.push(current.lerp(next, t));
        }
    }
}

/// Clip `polygon` against one half-space
pub fn clip_polygon(polygon: &Polygon, plane: &ClipPlane) -> Polygon {
    let mut out = Polygon::new();
    clip_polygon_into(polygon, plane, &mut out);
    out
}

/// Clip a polygon against all six faces of `volume`
///
/// Planes are applied in the fixed order front, back, left, right, top,
/// bottom. Returns an empty polygon as soon as fewer than three vertices
/// survive.
pub fn clip_to_volume(polygon: &Polygon, volume: &ProjectionVolume) -> Polygon {
    if polygon.is_degenerate() {
        return Polygon::new();
    }

    let mut front = polygon.clone();
    let mut back = Polygon::new();

    for plane in volume.planes() {
        clip_polygon_into(&front, plane, &mut back);
        if back.is_degenerate() {
            return Polygon::new();
        }
        std::mem::swap(&mut front, &mut back);
    }

    front
}

/// Unit face normal of a counter-clockwise triangle, `None` when degenerate
#[inline]
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Option<Vector3<f32>> {
    (b - a).cross(&(c - a)).try_normalize(1e-12)
}

/// Clip one triangle against `volume`
///
/// Triangles that are degenerate or face too far away from the projection
/// axis are rejected before clipping.
pub fn clip_triangle(triangle: &[ClipVertex; 3], volume: &ProjectionVolume) -> Polygon {
    let [a, b, c] = triangle;
    match face_normal(&a.position, &b.position, &c.position) {
        Some(normal) if volume.accepts_normal(&normal) => {
            clip_to_volume(&Polygon::triangle(*a, *b, *c), volume)
        }
        _ => Polygon::new(),
    }
}

/// Clip every triangle of `surface` against `volume`
///
/// Surviving polygons are appended to `out` in world space. Returns the total
/// vertex count of the appended polygons, which is what mesh buffers need to
/// be sized for. Triangles referencing missing vertices are skipped, as are
/// surfaces whose transform cannot be inverted.
pub fn clip_surface(
    surface: &dyn MeshSource,
    volume: &ProjectionVolume,
    out: &mut Vec<Polygon>,
) -> usize {
    let transform = match AffineTransform::from_columns(&surface.transform()) {
        Ok(transform) => transform,
        Err(e) => {
            log::debug!("skipping {}: {}", surface.id(), e);
            return 0;
        }
    };

    let reader = VertexReader {
        positions: surface.positions(),
        normals: surface.normals(),
        tangents: surface.tangents(),
        transform: &transform,
    };

    let first_polygon = out.len();
    let mut vertex_count = 0;
    for triangle in surface.indices().chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            reader.vertex(triangle[0]),
            reader.vertex(triangle[1]),
            reader.vertex(triangle[2]),
        ) else {
            continue;
        };

        let polygon = clip_triangle(&[a, b, c], volume);
        if !polygon.is_degenerate() {
            vertex_count += polygon.len();
            out.push(polygon);
        }
    }

    log::trace!(
        "{}: {} polygons, {} vertices after clipping",
        surface.id(),
        out.len() - first_polygon,
        vertex_count
    );

    vertex_count
}

/// Reads surface vertices into world space
struct VertexReader<'a> {
    positions: &'a [f32],
    normals: &'a [f32],
    tangents: Option<&'a [f32]>,
    transform: &'a AffineTransform,
}

impl VertexReader<'_> {
    fn vertex(&self, index: u32) -> Option<ClipVertex> {
        let i = index as usize;
        let p = self.positions.get(i * 3..i * 3 + 3)?;
        let n = self.normals.get(i * 3..i * 3 + 3)?;
        let t = match self.tangents {
            Some(tangents) => {
                let t = tangents.get(i * 4..i * 4 + 4)?;
                Vector4::new(t[0], t[1], t[2], t[3])
            }
            None => Vector4::zeros(),
        };

        Some(ClipVertex::new(
            self.transform.transform_point(&Point3::new(p[0], p[1], p[2])),
            self.transform.transform_normal(&Vector3::new(n[0], n[1], n[2])),
            self.transform.transform_tangent(&t),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_mesh, UvMapping};
    use approx::assert_relative_eq;
    use decal_lite_model::{SurfaceData, SurfaceId};

    fn vertex(x: f32, y: f32, z: f32) -> ClipVertex {
        ClipVertex::new(
            Point3::new(x, y, z),
            Vector3::z(),
            Vector4::new(1.0, 0.0, 0.0, 1.0),
        )
    }

    fn volume(half: f32, max_angle: f32) -> ProjectionVolume {
        ProjectionVolume::new(
            Point3::origin(),
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            Vector3::new(half, half, half),
            max_angle,
        )
        .unwrap()
    }

    #[test]
    fn test_triangle_inside_is_unchanged() {
        let triangle = [
            vertex(-0.2, -0.2, 0.0),
            vertex(0.3, -0.1, 0.0),
            vertex(0.0, 0.4, 0.0),
        ];

        let clipped = clip_triangle(&triangle, &volume(1.0, 90.0));
        assert_eq!(clipped.vertices(), &triangle[..]);
    }

    #[test]
    fn test_triangle_outside_one_plane_is_empty() {
        // Entirely to the right of the box
        let triangle = [
            vertex(1.5, -0.2, 0.0),
            vertex(2.0, -0.1, 0.0),
            vertex(1.8, 0.4, 0.0),
        ];

        let clipped = clip_triangle(&triangle, &volume(1.0, 90.0));
        assert_eq!(clipped.len(), 0);

        // Entirely behind the box
        let behind = [
            vertex(-0.2, -0.2, -3.0),
            vertex(0.3, -0.1, -3.0),
            vertex(0.0, 0.4, -3.0),
        ];
        assert!(clip_triangle(&behind, &volume(1.0, 90.0)).is_empty());
    }

    #[test]
    fn test_clip_is_idempotent() {
        let polygon = Polygon::triangle(
            vertex(-1.0, -1.0, 0.0),
            vertex(2.0, -1.0, 0.0),
            vertex(-1.0, 2.0, 0.0),
        );
        let plane = ClipPlane::new(Point3::origin(), Vector3::x(), 0.5);

        let once = clip_polygon(&polygon, &plane);
        let twice = clip_polygon(&once, &plane);

        assert_eq!(once.len(), 4);
        assert_eq!(twice.len(), once.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a.position, b.position);
        }
    }

    #[test]
    fn test_vertex_on_plane_is_not_duplicated() {
        let polygon = Polygon::triangle(
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
            vertex(0.0, 1.0, 0.0),
        );
        // Plane x = 1 passes exactly through the second vertex
        let plane = ClipPlane::new(Point3::origin(), Vector3::x(), 1.0);

        let clipped = clip_polygon(&polygon, &plane);
        assert_eq!(clipped.len(), 3);
        assert_eq!(clipped.vertices(), polygon.vertices());
    }

    #[test]
    fn test_intersection_interpolates_attributes() {
        let a = ClipVertex::new(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::z(),
            Vector4::new(1.0, 0.0, 0.0, 1.0),
        );
        let b = ClipVertex::new(
            Point3::new(2.0, 0.0, 0.0),
            Vector3::y(),
            Vector4::new(0.0, 1.0, 0.0, 1.0),
        );
        let c = vertex(0.0, 2.0, 0.0);
        let plane = ClipPlane::new(Point3::origin(), Vector3::x(), 1.0);

        let clipped = clip_polygon(&Polygon::triangle(a, b, c), &plane);
        let hit = clipped
            .iter()
            .find(|v| (v.position.x - 1.0).abs() < 1e-6 && v.position.y.abs() < 1e-6)
            .unwrap();

        assert_relative_eq!(hit.normal, Vector3::new(0.0, 0.5, 0.5));
        assert_relative_eq!(hit.tangent, Vector4::new(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn test_unit_square_in_double_volume() {
        let square: Polygon = [
            vertex(-0.5, -0.5, 0.0),
            vertex(0.5, -0.5, 0.0),
            vertex(0.5, 0.5, 0.0),
            vertex(-0.5, 0.5, 0.0),
        ]
        .into_iter()
        .collect();

        let volume = volume(1.0, 90.0);
        let clipped = clip_to_volume(&square, &volume);
        assert_eq!(clipped.len(), 4);

        let mesh = build_mesh(&[clipped], &volume, &UvMapping::default());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_large_triangle_is_cut_to_box() {
        let triangle = [
            vertex(-10.0, -10.0, 0.0),
            vertex(10.0, -10.0, 0.0),
            vertex(0.0, 10.0, 0.0),
        ];
        let volume = volume(1.0, 90.0);

        let clipped = clip_triangle(&triangle, &volume);
        assert_eq!(clipped.len(), 4);
        for v in clipped.iter() {
            assert!(volume.contains(&v.position));
        }
    }

    #[test]
    fn test_oblique_triangle_rejected() {
        // Faces along +x, perpendicular to the projection axis
        let triangle = [
            vertex(0.0, -0.5, -0.5),
            vertex(0.0, 0.5, -0.5),
            vertex(0.0, 0.0, 0.5),
        ];

        assert!(clip_triangle(&triangle, &volume(1.0, 60.0)).is_empty());
        assert_eq!(clip_triangle(&triangle, &volume(1.0, 90.0)).len(), 3);
    }

    #[test]
    fn test_back_facing_triangle_rejected() {
        let triangle = [
            vertex(0.0, 0.0, 0.0),
            vertex(0.0, 0.5, 0.0),
            vertex(0.5, 0.0, 0.0),
        ];
        assert!(clip_triangle(&triangle, &volume(1.0, 89.0)).is_empty());
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let triangle = [
            vertex(0.0, 0.0, 0.0),
            vertex(0.5, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
        ];
        assert!(clip_triangle(&triangle, &volume(1.0, 180.0)).is_empty());
    }

    #[test]
    fn test_clip_surface_counts_vertices_and_skips_bad_indices() {
        let surface = SurfaceData::new(
            SurfaceId(9),
            vec![
                -4.0, -4.0, 0.0, //
                4.0, -4.0, 0.0, //
                4.0, 4.0, 0.0, //
                -4.0, 4.0, 0.0,
            ],
            [0.0, 0.0, 1.0].repeat(4),
            vec![0, 1, 2, 0, 2, 3, 0, 2, 99],
        )
        .with_tangents([1.0, 0.0, 0.0, 1.0].repeat(4));

        let mut polygons = Vec::new();
        let count = clip_surface(&surface, &volume(1.0, 90.0), &mut polygons);

        assert_eq!(polygons.len(), 2);
        assert_eq!(count, polygons.iter().map(Polygon::len).sum::<usize>());
        for polygon in &polygons {
            for v in polygon.iter() {
                assert!(v.position.x.abs() <= 1.0 + 1e-5);
                assert!(v.position.y.abs() <= 1.0 + 1e-5);
            }
        }
    }

    #[test]
    fn test_clip_surface_applies_transform() {
        let mut transform = decal_lite_model::IDENTITY_TRANSFORM;
        transform[12] = 10.0;

        let surface = SurfaceData::new(
            SurfaceId(3),
            vec![-0.2, -0.2, 0.0, 0.2, -0.2, 0.0, 0.0, 0.2, 0.0],
            [0.0, 0.0, 1.0].repeat(3),
            vec![0, 1, 2],
        )
        .with_transform(transform);

        let mut polygons = Vec::new();
        assert_eq!(clip_surface(&surface, &volume(1.0, 90.0), &mut polygons), 0);
        assert!(polygons.is_empty());
    }
}
