// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented projection volume and its bounding half-spaces

use crate::{Error, Result};
use nalgebra::{Matrix4, Point3, Vector3};

/// Tolerance for unit length and orthogonality of the volume axes
pub const AXIS_TOLERANCE: f32 = 1e-3;

/// One bounding half-space of a projection volume
///
/// The plane is stored relative to an anchor (the volume origin) so signed
/// distances stay precise far away from the world origin. A point is inside
/// when its signed distance is not positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPlane {
    /// Point the distance is measured from
    pub anchor: Point3<f32>,
    /// Outward unit normal
    pub normal: Vector3<f32>,
    /// Signed distance of the plane from the anchor along `normal`
    pub distance: f32,
}

impl ClipPlane {
    pub fn new(anchor: Point3<f32>, normal: Vector3<f32>, distance: f32) -> Self {
        Self {
            anchor,
            normal,
            distance,
        }
    }

    /// Signed distance of `point`, positive outside
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.normal.dot(&(point - self.anchor)) - self.distance
    }
}

/// Oriented box a decal is projected through
///
/// `normal` is the projection axis and points away from the surface being
/// marked. `tangent` and `binormal` span the decal's texture plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionVolume {
    origin: Point3<f32>,
    tangent: Vector3<f32>,
    binormal: Vector3<f32>,
    normal: Vector3<f32>,
    half_extents: Vector3<f32>,
    max_angle_degrees: f32,
    min_cos: f32,
    planes: [ClipPlane; 6],
}

impl ProjectionVolume {
    /// Create a volume from an orthonormal frame
    ///
    /// `half_extents` are measured along tangent, binormal and normal.
    pub fn new(
        origin: Point3<f32>,
        tangent: Vector3<f32>,
        binormal: Vector3<f32>,
        normal: Vector3<f32>,
        half_extents: Vector3<f32>,
        max_angle_degrees: f32,
    ) -> Result<Self> {
        if !origin.coords.iter().all(|v| v.is_finite()) {
            return Err(Error::invalid_volume("origin is not finite"));
        }

        for (name, axis) in [("tangent", &tangent), ("binormal", &binormal), ("normal", &normal)] {
            let len = axis.norm();
            if !len.is_finite() || (len - 1.0).abs() > AXIS_TOLERANCE {
                return Err(Error::invalid_volume(format!(
                    "{name} axis is not unit length ({len})"
                )));
            }
        }

        if tangent.dot(&binormal).abs() > AXIS_TOLERANCE
            || tangent.dot(&normal).abs() > AXIS_TOLERANCE
            || binormal.dot(&normal).abs() > AXIS_TOLERANCE
        {
            return Err(Error::invalid_volume("axes are not orthogonal"));
        }

        if !half_extents.iter().all(|h| *h > 0.0 && h.is_finite()) {
            return Err(Error::invalid_volume(format!(
                "half extents must be positive, got ({}, {}, {})",
                half_extents.x, half_extents.y, half_extents.z
            )));
        }

        if !(0.0..=180.0).contains(&max_angle_degrees) {
            return Err(Error::invalid_volume(format!(
                "max angle {max_angle_degrees} is outside 0..=180"
            )));
        }

        Ok(Self::from_parts(
            origin,
            tangent,
            binormal,
            normal,
            half_extents,
            max_angle_degrees,
        ))
    }

    /// Build a volume around a hit point
    ///
    /// `size` is the full decal size: width along the tangent, height along
    /// the binormal and projection depth along `normal`. The binormal follows
    /// `up_hint` as closely as possible; a hint parallel to the normal is
    /// replaced by a perpendicular world axis.
    pub fn from_hit(
        position: Point3<f32>,
        normal: Vector3<f32>,
        up_hint: Vector3<f32>,
        size: Vector3<f32>,
        max_angle_degrees: f32,
    ) -> Result<Self> {
        let normal = normal
            .try_normalize(f32::EPSILON)
            .ok_or_else(|| Error::invalid_volume("projection normal has zero length"))?;

        let tangent = up_hint
            .cross(&normal)
            .try_normalize(1e-4)
            .or_else(|| {
                let fallback = if normal.y.abs() < 0.9 {
                    Vector3::y()
                } else {
                    Vector3::z()
                };
                fallback.cross(&normal).try_normalize(f32::EPSILON)
            })
            .ok_or_else(|| Error::invalid_volume("cannot derive a tangent from the normal"))?;
        let binormal = normal.cross(&tangent);

        Self::new(
            position,
            tangent,
            binormal,
            normal,
            size * 0.5,
            max_angle_degrees,
        )
    }

    /// Rotate the texture plane around the projection axis
    pub fn with_roll(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let tangent = self.tangent * cos + self.binormal * sin;
        let binormal = self.normal.cross(&tangent);
        Self::from_parts(
            self.origin,
            tangent,
            binormal,
            self.normal,
            self.half_extents,
            self.max_angle_degrees,
        )
    }

    fn from_parts(
        origin: Point3<f32>,
        tangent: Vector3<f32>,
        binormal: Vector3<f32>,
        normal: Vector3<f32>,
        half_extents: Vector3<f32>,
        max_angle_degrees: f32,
    ) -> Self {
        // Every face uses the same rule: outward normal ±axis, distance = half extent
        let planes = [
            ClipPlane::new(origin, normal, half_extents.z),    // front
            ClipPlane::new(origin, -normal, half_extents.z),   // back
            ClipPlane::new(origin, -tangent, half_extents.x),  // left
            ClipPlane::new(origin, tangent, half_extents.x),   // right
            ClipPlane::new(origin, binormal, half_extents.y),  // top
            ClipPlane::new(origin, -binormal, half_extents.y), // bottom
        ];

        Self {
            origin,
            tangent,
            binormal,
            normal,
            half_extents,
            max_angle_degrees,
            min_cos: max_angle_degrees.to_radians().cos(),
            planes,
        }
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    pub fn tangent(&self) -> Vector3<f32> {
        self.tangent
    }

    pub fn binormal(&self) -> Vector3<f32> {
        self.binormal
    }

    /// Projection axis
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    pub fn half_extents(&self) -> Vector3<f32> {
        self.half_extents
    }

    pub fn max_angle_degrees(&self) -> f32 {
        self.max_angle_degrees
    }

    /// The six bounding planes in clipping order: front, back, left, right, top, bottom
    pub fn planes(&self) -> &[ClipPlane; 6] {
        &self.planes
    }

    /// Check a unit face normal against the incidence limit
    #[inline]
    pub fn accepts_normal(&self, face_normal: &Vector3<f32>) -> bool {
        face_normal.dot(&self.normal) >= self.min_cos
    }

    /// Check whether a point lies inside (or on) the box
    pub fn contains(&self, point: &Point3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) <= crate::clipper::PLANE_EPSILON)
    }

    /// Coordinates of `point` along tangent, binormal and normal
    #[inline]
    pub fn local_coordinates(&self, point: &Point3<f32>) -> Vector3<f32> {
        let d = point - self.origin;
        Vector3::new(
            d.dot(&self.tangent),
            d.dot(&self.binormal),
            d.dot(&self.normal),
        )
    }

    /// Decal-local to world transform (rigid)
    pub fn local_to_world(&self) -> Matrix4<f32> {
        let (t, b, n, o) = (self.tangent, self.binormal, self.normal, self.origin);
        Matrix4::new(
            t.x, b.x, n.x, o.x, //
            t.y, b.y, n.y, o.y, //
            t.z, b.z, n.z, o.z, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// World to decal-local transform
    ///
    /// The frame is orthonormal, so the rotation inverts by transposition.
    pub fn world_to_local(&self) -> Matrix4<f32> {
        let (t, b, n) = (self.tangent, self.binormal, self.normal);
        let o = self.origin.coords;
        Matrix4::new(
            t.x, t.y, t.z, -t.dot(&o), //
            b.x, b.y, b.z, -b.dot(&o), //
            n.x, n.y, n.z, -n.dot(&o), //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Column-major decal-local to world transform, as handed to renderers
    pub fn local_to_world_columns(&self) -> [f32; 16] {
        let mut columns = [0.0; 16];
        columns.copy_from_slice(self.local_to_world().as_slice());
        columns
    }
}
