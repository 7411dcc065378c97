// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Affine transforms applied to vertex attributes

use crate::{Error, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};

/// Affine transform with its precomputed normal matrix
///
/// Positions use the full matrix, normals the inverse-transpose of the linear
/// part, tangents the linear part itself (handedness is carried over).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix4<f32>,
    linear: Matrix3<f32>,
    normal: Matrix3<f32>,
}

impl AffineTransform {
    /// Wrap a matrix, failing when its linear part is singular
    pub fn new(matrix: Matrix4<f32>) -> Result<Self> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_transform("matrix has non-finite entries"));
        }

        let linear: Matrix3<f32> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal = linear
            .try_inverse()
            .ok_or_else(|| Error::invalid_transform("linear part is singular"))?
            .transpose();

        Ok(Self {
            matrix,
            linear,
            normal,
        })
    }

    /// Wrap a column-major matrix as stored by [`MeshSource`](decal_lite_model::MeshSource)
    pub fn from_columns(columns: &[f32; 16]) -> Result<Self> {
        Self::new(Matrix4::from_column_slice(columns))
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            linear: Matrix3::identity(),
            normal: Matrix3::identity(),
        }
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    #[inline]
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    /// Transform a normal, renormalizing the result
    #[inline]
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        let n = self.normal * normal;
        n.try_normalize(f32::EPSILON).unwrap_or(n)
    }

    /// Transform a tangent's direction, keeping its handedness in `w`
    #[inline]
    pub fn transform_tangent(&self, tangent: &Vector4<f32>) -> Vector4<f32> {
        let t = self.linear * tangent.xyz();
        let t = t.try_normalize(f32::EPSILON).unwrap_or(t);
        Vector4::new(t.x, t.y, t.z, tangent.w)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}
