// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hit description used to spawn a decal

use decal_lite_geometry::{ProjectionVolume, Result};
use decal_lite_model::{MaterialId, SurfaceId};
use nalgebra::{Point3, Vector3};

/// Where and how a decal should be spawned
///
/// Filled in by the host from a raycast hit and its surface/material lookup.
///
/// # Example
///
/// ```ignore
/// let hit = DecalHit::new(point, normal, SurfaceId(3))
///     .with_direction(ray.direction)
///     .with_size(Vector3::new(0.2, 0.2, 0.1))
///     .with_material(MaterialId(12));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecalHit {
    /// World-space hit point
    pub position: Point3<f32>,
    /// Surface normal at the hit
    pub normal: Vector3<f32>,
    /// Incoming direction; the decal projects against it when present
    pub direction: Option<Vector3<f32>>,
    /// Preferred texture "up"
    pub up: Vector3<f32>,
    /// Width, height and projection depth
    pub size: Vector3<f32>,
    /// Rotation around the projection axis (degrees)
    pub roll_degrees: f32,
    pub material: Option<MaterialId>,
    pub parent: SurfaceId,
}

impl DecalHit {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, parent: SurfaceId) -> Self {
        Self {
            position,
            normal,
            direction: None,
            up: Vector3::y(),
            size: Vector3::new(1.0, 1.0, 1.0),
            roll_degrees: 0.0,
            material: None,
            parent,
        }
    }

    pub fn with_direction(mut self, direction: Vector3<f32>) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_up(mut self, up: Vector3<f32>) -> Self {
        self.up = up;
        self
    }

    pub fn with_size(mut self, size: Vector3<f32>) -> Self {
        self.size = size;
        self
    }

    pub fn with_roll(mut self, degrees: f32) -> Self {
        self.roll_degrees = degrees;
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Axis the volume projects along, pointing out of the surface
    pub fn projection_axis(&self) -> Vector3<f32> {
        self.direction.map_or(self.normal, |d| -d)
    }

    /// Scale used for the decal's bounding radius
    pub fn approx_scale(&self) -> f32 {
        self.size.x.max(self.size.y)
    }

    /// Projection volume around the hit
    pub fn volume(&self, max_angle_degrees: f32) -> Result<ProjectionVolume> {
        let volume = ProjectionVolume::from_hit(
            self.position,
            self.projection_axis(),
            self.up,
            self.size,
            max_angle_degrees,
        )?;
        Ok(volume.with_roll(self.roll_degrees))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_axis() {
        let hit = DecalHit::new(Point3::origin(), Vector3::z(), SurfaceId(1));
        assert_eq!(hit.projection_axis(), Vector3::z());

        let angled = hit.with_direction(Vector3::new(0.0, -1.0, -1.0));
        assert_eq!(angled.projection_axis(), Vector3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_volume_from_hit() {
        let hit = DecalHit::new(Point3::new(1.0, 2.0, 3.0), Vector3::z(), SurfaceId(1))
            .with_size(Vector3::new(0.4, 0.2, 0.1))
            .with_direction(Vector3::new(0.0, 0.0, -2.0));

        let volume = hit.volume(60.0).unwrap();

        assert_eq!(volume.origin(), Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(volume.normal(), Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(volume.half_extents(), Vector3::new(0.2, 0.1, 0.05), epsilon = 1e-6);
        assert_relative_eq!(hit.approx_scale(), 0.4);
    }

    #[test]
    fn test_zero_normal_rejected() {
        let hit = DecalHit::new(Point3::origin(), Vector3::zeros(), SurfaceId(1));
        assert!(hit.volume(90.0).is_err());
    }
}
