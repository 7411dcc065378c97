// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Decal-Lite Geometry
//!
//! Projects decals onto arbitrary triangle meshes by clipping them against an
//! oriented box. Surfaces are read through the `MeshSource` trait from
//! `decal-lite-model`, so any mesh container can receive decals.
//!
//! ## Overview
//!
//! - **Projection Volume**: Oriented box around a hit point with six clip planes
//! - **Clipping**: Sutherland-Hodgman polygon clipping with an incidence test
//! - **Mesh Synthesis**: Fan triangulation and planar UV projection
//! - **Welding**: Spatial-hash vertex welding and push along averaged normals
//! - **Combining**: Merging per-surface pieces into decal-local space
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use decal_lite_geometry::{weld_and_push, DecalProjector, ProjectionVolume, Point3, Vector3};
//!
//! let projector = DecalProjector::new(DecalConfig::default())?;
//! let volume = ProjectionVolume::from_hit(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Vector3::z(),
//!     Vector3::y(),
//!     Vector3::new(1.0, 1.0, 0.5),
//!     80.0,
//! )?;
//!
//! let mut decal = projector.project(&volume, &[&floor])?;
//! weld_and_push(&mut decal.mesh, projector.config().push_distance);
//!
//! println!("Generated {} triangles", decal.mesh.triangle_count());
//! ```

pub mod builder;
pub mod clipper;
pub mod combine;
pub mod error;
pub mod polygon;
pub mod projector;
pub mod transform;
pub mod volume;
pub mod weld;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

// Re-export main types
pub use builder::{build_mesh, UvMapping};
pub use clipper::{clip_polygon, clip_surface, clip_to_volume, clip_triangle, PLANE_EPSILON};
pub use combine::{combine, transform_mesh, PartialMesh};
pub use error::{Error, Result};
pub use polygon::{ClipVertex, Polygon, MAX_POLYGON_VERTICES};
pub use projector::{check_surface, DecalProjector, ProjectedDecal, SurfaceRejection};
pub use transform::AffineTransform;
pub use volume::{ClipPlane, ProjectionVolume};
pub use weld::{cluster_vertices, weld_and_push, WELD_EPSILON};
