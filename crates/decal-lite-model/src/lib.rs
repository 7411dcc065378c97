// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decal-Lite Model - Shared types and collaborator traits for projected decals
//!
//! This crate provides the abstractions the decal kernel and runtime are built
//! against. Host applications implement the traits for their own scene and
//! renderer types, so neither the clipping kernel nor the lifecycle manager
//! depends on a specific engine.
//!
//! # Architecture
//!
//! - [`MeshSource`] - Read-only access to a surface's triangles and transform
//! - [`RenderableSink`] - Receives finished decal meshes and frees them on destroy
//! - [`DecalMesh`] - Flattened vertex/index buffers produced by the kernel
//! - [`DecalConfig`] - Recognized options shared by projector and manager
//!
//! # Example
//!
//! ```ignore
//! use decal_lite_model::{DecalConfig, SurfaceData, SurfaceId};
//!
//! let config = DecalConfig::from_json(r#"{ "max_decals_per_manager": 64 }"#)?;
//! let wall = SurfaceData::new(SurfaceId(7), positions, normals, indices)
//!     .with_tangents(tangents);
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export all public types
pub use config::*;
pub use error::*;
pub use traits::*;
pub use types::*;
