// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Decal-Lite Runtime
//!
//! Bounded lifetime management for projected decals. The [`DecalManager`]
//! owns every live decal mesh, replaces decals stamped on top of each other,
//! offsets overlapping ones so they layer cleanly, and evicts the oldest once
//! its budget is used up. Meshes reach the renderer through the
//! `RenderableSink` trait from `decal-lite-model`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use decal_lite_runtime::{DecalHit, DecalManager};
//! use decal_lite_model::{DecalConfig, MaterialId, NullSink};
//!
//! let mut manager = DecalManager::new(DecalConfig::default(), NullSink)?;
//!
//! let hit = DecalHit::new(point, normal, wall.id())
//!     .with_direction(ray_direction)
//!     .with_material(MaterialId(4));
//! let outcome = manager.spawn(&hit, &[&wall])?;
//!
//! println!("{} live decals", manager.len());
//! ```

pub mod error;
pub mod hit;
pub mod manager;
pub mod pool;
pub mod registry;

pub use error::{Error, Result};
pub use hit::DecalHit;
pub use manager::{DecalCandidate, DecalManager, RegisterOutcome, Registration, SkipReason};
pub use pool::MeshPool;
pub use registry::{DecalInstance, DecalRegistry};
