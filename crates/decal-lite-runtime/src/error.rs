// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the decal runtime

use decal_lite_model::{ConfigError, SurfaceId};
use thiserror::Error;

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the decal manager
///
/// Empty meshes and a zero capacity are reported through
/// [`RegisterOutcome::Skipped`](crate::RegisterOutcome::Skipped), not here.
#[derive(Error, Debug)]
pub enum Error {
    /// A decal was registered without a material
    #[error("Decal on {parent} has no material")]
    MissingMaterial { parent: SurfaceId },

    /// Decal mesh buffers disagree with each other
    #[error("Malformed decal mesh on {parent}: {reason}")]
    MalformedMesh { parent: SurfaceId, reason: String },

    /// Approximate scale that is not a positive finite number
    #[error("Invalid decal scale {scale} on {parent}")]
    InvalidScale { parent: SurfaceId, scale: f32 },

    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Projection failure (bad volume or transform)
    #[error(transparent)]
    Geometry(#[from] decal_lite_geometry::Error),
}

impl Error {
    /// Create a missing material error
    pub fn missing_material(parent: SurfaceId) -> Self {
        Error::MissingMaterial { parent }
    }

    /// Create a malformed mesh error
    pub fn malformed_mesh(parent: SurfaceId, reason: impl Into<String>) -> Self {
        Error::MalformedMesh {
            parent,
            reason: reason.into(),
        }
    }
}
