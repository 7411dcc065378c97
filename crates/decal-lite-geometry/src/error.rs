// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for decal geometry

use decal_lite_model::ConfigError;
use thiserror::Error;

/// Geometry result type
pub type Result<T> = std::result::Result<T, Error>;

/// Caller contract violations
///
/// Degenerate or fully clipped geometry is never an error: it simply produces
/// no polygons.
#[derive(Error, Debug)]
pub enum Error {
    /// Projection volume with bad axes, extents or angle
    #[error("Invalid projection volume: {0}")]
    InvalidVolume(String),

    /// Transform that cannot be applied (singular or non-finite)
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Create an invalid volume error
    pub fn invalid_volume(msg: impl Into<String>) -> Self {
        Error::InvalidVolume(msg.into())
    }

    /// Create an invalid transform error
    pub fn invalid_transform(msg: impl Into<String>) -> Self {
        Error::InvalidTransform(msg.into())
    }
}
