// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decal configuration

use crate::{ConfigError, ConfigResult, SurfaceLayers};
use serde::{Deserialize, Serialize};

/// Options shared by the projector and the instance manager
///
/// Missing fields fall back to [`DecalConfig::default`] when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecalConfig {
    /// Triangles whose normal is further than this from the projection axis
    /// are rejected (degrees, 0..=180)
    pub max_angle_degrees: f32,
    /// UV scale applied after projection
    pub uv_tiling: [f32; 2],
    /// UV translation applied after tiling
    pub uv_offset: [f32; 2],
    /// UV rotation around the decal center (degrees)
    pub uv_rotation_degrees: f32,
    /// Offset along the surface normal for an isolated decal
    pub push_distance: f32,
    /// Extra offset stacked on top of the highest overlapping neighbor
    pub push_increment: f32,
    /// Live decal budget of one manager
    pub max_decals_per_manager: usize,
    /// Fraction of the bounding radius inside which an older decal is replaced (0..=1)
    pub separator_factor: f32,
    /// Surface layers decals are projected onto
    pub affected_layers: SurfaceLayers,
}

impl Default for DecalConfig {
    fn default() -> Self {
        Self {
            max_angle_degrees: 90.0,
            uv_tiling: [1.0, 1.0],
            uv_offset: [0.0, 0.0],
            uv_rotation_degrees: 0.0,
            push_distance: 0.009,
            push_increment: 0.001,
            max_decals_per_manager: 128,
            separator_factor: 0.5,
            affected_layers: SurfaceLayers::ALL,
        }
    }
}

impl DecalConfig {
    /// Parse a JSON document and validate it
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: DecalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every option against its accepted range
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=180.0).contains(&self.max_angle_degrees) {
            return Err(ConfigError::out_of_range(
                "max_angle_degrees",
                format!("{} is outside 0..=180", self.max_angle_degrees),
            ));
        }

        if self.uv_tiling.iter().chain(&self.uv_offset).any(|v| !v.is_finite()) {
            return Err(ConfigError::out_of_range(
                "uv_tiling",
                "tiling and offset must be finite",
            ));
        }

        if !self.uv_rotation_degrees.is_finite() {
            return Err(ConfigError::out_of_range(
                "uv_rotation_degrees",
                "rotation must be finite",
            ));
        }

        if !(self.push_distance > 0.0 && self.push_distance.is_finite()) {
            return Err(ConfigError::out_of_range(
                "push_distance",
                format!("{} must be positive", self.push_distance),
            ));
        }

        if !(self.push_increment > 0.0 && self.push_increment.is_finite()) {
            return Err(ConfigError::out_of_range(
                "push_increment",
                format!("{} must be positive", self.push_increment),
            ));
        }

        if !(0.0..=1.0).contains(&self.separator_factor) {
            return Err(ConfigError::out_of_range(
                "separator_factor",
                format!("{} is outside 0..=1", self.separator_factor),
            ));
        }

        Ok(())
    }
}
