// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for decal configuration

use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised when a [`DecalConfig`](crate::DecalConfig) is rejected
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Option outside its accepted range
    #[error("Invalid option `{option}`: {message}")]
    OutOfRange {
        option: &'static str,
        message: String,
    },

    /// Configuration text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an out-of-range error
    pub fn out_of_range(option: &'static str, msg: impl Into<String>) -> Self {
        ConfigError::OutOfRange {
            option,
            message: msg.into(),
        }
    }
}
