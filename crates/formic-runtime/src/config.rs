#![forbid(unsafe_code)]

//! Manager configuration as data, loadable from TOML.
//!
//! ```toml
//! # formic.toml
//! cache_capacity = 8
//! start_of_serial_id = 1000
//! ```
//!
//! Every field has a default, so `ManagerConfig::default()` matches the
//! built-in behavior and partial files work.
//!
//! # Hot reload
//!
//! Re-applying a config at runtime (`FormManager::apply_config`) follows
//! two rules:
//!
//! - a *decrease* of `cache_capacity` triggers immediate eviction;
//! - `start_of_serial_id` is a floor that may only be raised. A reload
//!   that tries to lower it below serials already handed out is ignored
//!   (with a warning), so serial ids never collide.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use formic_core::SerialId;

/// Tunable parameters of the form manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Maximum closed forms kept for reuse. Zero disables the cache:
    /// forms release immediately on close.
    pub cache_capacity: usize,

    /// Floor for allocated serial ids. May only be raised at runtime.
    pub start_of_serial_id: SerialId,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 16,
            start_of_serial_id: 1,
        }
    }
}

impl ManagerConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}

/// Errors loading a [`ManagerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML did not parse or did not match the schema.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}
