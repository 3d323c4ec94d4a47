//! Machine and runner configuration.
//!
//! Both structs deserialize from JSON with every field optional, e.g.
//!
//! ```json
//! { "hz": 60, "seed": 7, "machine": { "baseline_rate": 500, "max_stack_depth": 16 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Nominal instructions per second.
pub const DEFAULT_BASELINE_RATE: u32 = 500;

/// Return addresses the call stack holds before a call overflows it.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 16;

/// Frame rate hosts drive the machine at unless told otherwise.
pub const DEFAULT_HZ: u32 = 60;

/// Per-machine tunables, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Instructions per second; each frame runs `baseline_rate / hz` of them.
    pub baseline_rate: u32,
    pub max_stack_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            baseline_rate: DEFAULT_BASELINE_RATE,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }
}

/// Settings for a host session: the machine plus how it is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub machine: MachineConfig,
    /// Frames per second
    pub hz: u32,
    /// Random generator seed
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            machine: MachineConfig::default(),
            hz: DEFAULT_HZ,
            seed: 0,
        }
    }
}

impl Config {
    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e.to_string()))?;
        Self::from_json(&text)
    }
}

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {0}: {1}")]
    Io(String, String),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
