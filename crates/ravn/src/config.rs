//! Engine configuration.
//!
//! [`EngineConfig`] holds the loop driver's tunables. Every field has a
//! default, so a config file only needs the fields it changes:
//!
//! ```json
//! { "target_fps": 30 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Loop driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// FixedUpdate rate used by [`Engine::run_configured`](crate::engine::Engine::run_configured).
    pub target_fps: f64,
    /// Sampling tick length. Update runs once per tick; it should be finer
    /// than the frame period so FixedUpdate lands close to its target.
    pub sample_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 20.0,
            sample_interval_ms: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Length of one frame at `fps` frames per second.
    pub fn frame_period(fps: f64) -> Duration {
        Duration::from_secs_f64(1.0 / fps)
    }
}

/// Configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
