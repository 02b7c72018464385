//! Bridge configuration.
//!
//! Supplied once at initialization (typically from a TOML file next to the
//! hosting application) and immutable for the session:
//!
//! ```toml
//! manifest_path = "config/actions.json"
//! poll_interval_ms = 0        # 0 = sample on every host tick
//! poll_budget_ms = 4
//! failure_threshold = 3
//! backoff_initial_ms = 25
//! backoff_cap_ms = 400
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Action manifest location, resolved by [`Bridge::open`](crate::bridge::Bridge::open).
    pub manifest_path: PathBuf,
    /// Minimum spacing between poll ticks. `0` samples on every host tick.
    pub poll_interval_ms: u64,
    /// Per-device time budget for one native sample call.
    pub poll_budget_ms: u64,
    /// Consecutive failures before a device is marked `Lost`.
    pub failure_threshold: u32,
    /// First retry delay after a failed sample; doubles per failure.
    pub backoff_initial_ms: u64,
    /// Upper bound on the retry delay.
    pub backoff_cap_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("actions.json"),
            poll_interval_ms: 0,
            poll_budget_ms: 4,
            failure_threshold: 3,
            backoff_initial_ms: 25,
            backoff_cap_ms: 400,
        }
    }
}

impl BridgeConfig {
    /// Load from a TOML file. Missing keys fall back to defaults; unknown
    /// keys are rejected (they are almost always typos).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_budget(&self) -> Duration {
        Duration::from_millis(self.poll_budget_ms)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }
}
