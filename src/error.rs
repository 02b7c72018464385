//! Top-level error type.
//!
//! Only setup paths return errors; once a session is running, failures
//! surface as [`BridgeEvent`](crate::event::BridgeEvent)s so the poll tick
//! stays infallible.

use crate::config::ConfigError;
use crate::device::DeviceId;
use crate::manifest::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown device {0}")]
    DeviceNotFound(DeviceId),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
