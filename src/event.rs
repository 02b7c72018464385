//! Discrete bridge events.
//!
//! Everything that is not a frame reaches subscribers through
//! [`BridgeEvent`]: connection lifecycle, poll failures, and binding
//! resolution outcomes. Errors are surfaced this way rather than thrown
//! across the host's frame boundary, so a failing device never aborts the
//! tick for the others.

use crate::device::{DeviceClass, DeviceId};
use crate::mapper::UnresolvedBinding;
use crate::runtime::RuntimeError;

#[derive(Clone, Debug, PartialEq)]
pub enum BridgeEvent {
    /// A device appeared (or reappeared) in a refresh.
    Connected { device: DeviceId, class: DeviceClass },
    /// A device vanished from a refresh scan.
    Disconnected { device: DeviceId },
    /// A device exceeded the consecutive-failure threshold and was marked
    /// `Lost`. Fires exactly once per loss.
    Lost { device: DeviceId, failures: u32 },
    /// One native sample call failed; the device stays polled (with
    /// backoff) until it recovers or degrades to `Lost`.
    PollError {
        device: DeviceId,
        error: RuntimeError,
    },
    /// Binding resolution ran against a changed device table.
    BindingsResolved {
        resolved: usize,
        unresolved: Vec<UnresolvedBinding>,
    },
}

impl BridgeEvent {
    /// The device this event concerns, when it concerns exactly one.
    pub fn device(&self) -> Option<DeviceId> {
        match self {
            Self::Connected { device, .. }
            | Self::Disconnected { device }
            | Self::Lost { device, .. }
            | Self::PollError { device, .. } => Some(*device),
            Self::BindingsResolved { .. } => None,
        }
    }
}
