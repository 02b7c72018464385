//! Native runtime abstraction.
//!
//! [`VrRuntime`] is the seam between the bridge and whatever native tracking
//! stack actually owns the hardware. The bridge only ever calls it from the
//! host's frame tick, so implementations do not need to be thread-safe, but
//! they do need to be *time-bounded*: `sample` receives an explicit budget
//! and must return (with [`RuntimeError::Timeout`]) rather than stall the
//! frame. The bridge turns every error into a structured event and a retry
//! with backoff; it never panics on runtime failures.

use crate::device::DeviceDescriptor;
use crate::frame::Pose;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a native runtime call.
///
/// All variants are transient from the bridge's point of view: the device
/// degrades to `Lost` only after the configured number of consecutive
/// failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The call did not complete within the budget handed to `sample`.
    #[error("native call exceeded its time budget")]
    Timeout,
    /// The runtime no longer considers the device connected.
    #[error("device not connected")]
    NotConnected,
    /// Any other native-side failure, with the runtime's own description.
    #[error("native runtime error: {0}")]
    Native(String),
}

/// Raw state of one device at one instant, before action mapping.
///
/// Keys are control names matching the device's [`Capabilities`]
/// (`crate::device::Capabilities`). Axis values follow the crate-wide
/// convention: `[value, 0.0]` for scalar controls, `[x, y]` for 2-axis ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSample {
    /// Pose for this tick, `None` when the runtime could not produce one.
    pub pose: Option<Pose>,
    pub buttons: BTreeMap<String, bool>,
    pub axes: BTreeMap<String, [f32; 2]>,
}

impl RawSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_button(mut self, control: impl Into<String>, pressed: bool) -> Self {
        self.buttons.insert(control.into(), pressed);
        self
    }

    pub fn with_axis(mut self, control: impl Into<String>, value: [f32; 2]) -> Self {
        self.axes.insert(control.into(), value);
        self
    }

    /// Convenience for scalar axis controls.
    pub fn with_scalar(self, control: impl Into<String>, value: f32) -> Self {
        self.with_axis(control, [value, 0.0])
    }
}

/// Interface to a native tracking runtime.
///
/// Both methods are called from the host thread only. `enumerate` may be
/// slower than a frame (it runs from the low-frequency refresh path);
/// `sample` must honor `budget`.
pub trait VrRuntime {
    /// Report every device the runtime currently considers connected.
    fn enumerate(&mut self) -> Vec<DeviceDescriptor>;

    /// Query the raw state of one device, identified by its hardware id.
    ///
    /// Must complete within `budget`; a stalled native call is reported as
    /// [`RuntimeError::Timeout`], never waited out.
    fn sample(&mut self, hardware_id: &str, budget: Duration) -> Result<RawSample, RuntimeError>;
}
