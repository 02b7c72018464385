//! Frames: the immutable per-tick output of the bridge.
//!
//! Each successful poll of a device produces one [`InputFrame`] carrying the
//! device's pose, the values of every logical action bound to it, and any
//! press/release edges detected since the previous frame. Frames are handed
//! to subscribers by shared reference and must not be mutated.
//!
//! ## Value conventions
//! - Positions are meters in the runtime's tracking space.
//! - Orientations are unit quaternions in `[x, y, z, w]` order.
//! - Scalar axes use `[value, 0.0]`; 2-axis controls use `[x, y]`, each
//!   component in `[-1.0, 1.0]` with up/right positive.

use crate::device::DeviceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// One tracked pose sample.
///
/// `valid` is `false` whenever the sample should not be trusted: the device
/// is not in the `Tracking` state, or the runtime could not produce a pose
/// this tick. Consumers must check it before applying the transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in meters.
    pub position: [f32; 3],
    /// Unit quaternion, `[x, y, z, w]`.
    pub orientation: [f32; 4],
    pub valid: bool,
}

impl Pose {
    /// Identity transform marked invalid. Published when no trustworthy
    /// pose exists for the tick.
    pub fn invalid() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
            valid: false,
        }
    }

    pub fn new(position: [f32; 3], orientation: [f32; 4]) -> Self {
        Self {
            position,
            orientation,
            valid: true,
        }
    }

    /// Copy of this pose with `valid` forced off.
    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Value of one logical action for one device on one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionValue {
    Boolean(bool),
    Axis1(f32),
    Axis2([f32; 2]),
}

impl ActionValue {
    /// Boolean view; analog values are `true` past the 0.5 midpoint.
    pub fn as_bool(&self) -> bool {
        match *self {
            Self::Boolean(v) => v,
            Self::Axis1(v) => v > 0.5,
            Self::Axis2(_) => false,
        }
    }

    pub fn as_axis1(&self) -> f32 {
        match *self {
            Self::Boolean(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Axis1(v) => v,
            Self::Axis2(v) => v[0],
        }
    }
}

/// Direction of a detected boolean-action transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Pressed,
    Released,
}

/// One press/release transition, relative to the device's previous frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEdge {
    pub action: String,
    pub kind: EdgeKind,
}

/// Immutable snapshot of one device for one poll tick.
///
/// `sequence` is per-device and strictly increasing across successive
/// publishes; gaps never occur, but ticks where the device was skipped
/// (backoff, `Lost`) produce no frame at all.
#[derive(Clone, Debug)]
pub struct InputFrame {
    pub device: DeviceId,
    pub sequence: u64,
    /// Capture time (monotonic). Suitable for ordering and delta timing
    /// within a run.
    pub at: Instant,
    pub pose: Pose,
    /// Values for every action currently bound to this device.
    pub actions: BTreeMap<String, ActionValue>,
    /// Boolean-action transitions since this device's previous frame.
    pub edges: Vec<ActionEdge>,
}

impl InputFrame {
    /// Value of a bound action, if present on this device.
    pub fn action(&self, name: &str) -> Option<&ActionValue> {
        self.actions.get(name)
    }

    /// Whether `action` transitioned to pressed on this frame.
    pub fn pressed(&self, action: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.kind == EdgeKind::Pressed && e.action == action)
    }

    /// Whether `action` transitioned to released on this frame.
    pub fn released(&self, action: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.kind == EdgeKind::Released && e.action == action)
    }
}
