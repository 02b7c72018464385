//! Tracked-device model.
//!
//! A *device* here is one tracked endpoint reported by the native runtime:
//! an HMD, a hand controller, or a generic tracker puck. The bridge keeps a
//! table of [`DeviceRecord`]s, one per physical device seen this session.
//!
//! ## Identity
//! The runtime reports devices by an opaque hardware identity string (for
//! OpenVR-style runtimes this is the device serial). The enumerator maps each
//! hardware identity to a [`DeviceId`], a small logical id that:
//! - stays the same across a disconnect/reconnect of the same hardware, and
//! - is never reassigned to different hardware within a session.
//!
//! Consumers should key everything on [`DeviceId`] and treat the hardware
//! identity as diagnostic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable logical id for a tracked device.
///
/// Assigned by the enumerator in discovery order, starting at 0. Ids are
/// session-scoped; do not persist them across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index value (useful for logging and dense per-device tables).
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device:{}", self.0)
    }
}

/// Coarse class of a tracked device.
///
/// Mirrors the runtime's tracked-device roles. Binding paths may select a
/// device by class token (`"hmd"`, `"left_hand"`, `"right_hand"`,
/// `"tracker"`) instead of by hardware identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Hmd,
    LeftHand,
    RightHand,
    Tracker,
}

impl DeviceClass {
    /// Parse a binding-path selector token. Returns `None` for tokens that
    /// are not class names (those are treated as hardware identities).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "hmd" => Some(Self::Hmd),
            "left_hand" => Some(Self::LeftHand),
            "right_hand" => Some(Self::RightHand),
            "tracker" => Some(Self::Tracker),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Hmd => "hmd",
            Self::LeftHand => "left_hand",
            Self::RightHand => "right_hand",
            Self::Tracker => "tracker",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// What a device can report.
///
/// Control names are slash-separated leaf paths relative to the device, e.g.
/// `"trigger/click"` (button) or `"thumbstick"` (axis). Axis controls always
/// report two components; scalar controls leave the second at `0.0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Device reports a 6-DoF pose.
    pub pose: bool,
    /// Button (boolean) control names.
    pub buttons: BTreeSet<String>,
    /// Axis (analog) control names.
    pub axes: BTreeSet<String>,
}

impl Capabilities {
    #[inline]
    pub fn has_button(&self, control: &str) -> bool {
        self.buttons.contains(control)
    }

    #[inline]
    pub fn has_axis(&self, control: &str) -> bool {
        self.axes.contains(control)
    }
}

/// Connection lifecycle of a tracked device.
///
/// ```text
/// Disconnected ──refresh──▶ Connecting ──first good sample──▶ Tracking
///        ▲                      │                                │
///        └──────refresh─────────┴────consecutive failures────▶ Lost
/// ```
///
/// `Lost` devices are skipped by the poll tick until a later refresh
/// re-observes the hardware, which moves them back to `Connecting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Tracking,
    Lost,
}

impl ConnectionState {
    /// Whether the poll tick should sample this device.
    #[inline]
    pub fn pollable(self) -> bool {
        matches!(self, Self::Connecting | Self::Tracking)
    }
}

/// Runtime-reported description of one physical device.
///
/// Built by runtime backends during enumeration. `hardware_id` is the only
/// required identity; `model` is best-effort and for display only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque hardware identity, stable for the physical device.
    pub hardware_id: String,
    pub class: DeviceClass,
    /// Human-readable product name, when the runtime knows one.
    pub model: Option<String>,
    pub capabilities: Capabilities,
}

impl DeviceDescriptor {
    pub fn new(hardware_id: impl Into<String>, class: DeviceClass) -> Self {
        Self {
            hardware_id: hardware_id.into(),
            class,
            model: None,
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_pose(mut self) -> Self {
        self.capabilities.pose = true;
        self
    }

    pub fn with_button(mut self, control: impl Into<String>) -> Self {
        self.capabilities.buttons.insert(control.into());
        self
    }

    pub fn with_axis(mut self, control: impl Into<String>) -> Self {
        self.capabilities.axes.insert(control.into());
        self
    }
}

/// One entry in the bridge's device table.
#[derive(Clone, Debug)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub descriptor: DeviceDescriptor,
    pub state: ConnectionState,
}

impl DeviceRecord {
    /// Convenience accessor for the hardware identity string.
    #[inline]
    pub fn hardware_id(&self) -> &str {
        &self.descriptor.hardware_id
    }

    #[inline]
    pub fn class(&self) -> DeviceClass {
        self.descriptor.class
    }
}
