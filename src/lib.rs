//! vrbridge — cooperative VR input/pose bridge.
//!
//! Polls a native tracking runtime for controller and tracker state and
//! republishes it as immutable, sequenced [`InputFrame`]s, with raw
//! hardware controls translated into named logical actions through a
//! JSON action manifest.
//!
//! Everything runs on the host thread: the host forwards its per-frame
//! callback to [`Bridge::tick`] and a low-frequency timer to
//! [`Bridge::refresh`]. Consumers register [`FrameSink`]s and receive
//! frames plus structured connect/disconnect/error events.

pub mod backends;
pub mod bridge;
pub mod config;
pub mod device;
pub mod enumerator;
pub mod error;
pub mod event;
pub mod frame;
pub mod manifest;
pub mod mapper;
pub mod publisher;
pub mod runtime;

pub use bridge::Bridge;
pub use config::{BridgeConfig, ConfigError};
pub use device::{
    Capabilities, ConnectionState, DeviceClass, DeviceDescriptor, DeviceId, DeviceRecord,
};
pub use enumerator::{DeviceEnumerator, RefreshDelta};
pub use error::BridgeError;
pub use event::BridgeEvent;
pub use frame::{ActionEdge, ActionValue, EdgeKind, InputFrame, Pose};
pub use manifest::{ActionKind, ActionManifest, ActionSpec, BindingPath, ManifestError};
pub use mapper::{BindingTable, EdgeDetector, Resolution, UnresolvedBinding};
pub use publisher::{FramePublisher, FrameSink, LogSink, SinkFilter, SubscriptionId};
pub use runtime::{RawSample, RuntimeError, VrRuntime};
