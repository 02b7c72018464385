#![allow(dead_code)]

//! Shared fixtures for the bridge integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use vrbridge::backends::scripted::{ScriptHandle, ScriptedRuntime};
use vrbridge::{
    ActionManifest, Bridge, BridgeConfig, BridgeEvent, DeviceClass, DeviceDescriptor, FrameSink,
    InputFrame,
};

/// Sink that clones everything it receives into shared buffers.
#[derive(Clone, Default)]
pub struct CollectSink {
    frames: Rc<RefCell<Vec<InputFrame>>>,
    events: Rc<RefCell<Vec<BridgeEvent>>>,
}

impl FrameSink for CollectSink {
    fn on_frame(&mut self, frame: &InputFrame) {
        self.frames.borrow_mut().push(frame.clone());
    }

    fn on_event(&mut self, event: &BridgeEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

impl CollectSink {
    pub fn frames(&self) -> Vec<InputFrame> {
        self.frames.borrow().clone()
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.borrow().clone()
    }

    pub fn poll_errors(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, BridgeEvent::PollError { .. }))
            .count()
    }

    pub fn lost_events(&self) -> Vec<BridgeEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, BridgeEvent::Lost { .. }))
            .collect()
    }
}

pub fn left_controller(serial: &str) -> DeviceDescriptor {
    DeviceDescriptor::new(serial, DeviceClass::LeftHand)
        .with_model("Index Controller (Left)")
        .with_pose()
        .with_button("grip/click")
        .with_button("trigger/click")
        .with_axis("trigger/value")
        .with_axis("thumbstick")
}

pub fn right_controller(serial: &str) -> DeviceDescriptor {
    DeviceDescriptor::new(serial, DeviceClass::RightHand)
        .with_model("Index Controller (Right)")
        .with_pose()
        .with_button("grip/click")
        .with_axis("trigger/value")
}

pub const MANIFEST: &str = r#"{
    "version": 1,
    "actions": [
        { "name": "grab",    "kind": "boolean", "bindings": ["left_hand/grip/click", "right_hand/grip/click"] },
        { "name": "squeeze", "kind": "axis1",   "bindings": ["right_hand/trigger/value"] },
        { "name": "move",    "kind": "axis2",   "bindings": ["left_hand/thumbstick"] }
    ]
}"#;

/// Bridge over a fresh scripted runtime, with a collecting sink attached.
pub fn scripted_bridge(config: BridgeConfig) -> (Bridge, ScriptHandle, CollectSink) {
    let (runtime, script) = ScriptedRuntime::new();
    let manifest = ActionManifest::from_json(MANIFEST).unwrap();
    let mut bridge = Bridge::with_manifest(config, manifest, Box::new(runtime));
    let sink = CollectSink::default();
    bridge.subscribe(sink.clone(), vrbridge::SinkFilter::All);
    (bridge, script, sink)
}
