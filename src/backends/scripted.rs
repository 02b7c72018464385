//! Scripted in-memory runtime.
//!
//! Plays back programmed device state instead of talking to real hardware.
//! The runtime half is handed to the bridge; the cloneable [`ScriptHandle`]
//! stays with the caller, who attaches devices and feeds samples or
//! failures between ticks:
//!
//! ```
//! use vrbridge::backends::scripted::ScriptedRuntime;
//! use vrbridge::{DeviceClass, DeviceDescriptor, RawSample};
//!
//! let (_runtime, script) = ScriptedRuntime::new();
//! script.attach(
//!     DeviceDescriptor::new("LHR-0000", DeviceClass::LeftHand)
//!         .with_pose()
//!         .with_button("grip/click"),
//! );
//! script.set_sample("LHR-0000", RawSample::new().with_button("grip/click", true));
//! ```

use crate::device::DeviceDescriptor;
use crate::runtime::{RawSample, RuntimeError, VrRuntime};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

struct ScriptedDevice {
    descriptor: DeviceDescriptor,
    attached: bool,
    /// One-shot results, drained in order before `steady` applies.
    queue: VecDeque<Result<RawSample, RuntimeError>>,
    /// Returned whenever the queue is empty (held state).
    steady: RawSample,
}

#[derive(Default)]
struct ScriptState {
    devices: Vec<ScriptedDevice>,
}

impl ScriptState {
    fn device_mut(&mut self, hardware_id: &str) -> Option<&mut ScriptedDevice> {
        self.devices
            .iter_mut()
            .find(|d| d.descriptor.hardware_id == hardware_id)
    }
}

/// The runtime half; give this to the bridge.
pub struct ScriptedRuntime {
    state: Rc<RefCell<ScriptState>>,
}

/// The control half; keep this to drive the script.
#[derive(Clone)]
pub struct ScriptHandle {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedRuntime {
    pub fn new() -> (Self, ScriptHandle) {
        let state = Rc::new(RefCell::new(ScriptState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            ScriptHandle { state },
        )
    }
}

impl ScriptHandle {
    /// Attach a device (or update the descriptor of a known one). It will
    /// appear in the next enumeration.
    pub fn attach(&self, descriptor: DeviceDescriptor) {
        let mut state = self.state.borrow_mut();
        if let Some(device) = state.device_mut(&descriptor.hardware_id) {
            device.descriptor = descriptor;
            device.attached = true;
            return;
        }
        state.devices.push(ScriptedDevice {
            descriptor,
            attached: true,
            queue: VecDeque::new(),
            steady: RawSample::default(),
        });
    }

    /// Detach a device; further samples fail with `NotConnected`.
    pub fn detach(&self, hardware_id: &str) {
        if let Some(device) = self.state.borrow_mut().device_mut(hardware_id) {
            device.attached = false;
        }
    }

    /// Set the steady-state sample returned once the one-shot queue drains.
    pub fn set_sample(&self, hardware_id: &str, sample: RawSample) {
        if let Some(device) = self.state.borrow_mut().device_mut(hardware_id) {
            device.steady = sample;
        }
    }

    /// Queue a sample for exactly one poll.
    pub fn push_sample(&self, hardware_id: &str, sample: RawSample) {
        if let Some(device) = self.state.borrow_mut().device_mut(hardware_id) {
            device.queue.push_back(Ok(sample));
        }
    }

    /// Queue a failure for exactly one poll.
    pub fn push_failure(&self, hardware_id: &str, error: RuntimeError) {
        if let Some(device) = self.state.borrow_mut().device_mut(hardware_id) {
            device.queue.push_back(Err(error));
        }
    }
}

impl VrRuntime for ScriptedRuntime {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        self.state
            .borrow()
            .devices
            .iter()
            .filter(|d| d.attached)
            .map(|d| d.descriptor.clone())
            .collect()
    }

    fn sample(&mut self, hardware_id: &str, _budget: Duration) -> Result<RawSample, RuntimeError> {
        let mut state = self.state.borrow_mut();
        let Some(device) = state.device_mut(hardware_id) else {
            return Err(RuntimeError::NotConnected);
        };
        if !device.attached {
            return Err(RuntimeError::NotConnected);
        }
        match device.queue.pop_front() {
            Some(result) => result,
            None => Ok(device.steady.clone()),
        }
    }
}
