//! Action mapping: manifest resolution and raw-sample translation.
//!
//! Resolution matches every manifest action against the device table and
//! produces a [`BindingTable`]. Actions whose binding paths match nothing
//! are collected as [`UnresolvedBinding`] reports; they never abort
//! resolution of the rest. The bridge re-resolves whenever a refresh
//! changes the device table.
//!
//! Applying the table to a [`RawSample`] is a pure function; the only
//! cross-frame state in this module is [`EdgeDetector`], which remembers
//! the previous tick's boolean values to derive press/release edges.

use crate::device::{DeviceId, DeviceRecord};
use crate::frame::{ActionEdge, ActionValue, EdgeKind};
use crate::manifest::{ActionKind, ActionManifest, DeviceSelector};
use crate::runtime::RawSample;
use std::collections::{BTreeMap, HashMap};

/// An action the resolver could not bind anywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedBinding {
    pub action: String,
    /// The binding paths that were tried, rendered for reporting.
    pub tried: Vec<String>,
}

/// One action bound to one control on one device.
#[derive(Clone, Debug, PartialEq)]
struct BoundAction {
    action: String,
    kind: ActionKind,
    control: String,
}

/// Outcome of resolving a manifest against the current device table.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub table: BindingTable,
    pub unresolved: Vec<UnresolvedBinding>,
}

/// Resolved action bindings, grouped per device.
///
/// Immutable once built; the bridge swaps in a fresh table after each
/// re-resolution instead of editing the current one in place.
#[derive(Clone, Debug, Default)]
pub struct BindingTable {
    by_device: HashMap<DeviceId, Vec<BoundAction>>,
    resolved_actions: usize,
}

impl BindingTable {
    /// Match every manifest action against the device table.
    ///
    /// For each action, every binding path is tried in manifest order and
    /// may bind on every device it matches; the first matching path per
    /// device wins. Button controls satisfy boolean actions, axis controls
    /// satisfy axis1/axis2 — a path naming the wrong control shape does
    /// not resolve. Disconnected devices are invisible here: their
    /// controls cannot satisfy an action.
    pub fn resolve(manifest: &ActionManifest, devices: &[DeviceRecord]) -> Resolution {
        let mut table = BindingTable::default();
        let mut unresolved = Vec::new();

        for spec in &manifest.actions {
            let mut bound_devices: Vec<DeviceId> = Vec::new();

            for path in &spec.bindings {
                for record in devices {
                    if !record.state.pollable() || bound_devices.contains(&record.id) {
                        continue;
                    }
                    let device_matches = match &path.selector {
                        DeviceSelector::Class(class) => record.class() == *class,
                        DeviceSelector::Hardware(id) => record.hardware_id() == id,
                    };
                    if !device_matches {
                        continue;
                    }
                    let caps = &record.descriptor.capabilities;
                    let control_matches = match spec.kind {
                        ActionKind::Boolean => caps.has_button(&path.control),
                        ActionKind::Axis1 | ActionKind::Axis2 => caps.has_axis(&path.control),
                    };
                    if !control_matches {
                        continue;
                    }
                    table.by_device.entry(record.id).or_default().push(BoundAction {
                        action: spec.name.clone(),
                        kind: spec.kind,
                        control: path.control.clone(),
                    });
                    bound_devices.push(record.id);
                }
            }

            if bound_devices.is_empty() {
                unresolved.push(UnresolvedBinding {
                    action: spec.name.clone(),
                    tried: spec.bindings.iter().map(|p| p.to_string()).collect(),
                });
            } else {
                table.resolved_actions += 1;
            }
        }

        Resolution { table, unresolved }
    }

    /// Number of manifest actions that bound on at least one device.
    pub fn resolved_actions(&self) -> usize {
        self.resolved_actions
    }

    /// Whether any action is bound on the given device.
    pub fn binds(&self, device: DeviceId) -> bool {
        self.by_device.contains_key(&device)
    }

    /// Translate a raw sample into logical action values for one device.
    ///
    /// Pure: missing controls read as released / centered rather than
    /// erroring, so a runtime that omits untouched controls still maps.
    pub fn apply(&self, device: DeviceId, raw: &RawSample) -> BTreeMap<String, ActionValue> {
        let mut out = BTreeMap::new();
        let Some(bound) = self.by_device.get(&device) else {
            return out;
        };
        for b in bound {
            let value = match b.kind {
                ActionKind::Boolean => {
                    ActionValue::Boolean(raw.buttons.get(&b.control).copied().unwrap_or(false))
                }
                ActionKind::Axis1 => {
                    ActionValue::Axis1(raw.axes.get(&b.control).map(|v| v[0]).unwrap_or(0.0))
                }
                ActionKind::Axis2 => {
                    ActionValue::Axis2(raw.axes.get(&b.control).copied().unwrap_or([0.0, 0.0]))
                }
            };
            out.insert(b.action.clone(), value);
        }
        out
    }
}

/// Derives press/release edges by comparing boolean action values against
/// the previous tick.
///
/// Unseen `(device, action)` pairs baseline at released, so a button held
/// on the very first frame still produces a press edge. [`forget`] drops a
/// device's baseline when it disconnects; after a reconnect the next frame
/// re-baselines from released.
///
/// [`forget`]: EdgeDetector::forget
#[derive(Debug, Default)]
pub struct EdgeDetector {
    prev: HashMap<(DeviceId, String), bool>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `actions` to the previous tick and record the new state.
    /// Held and idle states produce no edges, only transitions do.
    pub fn detect(
        &mut self,
        device: DeviceId,
        actions: &BTreeMap<String, ActionValue>,
    ) -> Vec<ActionEdge> {
        let mut edges = Vec::new();
        for (name, value) in actions {
            let ActionValue::Boolean(now) = value else {
                continue;
            };
            let key = (device, name.clone());
            let before = self.prev.insert(key, *now).unwrap_or(false);
            match (before, *now) {
                (false, true) => edges.push(ActionEdge {
                    action: name.clone(),
                    kind: EdgeKind::Pressed,
                }),
                (true, false) => edges.push(ActionEdge {
                    action: name.clone(),
                    kind: EdgeKind::Released,
                }),
                _ => {}
            }
        }
        edges
    }

    /// Drop all remembered state for a device.
    pub fn forget(&mut self, device: DeviceId) {
        self.prev.retain(|(id, _), _| *id != device);
    }
}
