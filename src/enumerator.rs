//! Device discovery and the shared device table.
//!
//! [`DeviceEnumerator`] owns the canonical table of known devices. A
//! `refresh` rescans the runtime (typically from a low-frequency timer),
//! assigns logical ids, and reports what changed; the poll tick works from
//! a [`snapshot`] instead of the live table, so a refresh can never observe
//! a half-polled state. All mutation goes through `&mut self` on the host
//! thread — single writer, copy-on-write snapshots for readers.
//!
//! [`snapshot`]: DeviceEnumerator::snapshot

use crate::device::{ConnectionState, DeviceId, DeviceRecord};
use crate::error::BridgeError;
use crate::runtime::VrRuntime;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What a refresh changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshDelta {
    /// Devices that appeared, including known hardware reconnecting.
    pub added: Vec<DeviceId>,
    /// Devices that vanished from the scan.
    pub removed: Vec<DeviceId>,
    /// A still-connected device changed its reported capabilities.
    pub capabilities_changed: bool,
}

impl RefreshDelta {
    /// Whether binding re-resolution is warranted.
    pub fn affects_bindings(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || self.capabilities_changed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && !self.capabilities_changed
    }
}

#[derive(Default)]
pub struct DeviceEnumerator {
    table: Arc<Vec<DeviceRecord>>,
    /// Hardware identity → logical id, for the whole session. Entries are
    /// never removed, which is what keeps ids stable across reconnects and
    /// unused for new hardware.
    ids: HashMap<String, DeviceId>,
    next_index: u32,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan the runtime and reconcile the device table.
    ///
    /// Known hardware keeps its logical id; reappearing devices re-enter
    /// `Connecting`. Hardware missing from the scan is marked
    /// `Disconnected` but its record (and id) stay reserved for the rest
    /// of the session.
    pub fn refresh(&mut self, runtime: &mut dyn VrRuntime) -> RefreshDelta {
        let scan = runtime.enumerate();
        let mut delta = RefreshDelta::default();
        let mut seen: HashSet<DeviceId> = HashSet::new();
        let table = Arc::make_mut(&mut self.table);

        for descriptor in scan {
            let id = match self.ids.get(&descriptor.hardware_id) {
                Some(&id) => id,
                None => {
                    let id = DeviceId::new(self.next_index);
                    self.next_index += 1;
                    self.ids.insert(descriptor.hardware_id.clone(), id);
                    table.push(DeviceRecord {
                        id,
                        descriptor: descriptor.clone(),
                        state: ConnectionState::Connecting,
                    });
                    delta.added.push(id);
                    seen.insert(id);
                    continue;
                }
            };
            seen.insert(id);
            let record = table
                .iter_mut()
                .find(|r| r.id == id)
                .expect("id map and table are reconciled together");
            if record.descriptor.capabilities != descriptor.capabilities {
                delta.capabilities_changed = true;
            }
            record.descriptor = descriptor;
            if !record.state.pollable() {
                record.state = ConnectionState::Connecting;
                delta.added.push(id);
            }
        }

        for record in table.iter_mut() {
            if !seen.contains(&record.id) && record.state != ConnectionState::Disconnected {
                record.state = ConnectionState::Disconnected;
                delta.removed.push(record.id);
            }
        }

        if delta.affects_bindings() {
            log::info!(
                "refresh: {} device(s), +{} -{}",
                table.len(),
                delta.added.len(),
                delta.removed.len()
            );
        }
        delta
    }

    /// Look up a device's current record.
    pub fn resolve(&self, id: DeviceId) -> Result<&DeviceRecord, BridgeError> {
        self.table
            .iter()
            .find(|r| r.id == id)
            .ok_or(BridgeError::DeviceNotFound(id))
    }

    /// Cheap read-only view for the poll tick. Later table mutations do
    /// not affect an already-taken snapshot.
    pub fn snapshot(&self) -> Arc<Vec<DeviceRecord>> {
        Arc::clone(&self.table)
    }

    /// All records, in id order.
    pub fn records(&self) -> &[DeviceRecord] {
        &self.table
    }

    /// Transition a device's connection state (poll tick outcomes).
    pub(crate) fn set_state(&mut self, id: DeviceId, state: ConnectionState) {
        let table = Arc::make_mut(&mut self.table);
        if let Some(record) = table.iter_mut().find(|r| r.id == id) {
            record.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::scripted::ScriptedRuntime;
    use crate::device::{DeviceClass, DeviceDescriptor};

    fn controller(serial: &str) -> DeviceDescriptor {
        DeviceDescriptor::new(serial, DeviceClass::LeftHand)
            .with_pose()
            .with_button("grip/click")
    }

    #[test]
    fn refresh_reports_added_then_removed() {
        let (mut runtime, script) = ScriptedRuntime::new();
        let mut enumerator = DeviceEnumerator::new();

        script.attach(controller("LHR-AAAA"));
        let delta = enumerator.refresh(&mut runtime);
        assert_eq!(delta.added.len(), 1);
        assert!(delta.removed.is_empty());
        let id = delta.added[0];
        assert_eq!(
            enumerator.resolve(id).unwrap().state,
            ConnectionState::Connecting
        );

        script.detach("LHR-AAAA");
        let delta = enumerator.refresh(&mut runtime);
        assert_eq!(delta.removed, vec![id]);
        assert_eq!(
            enumerator.resolve(id).unwrap().state,
            ConnectionState::Disconnected
        );

        // Already disconnected: a further refresh reports nothing.
        assert!(enumerator.refresh(&mut runtime).is_empty());
    }

    #[test]
    fn reconnect_keeps_the_logical_id_and_new_hardware_never_reuses_it() {
        let (mut runtime, script) = ScriptedRuntime::new();
        let mut enumerator = DeviceEnumerator::new();

        script.attach(controller("LHR-AAAA"));
        let first = enumerator.refresh(&mut runtime).added[0];

        script.detach("LHR-AAAA");
        enumerator.refresh(&mut runtime);

        // Different hardware connects while the first is away.
        script.attach(controller("LHR-BBBB"));
        let second = enumerator.refresh(&mut runtime).added[0];
        assert_ne!(first, second);

        // The original hardware returns: same id, Connecting again.
        script.attach(controller("LHR-AAAA"));
        let delta = enumerator.refresh(&mut runtime);
        assert_eq!(delta.added, vec![first]);
        assert_eq!(
            enumerator.resolve(first).unwrap().state,
            ConnectionState::Connecting
        );
    }

    #[test]
    fn capability_change_flags_rebind() {
        let (mut runtime, script) = ScriptedRuntime::new();
        let mut enumerator = DeviceEnumerator::new();

        script.attach(controller("LHR-AAAA"));
        enumerator.refresh(&mut runtime);

        script.attach(controller("LHR-AAAA").with_axis("thumbstick"));
        let delta = enumerator.refresh(&mut runtime);
        assert!(delta.capabilities_changed);
        assert!(delta.added.is_empty());
        assert!(delta.affects_bindings());
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let enumerator = DeviceEnumerator::new();
        assert!(matches!(
            enumerator.resolve(DeviceId::new(7)),
            Err(BridgeError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn snapshots_are_isolated_from_later_writes() {
        let (mut runtime, script) = ScriptedRuntime::new();
        let mut enumerator = DeviceEnumerator::new();

        script.attach(controller("LHR-AAAA"));
        let id = enumerator.refresh(&mut runtime).added[0];
        let snapshot = enumerator.snapshot();

        enumerator.set_state(id, ConnectionState::Tracking);
        assert_eq!(snapshot[0].state, ConnectionState::Connecting);
        assert_eq!(
            enumerator.resolve(id).unwrap().state,
            ConnectionState::Tracking
        );
    }
}
