//! Action manifest: the on-disk description of logical actions.
//!
//! A manifest is a JSON document supplied by the hosting application. It
//! names each logical action, its value shape, and the physical binding
//! paths that may satisfy it:
//!
//! ```json
//! {
//!   "version": 1,
//!   "actions": [
//!     { "name": "grab",  "kind": "boolean", "bindings": ["left_hand/grip/click", "right_hand/grip/click"] },
//!     { "name": "move",  "kind": "axis2",   "bindings": ["left_hand/thumbstick"] },
//!     { "name": "squeeze", "kind": "axis1", "bindings": ["right_hand/trigger/value"] }
//!   ]
//! }
//! ```
//!
//! A binding path is `<selector>/<control>`: the first segment selects a
//! device (a class token or a hardware id), the rest names a control on it.
//! Manifests are validated on load and immutable afterwards; a manifest that
//! fails to load is fatal to bridge construction.

use crate::device::DeviceClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Value shape of a logical action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Pressed / not pressed; binds button controls.
    Boolean,
    /// Single analog value; binds axis controls, reads the first component.
    Axis1,
    /// Two analog values; binds axis controls.
    Axis2,
}

/// Selects which devices a binding path may resolve against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Any device of the given class.
    Class(DeviceClass),
    /// Exactly the device with this hardware identity.
    Hardware(String),
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(c) => f.write_str(c.token()),
            Self::Hardware(id) => f.write_str(id),
        }
    }
}

/// One parsed binding path (`<selector>/<control>`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BindingPath {
    pub selector: DeviceSelector,
    pub control: String,
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.selector, self.control)
    }
}

impl FromStr for BindingPath {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, tail) = s
            .split_once('/')
            .ok_or_else(|| ManifestError::BadBindingPath(s.to_string()))?;
        if head.is_empty() || tail.is_empty() {
            return Err(ManifestError::BadBindingPath(s.to_string()));
        }
        let selector = match DeviceClass::from_token(head) {
            Some(class) => DeviceSelector::Class(class),
            None => DeviceSelector::Hardware(head.to_string()),
        };
        Ok(Self {
            selector,
            control: tail.to_string(),
        })
    }
}

impl TryFrom<String> for BindingPath {
    type Error = ManifestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BindingPath> for String {
    fn from(path: BindingPath) -> Self {
        path.to_string()
    }
}

/// One logical action: a name, a shape, and candidate bindings in
/// preference order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub kind: ActionKind,
    pub bindings: Vec<BindingPath>,
}

/// Why a manifest could not be loaded.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("binding path {0:?} is not <selector>/<control>")]
    BadBindingPath(String),
    #[error("duplicate action name {0:?}")]
    DuplicateAction(String),
    #[error("action {0:?} has no bindings")]
    NoBindings(String),
}

/// Validated, immutable set of action definitions for a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    pub actions: Vec<ActionSpec>,
}

fn default_version() -> u32 {
    1
}

impl ActionManifest {
    /// Load and validate a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = BTreeSet::new();
        for action in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(ManifestError::DuplicateAction(action.name.clone()));
            }
            if action.bindings.is_empty() {
                return Err(ManifestError::NoBindings(action.name.clone()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
