//! Fleet device records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One configured device.
///
/// Fields the registry does not know about are kept as-is, so files edited
/// by other tools survive a rewrite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path of the device's configuration profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Device with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            profile: None,
            extra: Map::new(),
        }
    }
}
