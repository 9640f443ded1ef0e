use serde::{Deserialize, Serialize};

use super::home_dir;

/// Fleet registry settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FleetSettings {
    /// Directory holding the registry file and device profiles.
    pub data_dir: String,
    /// Registry file name inside `data_dir`.
    pub fleet_file: String,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            data_dir: format!("{}/.kfleet/data", home_dir()),
            fleet_file: "fleet.json".to_string(),
        }
    }
}
