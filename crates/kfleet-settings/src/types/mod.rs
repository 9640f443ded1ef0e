//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production default values,
//! and `#[serde(default)]` lets a partial JSON file fill in only what it
//! changes.

mod fleet;
mod logging;
mod menu;

pub use fleet::*;
pub use logging::*;
pub use menu::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// Loaded from `~/.kfleet/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// ```json
/// {
///   "menu": { "sourceRoot": "/home/pi/klipper", "showOptional": true },
///   "fleet": { "dataDir": "/var/lib/kfleet" },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KfleetSettings {
    /// Settings schema version.
    pub version: String,
    /// Menu engine settings (source tree, definition file, UX policy).
    pub menu: MenuSettings,
    /// Fleet registry settings.
    pub fleet: FleetSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for KfleetSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            menu: MenuSettings::default(),
            fleet: FleetSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Home directory, or `/tmp` when `HOME` is unset.
pub(crate) fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string())
}
