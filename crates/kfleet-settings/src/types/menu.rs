use serde::{Deserialize, Serialize};

use super::home_dir;

/// Menu engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuSettings {
    /// Firmware source tree the definition files live in.
    pub source_root: String,
    /// Root definition file, relative to `source_root`.
    pub definition_file: String,
    /// Script that generates extra definitions, relative to `source_root`.
    pub compat_hook_script: String,
    /// Definition file the script is expected to produce.
    pub compat_hook_output: String,
    /// Symbol name prefixes treated as optional features.
    pub optional_symbol_prefixes: Vec<String>,
    /// Menu prompt text marking an optional-features menu.
    pub optional_menu_marker: String,
    /// Symbols always shown when optional features are requested.
    pub forced_optional_symbols: Vec<String>,
    /// Prefix of profile keys.
    pub config_prefix: String,
    /// Default for the projector's `show_optional` flag.
    pub show_optional: bool,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            source_root: format!("{}/klipper", home_dir()),
            definition_file: "src/Kconfig".to_string(),
            compat_hook_script: "scripts/find-firmware-extras.sh".to_string(),
            compat_hook_output: "src/extras/Kconfig".to_string(),
            optional_symbol_prefixes: vec!["WANT_".to_string(), "CONFIG_WANT_".to_string()],
            optional_menu_marker: "Optional features".to_string(),
            forced_optional_symbols: vec![
                "HAVE_LIMITED_CODE_SIZE".to_string(),
                "LOW_LEVEL_OPTIONS".to_string(),
            ],
            config_prefix: "CONFIG_".to_string(),
            show_optional: false,
        }
    }
}
