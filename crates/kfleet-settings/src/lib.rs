//! # kfleet-settings
//!
//! Layered configuration for the kfleet engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`KfleetSettings::default()`]
//! 2. **User file**: `~/.kfleet/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `KFLEET_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use kfleet_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("Source tree: {}", settings.menu.source_root);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path, validate};
pub use types::{FleetSettings, KfleetSettings, LogLevel, LoggingSettings, MenuSettings};

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`], or explicitly with
/// [`init_settings`] when the caller loads from a non-default path.
static SETTINGS: OnceLock<KfleetSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.kfleet/settings.json` with env var
/// overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> &'static KfleetSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            KfleetSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: KfleetSettings) -> std::result::Result<(), KfleetSettings> {
    SETTINGS.set(settings)
}
