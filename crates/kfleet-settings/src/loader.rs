//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`KfleetSettings::default()`]
//! 2. If `~/.kfleet/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{home_dir, KfleetSettings, LogLevel};

/// Resolve the path to the settings file (`~/.kfleet/settings.json`).
pub fn settings_path() -> PathBuf {
    PathBuf::from(home_dir()).join(".kfleet").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<KfleetSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, or the merged settings fail validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<KfleetSettings> {
    let defaults = serde_json::to_value(KfleetSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: KfleetSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
pub fn apply_env_overrides(settings: &mut KfleetSettings) {
    // ── Menu settings ───────────────────────────────────────────────
    if let Some(v) = read_env_string("KFLEET_SOURCE_ROOT") {
        settings.menu.source_root = v;
    }
    if let Some(v) = read_env_bool("KFLEET_SHOW_OPTIONAL") {
        settings.menu.show_optional = v;
    }
    if let Some(v) = read_env_string("KFLEET_CONFIG_PREFIX") {
        settings.menu.config_prefix = v;
    }

    // ── Fleet settings ──────────────────────────────────────────────
    if let Some(v) = read_env_string("KFLEET_DATA_DIR") {
        settings.fleet.data_dir = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_level("KFLEET_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Reject settings the engine cannot work with.
pub fn validate(settings: &KfleetSettings) -> Result<()> {
    if settings.menu.definition_file.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "menu.definitionFile is empty".to_string(),
        ));
    }
    if settings.menu.config_prefix.is_empty() {
        return Err(SettingsError::InvalidValue(
            "menu.configPrefix is empty".to_string(),
        ));
    }
    if settings.fleet.fleet_file.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "fleet.fleetFile is empty".to_string(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_level(name: &str) -> Option<LogLevel> {
    let val = std::env::var(name).ok()?;
    let result = LogLevel::parse(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid log level env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
