//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kfleet_menu::{MutationOutcome, Session};
use kfleet_registry::{Device, Registry};
use kfleet_settings::KfleetSettings;
use tracing::info;

/// Load a session for `root`, optionally over a prior profile.
fn open_session(
    settings: &KfleetSettings,
    root: &Path,
    definition: Option<&Path>,
    profile: Option<&Path>,
) -> Result<Session> {
    let mut session = Session::with_root(root, &settings.menu);
    let definition = definition.map_or_else(
        || PathBuf::from(&settings.menu.definition_file),
        Path::to_path_buf,
    );
    session
        .load(&definition, profile)
        .with_context(|| format!("Failed to load {}", definition.display()))?;
    Ok(session)
}

/// Print the projected menu tree as JSON.
pub fn tree(
    settings: &KfleetSettings,
    root: &Path,
    definition: Option<&Path>,
    profile: Option<&Path>,
    show_optional: bool,
) -> Result<()> {
    let session = open_session(settings, root, definition, profile)?;
    let tree = session.get_menu_tree(show_optional)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

/// Split a `NAME=VALUE` argument.
pub fn parse_assignment(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => bail!("expected NAME=VALUE, got '{arg}'"),
    }
}

/// Apply assignments to a profile and save the result.
pub fn set(
    settings: &KfleetSettings,
    root: &Path,
    definition: Option<&Path>,
    profile: &Path,
    output: Option<&Path>,
    assignments: &[String],
) -> Result<()> {
    let assignments = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;

    let mut session = open_session(settings, root, definition, Some(profile))?;
    for (name, value) in &assignments {
        let outcome = session
            .apply(name, value)
            .with_context(|| format!("Invalid value for {name}"))?;
        match outcome {
            MutationOutcome::Assigned { symbol } => println!("{symbol} = {value}"),
            MutationOutcome::Selected { member } => println!("{name}: selected {member}"),
            MutationOutcome::Ignored(reason) => println!("{name}: ignored ({reason:?})"),
        }
    }

    let output = output.unwrap_or(profile);
    session
        .save(output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    info!(path = %output.display(), "profile updated");
    Ok(())
}

/// Print all registered devices.
pub fn fleet_list(registry: &Registry) -> Result<()> {
    let devices = registry.list()?;
    println!("{}", serde_json::to_string_pretty(&devices)?);
    Ok(())
}

/// Register or update a device.
pub fn fleet_add(
    registry: &Registry,
    id: String,
    name: Option<String>,
    profile: Option<String>,
) -> Result<()> {
    let mut device = registry.get(&id)?.unwrap_or_else(|| Device::new(id));
    if name.is_some() {
        device.name = name;
    }
    if profile.is_some() {
        device.profile = profile;
    }
    println!("{}", device.id);
    registry.upsert(device)?;
    Ok(())
}

/// Remove a device.
pub fn fleet_remove(registry: &Registry, id: &str) -> Result<()> {
    if !registry.remove(id)? {
        bail!("no device with id '{id}'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        let (name, value) = parse_assignment("BOARD_NAME=a=b").unwrap();
        assert_eq!(name, "BOARD_NAME");
        assert_eq!(value, "a=b");
        assert_eq!(parse_assignment("X=").unwrap().1, "");
    }

    #[test]
    fn assignment_requires_name_and_equals() {
        assert!(parse_assignment("NO_EQUALS").is_err());
        assert!(parse_assignment("=y").is_err());
    }

    #[test]
    fn fleet_add_merges_into_existing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path()).unwrap();
        fleet_add(&registry, "voron".into(), Some("Voron".into()), None).unwrap();
        fleet_add(&registry, "voron".into(), None, Some("voron.config".into())).unwrap();

        let device = registry.get("voron").unwrap().unwrap();
        assert_eq!(device.name.as_deref(), Some("Voron"));
        assert_eq!(device.profile.as_deref(), Some("voron.config"));
        assert!(fleet_remove(&registry, "voron").is_ok());
        assert!(fleet_remove(&registry, "voron").is_err());
    }

    #[test]
    fn set_writes_output_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("src/Kconfig"),
            "config CANBUS_INTERFACE\n    bool \"CAN bus\"\n",
        )
        .unwrap();
        let profile = dir.path().join("printer.config");
        let output = dir.path().join("out.config");

        set(
            &KfleetSettings::default(),
            dir.path(),
            None,
            &profile,
            Some(&output),
            &["CANBUS_INTERFACE=y".to_string()],
        )
        .unwrap();
        let text = std::fs::read_to_string(output).unwrap();
        assert!(text.contains("CONFIG_CANBUS_INTERFACE=y"));
        assert!(!profile.exists());
    }
}
