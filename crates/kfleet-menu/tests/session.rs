//! End-to-end session behaviour against on-disk source trees.

use std::path::Path;

use assert_matches::assert_matches;
use kfleet_kconfig::KconfigError;
use kfleet_menu::{ConfigNode, IgnoreReason, MenuError, MutationOutcome, NodeKind, Session};
use kfleet_settings::MenuSettings;
use proptest::prelude::*;
use tempfile::TempDir;

const KLIPPER: &str = r#"
mainmenu "Klipper Firmware Configuration"

config LOW_LEVEL_OPTIONS
    bool "Enable extra low-level configuration options"

choice
    prompt "Micro-controller Architecture"
    config MACH_AVR
        bool "Atmega AVR"
    config MACH_STM32
        bool "STMicroelectronics STM32"
endchoice

choice
    prompt "Clock Reference"
    config CLOCK_REF_8M
        bool "8 MHz crystal"
endchoice

menu "Communication interface"
config CANBUS_INTERFACE
    bool "CAN bus"
config CANBUS_SPEED
    int "CAN bus speed"
    depends on CANBUS_INTERFACE
    default 1000000
endmenu

config SERIAL
    bool "Serial (on UART)"
    default y
    select SERIAL_HELPER

config SERIAL_HELPER
    bool "Serial helper routines"

config HAVE_GPIO
    bool
    default y

config WANT_GPIO_BITBANGING
    bool "Support GPIO bit-banging devices"
    depends on LOW_LEVEL_OPTIONS
"#;

fn tree_with(definitions: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/Kconfig"), definitions).unwrap();
    dir
}

fn loaded(dir: &Path) -> Session {
    let mut session = Session::with_root(dir, &MenuSettings::default());
    session.load("src/Kconfig", None).unwrap();
    session
}

fn find<'a>(tree: &'a [ConfigNode], name: &str) -> Option<&'a ConfigNode> {
    ConfigNode::find(tree, name)
}

// ── projection ──

#[test]
fn canbus_dependency_scenario() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());

    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "CANBUS_INTERFACE").unwrap().current_value, "n");
    assert!(find(&tree, "CANBUS_SPEED").is_none());

    session.set_value("CANBUS_INTERFACE", "y").unwrap();
    let tree = session.get_menu_tree(false).unwrap();
    let speed = find(&tree, "CANBUS_SPEED").unwrap();
    assert_eq!(speed.kind, NodeKind::Int);
    assert_eq!(speed.current_value, "1000000");
    assert!(speed.visible);

    let out = dir.path().join("out/.config");
    session.save(&out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("CONFIG_CANBUS_INTERFACE=y\n"));
    assert!(text.contains("CONFIG_CANBUS_SPEED=1000000\n"));
}

#[test]
fn ghost_values_are_never_stored() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());

    assert_eq!(
        session.apply("CANBUS_SPEED", "500000").unwrap(),
        MutationOutcome::Ignored(IgnoreReason::Invisible)
    );
    session.set_value("CANBUS_INTERFACE", "y").unwrap();

    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "CANBUS_SPEED").unwrap().current_value, "1000000");
}

#[test]
fn prior_profile_value_stays_inert_while_hidden() {
    let dir = tree_with(KLIPPER);
    let profile = dir.path().join("prior.config");
    std::fs::write(
        &profile,
        "# CONFIG_CANBUS_INTERFACE is not set\nCONFIG_CANBUS_SPEED=5000000\n",
    )
    .unwrap();
    let mut session = Session::with_root(dir.path(), &MenuSettings::default());
    session.load("src/Kconfig", Some(&profile)).unwrap();

    let before = dir.path().join("before.config");
    session.save(&before).unwrap();
    assert_eq!(
        session.apply("CANBUS_SPEED", "9000000").unwrap(),
        MutationOutcome::Ignored(IgnoreReason::Invisible)
    );
    let after = dir.path().join("after.config");
    session.save(&after).unwrap();
    assert_eq!(
        std::fs::read(&before).unwrap(),
        std::fs::read(&after).unwrap()
    );

    session.set_value("CANBUS_INTERFACE", "y").unwrap();
    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "CANBUS_SPEED").unwrap().current_value, "5000000");
}

#[test]
fn redundant_choice_is_kept_hidden() {
    let dir = tree_with(KLIPPER);
    let session = loaded(dir.path());
    let tree = session.get_menu_tree(false).unwrap();

    let clock = tree
        .iter()
        .find(|n| n.prompt == "Clock Reference")
        .unwrap();
    assert_eq!(clock.kind, NodeKind::Choice);
    assert!(!clock.visible);
    assert_eq!(clock.current_value, "CLOCK_REF_8M");

    let arch = tree
        .iter()
        .find(|n| n.prompt == "Micro-controller Architecture")
        .unwrap();
    assert!(arch.visible);
    assert_eq!(arch.choice_members.len(), 2);
}

#[test]
fn promptless_symbols_absent_at_any_setting() {
    let dir = tree_with(KLIPPER);
    let session = loaded(dir.path());
    for show_optional in [false, true] {
        let tree = session.get_menu_tree(show_optional).unwrap();
        assert!(find(&tree, "HAVE_GPIO").is_none());
    }
}

#[test]
fn optional_features_shown_but_still_immutable() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());

    assert!(find(&session.get_menu_tree(false).unwrap(), "WANT_GPIO_BITBANGING").is_none());
    let tree = session.get_menu_tree(true).unwrap();
    assert!(find(&tree, "WANT_GPIO_BITBANGING").unwrap().visible);

    assert_eq!(
        session.apply("WANT_GPIO_BITBANGING", "y").unwrap(),
        MutationOutcome::Ignored(IgnoreReason::Invisible)
    );
}

#[test]
fn selected_symbol_is_readonly() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());

    let tree = session.get_menu_tree(false).unwrap();
    let helper = find(&tree, "SERIAL_HELPER").unwrap();
    assert!(helper.readonly);
    assert_eq!(helper.current_value, "y");

    assert_eq!(
        session.apply("SERIAL_HELPER", "n").unwrap(),
        MutationOutcome::Ignored(IgnoreReason::Readonly)
    );
}

#[test]
fn anonymous_choice_selected_by_synthetic_key() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());

    let tree = session.get_menu_tree(false).unwrap();
    let key = tree
        .iter()
        .find(|n| n.kind == NodeKind::Choice && n.visible)
        .unwrap()
        .name
        .clone();
    assert!(key.starts_with("__choice_"));

    session.set_value(&key, "MACH_STM32").unwrap();
    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, &key).unwrap().current_value, "MACH_STM32");
    assert_eq!(find(&tree, "MACH_STM32").unwrap().current_value, "y");
}

// ── load / save ──

#[test]
fn set_save_reload_round_trip() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());
    session.set_value("CANBUS_INTERFACE", "y").unwrap();
    session.set_value("MACH_AVR", "MACH_STM32").unwrap();
    let profile = dir.path().join(".config");
    session.save(&profile).unwrap();

    let mut fresh = Session::with_root(dir.path(), &MenuSettings::default());
    fresh.load("src/Kconfig", Some(&profile)).unwrap();
    assert_eq!(fresh.profile_path(), Some(profile.as_path()));

    let tree = fresh.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "CANBUS_INTERFACE").unwrap().current_value, "y");
    assert_eq!(find(&tree, "MACH_STM32").unwrap().current_value, "y");
    assert_eq!(find(&tree, "MACH_AVR").unwrap().current_value, "n");
}

#[test]
fn reload_discards_unsaved_edits() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());
    session.set_value("CANBUS_INTERFACE", "y").unwrap();

    session.load("src/Kconfig", None).unwrap();
    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "CANBUS_INTERFACE").unwrap().current_value, "n");
}

#[test]
fn missing_prior_profile_is_ignored() {
    let dir = tree_with(KLIPPER);
    let mut session = Session::with_root(dir.path(), &MenuSettings::default());
    session
        .load("src/Kconfig", Some(&dir.path().join("absent.config")))
        .unwrap();
    assert!(session.is_loaded());
    assert!(session.profile_path().is_none());
}

#[test]
fn invalid_value_is_parse_failure() {
    let dir = tree_with(KLIPPER);
    let mut session = loaded(dir.path());
    assert_matches!(
        session.set_value("CANBUS_INTERFACE", "sometimes"),
        Err(MenuError::ParseFailure(KconfigError::InvalidValue { .. }))
    );
}

#[test]
fn malformed_definitions_fail_with_location() {
    let dir = tree_with("config A\n    bool \"A\"\nmenu \"Open\"\n");
    let mut session = Session::with_root(dir.path(), &MenuSettings::default());
    let err = session.load("src/Kconfig", None).unwrap_err();
    assert_matches!(
        err,
        MenuError::ParseFailure(KconfigError::Syntax { line: 3, .. })
    );
    assert!(!session.is_loaded());
}

#[test]
fn missing_definition_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::with_root(dir.path(), &MenuSettings::default());
    assert_matches!(
        session.load("src/Kconfig", None),
        Err(MenuError::DefinitionNotFound { .. })
    );
}

#[test]
fn sources_resolve_against_the_source_root() {
    let dir = tree_with("mainmenu \"Root\"\nsource \"src/boards/Kconfig\"\n");
    std::fs::create_dir_all(dir.path().join("src/boards")).unwrap();
    std::fs::write(
        dir.path().join("src/boards/Kconfig"),
        "config BOARD_NAME\n    string \"Board\"\n    default \"octopus\"\n",
    )
    .unwrap();

    let session = loaded(dir.path());
    let tree = session.get_menu_tree(false).unwrap();
    assert_eq!(find(&tree, "BOARD_NAME").unwrap().current_value, "octopus");
}

// ── compatibility hook ──

const WITH_EXTRAS: &str = "mainmenu \"Fork\"\nsource \"src/extras/Kconfig\"\n\
    config FORK_OPTION\n    bool \"Fork option\"\n";

fn write_hook(dir: &Path, body: &str) {
    std::fs::create_dir_all(dir.join("scripts")).unwrap();
    std::fs::write(dir.join("scripts/find-firmware-extras.sh"), body).unwrap();
}

#[cfg(unix)]
#[test]
fn hook_generates_missing_extras() {
    let dir = tree_with(WITH_EXTRAS);
    std::fs::create_dir_all(dir.path().join("src/extras")).unwrap();
    write_hook(
        dir.path(),
        "#!/bin/bash\necho -n \"\" > src/extras/Kconfig\n",
    );

    let session = loaded(dir.path());
    assert!(dir.path().join("src/extras/Kconfig").is_file());
    assert!(find(&session.get_menu_tree(false).unwrap(), "FORK_OPTION").is_some());
}

#[cfg(unix)]
#[test]
fn hook_skipped_when_extras_exist() {
    let dir = tree_with(WITH_EXTRAS);
    std::fs::create_dir_all(dir.path().join("src/extras")).unwrap();
    std::fs::write(
        dir.path().join("src/extras/Kconfig"),
        "config EXTRA_SENSOR\n    bool \"Extra sensor\"\n",
    )
    .unwrap();
    write_hook(dir.path(), "#!/bin/bash\nexit 1\n");

    let session = loaded(dir.path());
    assert!(find(&session.get_menu_tree(false).unwrap(), "EXTRA_SENSOR").is_some());
}

#[cfg(unix)]
#[test]
fn failing_hook_falls_back_to_placeholder() {
    let dir = tree_with(WITH_EXTRAS);
    write_hook(dir.path(), "#!/bin/bash\nexit 1\n");

    let session = loaded(dir.path());
    assert!(dir.path().join("src/extras/Kconfig").is_file());
    assert!(session.is_loaded());
}

#[test]
fn stock_tree_without_hook_loads() {
    let dir = tree_with(KLIPPER);
    let session = loaded(dir.path());
    assert!(!dir.path().join("src/extras").exists());
    assert!(session.definition_path().unwrap().ends_with("src/Kconfig"));
}

// ── concurrency ──

#[test]
fn concurrent_loads_see_their_own_trees() {
    let handles: Vec<_> = (0..6)
        .map(|i| {
            std::thread::spawn(move || {
                let name = format!("BOARD_{i}");
                let dir = tree_with("source \"src/board.kconfig\"\n");
                std::fs::write(
                    dir.path().join("src/board.kconfig"),
                    format!("config {name}\n    bool \"Board {i}\"\n"),
                )
                .unwrap();

                let session = Session::with_root(dir.path(), &MenuSettings::default()).shared();
                session.lock().load("src/Kconfig", None).unwrap();
                let tree = session.lock().get_menu_tree(false).unwrap();
                assert_eq!(tree.len(), 1);
                assert_eq!(tree[0].name, name);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ── properties ──

const NAMES: [&str; 9] = [
    "LOW_LEVEL_OPTIONS",
    "MACH_AVR",
    "MACH_STM32",
    "CANBUS_INTERFACE",
    "CANBUS_SPEED",
    "SERIAL",
    "HAVE_GPIO",
    "WANT_GPIO_BITBANGING",
    "NOT_DEFINED",
];

const VALUES: [&str; 5] = ["y", "n", "250000", "MACH_STM32", "MACH_AVR"];

mod proptests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn mutations_of_absent_names_change_nothing(
            ops in prop::collection::vec((0..NAMES.len(), 0..VALUES.len()), 1..12)
        ) {
            let dir = tree_with(KLIPPER);
            let mut session = loaded(dir.path());

            for (n, v) in ops {
                let (name, value) = (NAMES[n], VALUES[v]);
                let tree = session.get_menu_tree(false).unwrap();
                let before = session.graph().unwrap().profile_string();
                let shown = find(&tree, name).is_some();

                match session.set_value(name, value) {
                    Ok(()) | Err(MenuError::ParseFailure(_)) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
                if !shown {
                    prop_assert_eq!(session.graph().unwrap().profile_string(), before);
                }
            }
        }

        #[test]
        fn projected_tree_has_no_promptless_nodes(show_optional in any::<bool>(), enable in any::<bool>()) {
            let dir = tree_with(KLIPPER);
            let mut session = loaded(dir.path());
            if enable {
                session.set_value("LOW_LEVEL_OPTIONS", "y").unwrap();
                session.set_value("CANBUS_INTERFACE", "y").unwrap();
            }
            let tree = session.get_menu_tree(show_optional).unwrap();
            for root in &tree {
                for node in root.walk() {
                    prop_assert!(!node.prompt.is_empty());
                    prop_assert_ne!(node.name.as_str(), "HAVE_GPIO");
                }
            }
        }
    }
}
