//! Process state around definition parsing. Kept in its own test binary,
//! as a single test, so nothing else touches the working directory or the
//! environment concurrently.

use assert_matches::assert_matches;
use kfleet_menu::{MenuError, ParseScope, Session};
use kfleet_settings::MenuSettings;

/// SAFETY: this binary runs a single test, so nothing reads the environment
/// concurrently with these writes.
#[allow(unsafe_code)]
fn seed_env() {
    unsafe {
        std::env::set_var("srctree", "/original/tree");
        std::env::remove_var("SRCTREE");
    }
}

#[test]
fn process_state_restored_around_parses() {
    let cwd = std::env::current_dir().unwrap();
    seed_env();

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    std::fs::create_dir_all(root.join("src")).unwrap();

    // ── held scope ──
    {
        let _scope = ParseScope::enter(&root).unwrap();
        assert_eq!(std::env::current_dir().unwrap().canonicalize().unwrap(), root);
        assert_eq!(std::env::var_os("SRCTREE").unwrap(), root.as_os_str());
        assert_eq!(std::env::var_os("srctree").unwrap(), root.as_os_str());
    }
    assert_eq!(std::env::current_dir().unwrap(), cwd);

    // ── failed parse ──
    std::fs::write(root.join("src/Kconfig"), "menu \"Unterminated\"\n").unwrap();
    let mut session = Session::with_root(&root, &MenuSettings::default());
    assert_matches!(
        session.load("src/Kconfig", None),
        Err(MenuError::ParseFailure(_))
    );
    assert_eq!(std::env::current_dir().unwrap(), cwd);
    assert_eq!(std::env::var("srctree").unwrap(), "/original/tree");
    assert!(std::env::var_os("SRCTREE").is_none());

    // ── successful parse ──
    std::fs::write(root.join("src/Kconfig"), "config A\n    bool \"A\"\n").unwrap();
    session.load("src/Kconfig", None).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), cwd);
    assert_eq!(std::env::var("srctree").unwrap(), "/original/tree");
    assert!(std::env::var_os("SRCTREE").is_none());
}
