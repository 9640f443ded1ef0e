//! Process-wide parse scope.
//!
//! Definition parsing resolves `source` paths against the working directory
//! and the `srctree` environment variables, which are process-global. A
//! [`ParseScope`] serializes all parses behind one lock, points that state
//! at the source root, and puts it back when dropped: on success, on error
//! and during unwinding.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use parking_lot::{const_mutex, Mutex, MutexGuard};
use tracing::{debug, warn};

static PARSE_LOCK: Mutex<()> = const_mutex(());

const SOURCE_TREE_VARS: [&str; 2] = ["SRCTREE", "srctree"];

/// RAII guard over process state during a parse.
pub struct ParseScope {
    saved_cwd: PathBuf,
    saved_env: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ParseScope {
    /// Take the parse lock and switch process state to `root`, which
    /// should be absolute.
    pub fn enter(root: &Path) -> std::io::Result<Self> {
        let lock = PARSE_LOCK.lock();
        let saved_cwd = std::env::current_dir()?;
        let saved_env = SOURCE_TREE_VARS
            .iter()
            .map(|var| (*var, std::env::var_os(var)))
            .collect();

        let scope = Self {
            saved_cwd,
            saved_env,
            _lock: lock,
        };
        for var in SOURCE_TREE_VARS {
            set_env(var, root.as_os_str());
        }
        std::env::set_current_dir(root)?;
        debug!(root = %root.display(), "entered parse scope");
        Ok(scope)
    }
}

impl Drop for ParseScope {
    fn drop(&mut self) {
        for (var, value) in &self.saved_env {
            match value {
                Some(v) => set_env(var, v),
                None => remove_env(var),
            }
        }
        if let Err(e) = std::env::set_current_dir(&self.saved_cwd) {
            warn!(error = %e, cwd = %self.saved_cwd.display(), "failed to restore working directory");
        }
    }
}

// Only called while a `ParseScope` holds `PARSE_LOCK`.
#[allow(unsafe_code)]
fn set_env(var: &str, value: &OsStr) {
    // SAFETY: environment writes in this crate are serialized by `PARSE_LOCK`.
    unsafe { std::env::set_var(var, value) };
}

#[allow(unsafe_code)]
fn remove_env(var: &str) {
    // SAFETY: environment writes in this crate are serialized by `PARSE_LOCK`.
    unsafe { std::env::remove_var(var) };
}
