//! Compatibility hook for source trees that generate part of their
//! definitions.
//!
//! Some firmware forks ship a script that writes an extra definition file
//! which the root definitions `source` unconditionally. When the script is
//! present and its output is missing, the script is run once before
//! parsing. If it fails, an empty placeholder keeps the `source` resolvable.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use kfleet_settings::MenuSettings;
use tracing::{debug, warn};

/// What [`CompatHook::run`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// The tree has no hook script.
    NotPresent,
    /// The generated file already exists.
    Skipped,
    /// The script ran and produced the file.
    Generated,
    /// The script failed; an empty placeholder was written.
    Placeholder,
}

/// Hook script and the file it is expected to generate, both relative to
/// the source root.
#[derive(Clone, Debug)]
pub struct CompatHook {
    script: PathBuf,
    output: PathBuf,
}

impl CompatHook {
    /// Create a hook from root-relative paths.
    pub fn new(script: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            output: output.into(),
        }
    }

    /// Hook configured by menu settings.
    pub fn from_settings(settings: &MenuSettings) -> Self {
        Self::new(&settings.compat_hook_script, &settings.compat_hook_output)
    }

    /// Run the hook against the source tree at `root` if it applies.
    ///
    /// Script failures degrade to a placeholder. Only a failure to write the
    /// placeholder is an error.
    pub fn run(&self, root: &Path) -> std::io::Result<HookOutcome> {
        let script = root.join(&self.script);
        let output = root.join(&self.output);

        if !script.is_file() {
            return Ok(HookOutcome::NotPresent);
        }
        if output.exists() {
            debug!(output = %output.display(), "generated definitions present, skipping hook");
            return Ok(HookOutcome::Skipped);
        }

        let start = Instant::now();
        debug!(script = %script.display(), root = %root.display(), "running compatibility hook");
        let result = Command::new("bash")
            .arg(&script)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(out) if out.status.success() && output.exists() => {
                debug!(duration_ms, "compatibility hook completed");
                return Ok(HookOutcome::Generated);
            }
            Ok(out) if out.status.success() => {
                warn!(
                    output = %output.display(),
                    "compatibility hook exited cleanly without generating its output"
                );
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                warn!(
                    exit_code = out.status.code().unwrap_or(-1),
                    stderr = %stderr.trim(),
                    duration_ms,
                    "compatibility hook failed"
                );
            }
            Err(e) => {
                warn!(error = %e, script = %script.display(), "failed to spawn compatibility hook");
            }
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output, "")?;
        debug!(output = %output.display(), "wrote placeholder definitions");
        Ok(HookOutcome::Placeholder)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
