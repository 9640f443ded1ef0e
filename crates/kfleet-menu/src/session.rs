//! Configuration session.
//!
//! A [`Session`] owns one parsed definition tree for one firmware source
//! tree and exposes the four caller operations: load, project, mutate and
//! save.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kfleet_kconfig::Kconfig;
use kfleet_settings::MenuSettings;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{MenuError, Result};
use crate::gatekeeper::{self, MutationOutcome};
use crate::hook::CompatHook;
use crate::node::ConfigNode;
use crate::parse_scope::ParseScope;
use crate::policy::OverridePolicy;
use crate::projector::Projector;

/// Session shared between callers.
pub type SharedSession = Arc<Mutex<Session>>;

struct Loaded {
    graph: Kconfig,
    definition: PathBuf,
    profile: Option<PathBuf>,
}

/// One firmware source tree and its loaded definitions.
pub struct Session {
    root: PathBuf,
    config_prefix: String,
    definition_file: PathBuf,
    policy: OverridePolicy,
    hook: CompatHook,
    loaded: Option<Loaded>,
}

impl Session {
    /// Session over the source tree at `root`, with all other behaviour
    /// taken from `settings`.
    pub fn with_root(root: impl Into<PathBuf>, settings: &MenuSettings) -> Self {
        Self {
            root: root.into(),
            config_prefix: settings.config_prefix.clone(),
            definition_file: PathBuf::from(&settings.definition_file),
            policy: OverridePolicy::from_settings(settings),
            hook: CompatHook::from_settings(settings),
            loaded: None,
        }
    }

    /// Wrap the session for sharing.
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Whether a definition tree is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Absolute path of the loaded root definition file.
    pub fn definition_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.definition.as_path())
    }

    /// Prior profile the current tree was loaded with, when one was applied.
    pub fn profile_path(&self) -> Option<&Path> {
        self.loaded.as_ref().and_then(|l| l.profile.as_deref())
    }

    /// The loaded symbol graph.
    pub fn graph(&self) -> Result<&Kconfig> {
        self.loaded
            .as_ref()
            .map(|l| &l.graph)
            .ok_or(MenuError::NotLoaded)
    }

    /// [`Session::load`] with the definition file named in settings.
    pub fn load_default(&mut self, prior_profile: Option<&Path>) -> Result<()> {
        let definition = self.definition_file.clone();
        self.load(definition, prior_profile)
    }

    /// Parse the definitions rooted at `definition`, then apply
    /// `prior_profile` if it exists.
    ///
    /// A relative `definition` resolves against the source root. Any
    /// previously loaded tree, including unsaved edits, is discarded first;
    /// a failed load leaves the session unloaded.
    pub fn load(
        &mut self,
        definition: impl AsRef<Path>,
        prior_profile: Option<&Path>,
    ) -> Result<()> {
        self.loaded = None;

        let root = std::path::absolute(&self.root)?;
        let definition = root.join(definition.as_ref());
        if !definition.is_file() {
            return Err(MenuError::DefinitionNotFound { path: definition });
        }
        let prior_profile = prior_profile.map(std::path::absolute).transpose()?;

        let hook = self.hook.run(&root)?;
        debug!(?hook, "compatibility hook");

        let mut graph = {
            let _scope = ParseScope::enter(&root)?;
            Kconfig::parse(&definition)?
        };
        graph.set_config_prefix(self.config_prefix.as_str());

        let profile = match prior_profile {
            Some(path) if path.is_file() => {
                let stats = graph
                    .load_profile(&path)
                    .map_err(MenuError::from_profile_io)?;
                debug!(
                    profile = %path.display(),
                    applied = stats.applied,
                    unknown = stats.unknown,
                    invalid = stats.invalid,
                    "prior profile applied"
                );
                Some(path)
            }
            Some(path) => {
                warn!(profile = %path.display(), "prior profile not found, ignoring");
                None
            }
            None => None,
        };

        info!(
            definition = %definition.display(),
            symbols = graph.symbol_ids().count(),
            "definitions loaded"
        );
        self.loaded = Some(Loaded {
            graph,
            definition,
            profile,
        });
        Ok(())
    }

    /// Project the loaded tree. With `show_optional`, hidden optional
    /// features are included as well.
    pub fn get_menu_tree(&self, show_optional: bool) -> Result<Vec<ConfigNode>> {
        let graph = self.graph()?;
        Ok(Projector::new(graph, &self.policy, show_optional).project())
    }

    /// Apply one mutation request. Requests that do not apply to the
    /// current tree are ignored.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<()> {
        let _ = self.apply(name, value)?;
        Ok(())
    }

    /// [`Session::set_value`], reporting what the request did.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<MutationOutcome> {
        let loaded = self.loaded.as_mut().ok_or(MenuError::NotLoaded)?;
        Ok(gatekeeper::apply(&mut loaded.graph, name, value)?)
    }

    /// Write the current configuration as a profile at `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.graph()?
            .write_profile(path)
            .map_err(MenuError::from_profile_io)?;
        info!(path = %path.display(), "profile saved");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn operations_before_load_fail() {
        let mut session = Session::with_root("/nonexistent", &MenuSettings::default());
        assert!(!session.is_loaded());
        assert_matches!(session.get_menu_tree(false), Err(MenuError::NotLoaded));
        assert_matches!(session.set_value("X", "y"), Err(MenuError::NotLoaded));
        assert_matches!(session.save("/tmp/never.config"), Err(MenuError::NotLoaded));
    }

    #[test]
    fn missing_definition_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::with_root(dir.path(), &MenuSettings::default());
        let err = session.load_default(None).unwrap_err();
        assert_matches!(err, MenuError::DefinitionNotFound { path } if path.ends_with("src/Kconfig"));
        assert!(session.definition_path().is_none());
    }
}
