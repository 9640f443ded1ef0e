//! Visibility and override policy.
//!
//! Decides, per definition node, whether the projected tree includes it.
//! Prompt-less nodes are never included. Otherwise the engine's visibility
//! decides, unless the caller asked for optional features and the node is
//! recognizably one: a symbol with an optional-feature prefix, a symbol on
//! the forced list, or a menu whose prompt carries the optional marker.

use kfleet_kconfig::{Kconfig, MenuItem, NodeId};
use kfleet_settings::MenuSettings;
use tracing::trace;

/// Inclusion decision for one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inclusion {
    /// Not part of the projected tree, together with its subtree.
    Excluded,
    /// Included because the engine considers it visible.
    Visible,
    /// Included by the optional-features override despite being hidden.
    Forced,
}

impl Inclusion {
    /// Whether the node is part of the projected tree.
    pub fn is_included(self) -> bool {
        !matches!(self, Self::Excluded)
    }
}

/// Optional-feature override rules.
#[derive(Clone, Debug)]
pub struct OverridePolicy {
    symbol_prefixes: Vec<String>,
    forced_symbols: Vec<String>,
    menu_marker: String,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self::from_settings(&MenuSettings::default())
    }
}

impl OverridePolicy {
    /// Build the policy from menu settings.
    pub fn from_settings(settings: &MenuSettings) -> Self {
        Self {
            symbol_prefixes: settings.optional_symbol_prefixes.clone(),
            forced_symbols: settings.forced_optional_symbols.clone(),
            menu_marker: settings.optional_menu_marker.clone(),
        }
    }

    /// Whether `name` denotes an optional-feature symbol.
    pub fn is_optional_symbol(&self, name: &str) -> bool {
        self.symbol_prefixes
            .iter()
            .any(|p| !p.is_empty() && name.starts_with(p.as_str()))
            || self.forced_symbols.iter().any(|s| s == name)
    }

    /// Whether a menu or comment prompt marks an optional-features section.
    pub fn is_optional_menu(&self, prompt: &str) -> bool {
        !self.menu_marker.is_empty() && prompt.contains(self.menu_marker.as_str())
    }

    /// Decide inclusion of node `id`.
    pub fn decide(&self, graph: &Kconfig, id: NodeId, show_optional: bool) -> Inclusion {
        let node = graph.node(id);
        let Some(prompt) = node.prompt() else {
            return Inclusion::Excluded;
        };

        let (base, optional) = match node.item() {
            MenuItem::Symbol(sym) => (
                graph.visibility(sym).is_enabled(),
                self.is_optional_symbol(graph.symbol(sym).name()),
            ),
            MenuItem::Choice(choice) => (
                graph.choice_visibility(choice).is_enabled(),
                graph
                    .choice(choice)
                    .name()
                    .is_some_and(|n| self.is_optional_symbol(n)),
            ),
            MenuItem::Menu | MenuItem::Comment => (
                graph.prompt_visibility(id).is_enabled(),
                self.is_optional_menu(&prompt.text),
            ),
        };

        if base {
            Inclusion::Visible
        } else if show_optional && optional {
            trace!(prompt = %prompt.text, line = node.line(), "optional feature force-shown");
            Inclusion::Forced
        } else {
            Inclusion::Excluded
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"
config HAVE_GPIO
    bool
    default y

config LOW_LEVEL_OPTIONS
    bool "Enable extra low-level configuration options"

config WANT_ADXL345
    bool "Support adxl345 accelerometer"
    depends on LOW_LEVEL_OPTIONS

config CANBUS_FREQUENCY
    int "CAN bus speed"
    depends on LOW_LEVEL_OPTIONS

menu "Optional features (to reduce code size)"
    depends on LOW_LEVEL_OPTIONS
endmenu

comment "Hidden note"
    depends on LOW_LEVEL_OPTIONS
"#;

    fn graph() -> Kconfig {
        Kconfig::parse_str(DEFS, "Kconfig").unwrap()
    }

    fn node_of(g: &Kconfig, name: &str) -> NodeId {
        g.symbol(g.lookup_symbol(name).unwrap()).nodes()[0]
    }

    fn all_nodes(g: &Kconfig) -> Vec<NodeId> {
        g.node_ids().collect()
    }

    #[test]
    fn promptless_is_always_excluded() {
        let g = graph();
        let policy = OverridePolicy::default();
        let id = node_of(&g, "HAVE_GPIO");
        assert_eq!(policy.decide(&g, id, false), Inclusion::Excluded);
        assert_eq!(policy.decide(&g, id, true), Inclusion::Excluded);
    }

    #[test]
    fn visible_symbol_is_included() {
        let g = graph();
        let policy = OverridePolicy::default();
        let id = node_of(&g, "LOW_LEVEL_OPTIONS");
        assert_eq!(policy.decide(&g, id, false), Inclusion::Visible);
    }

    #[test]
    fn optional_prefix_forced_only_on_request() {
        let g = graph();
        let policy = OverridePolicy::default();
        let id = node_of(&g, "WANT_ADXL345");
        assert_eq!(policy.decide(&g, id, false), Inclusion::Excluded);
        assert_eq!(policy.decide(&g, id, true), Inclusion::Forced);
    }

    #[test]
    fn ordinary_hidden_symbol_stays_hidden() {
        let g = graph();
        let policy = OverridePolicy::default();
        let id = node_of(&g, "CANBUS_FREQUENCY");
        assert_eq!(policy.decide(&g, id, true), Inclusion::Excluded);
    }

    #[test]
    fn optional_menu_marker() {
        let g = graph();
        let policy = OverridePolicy::default();
        let nodes = all_nodes(&g);
        let menu = nodes
            .iter()
            .copied()
            .find(|id| g.node(*id).item() == MenuItem::Menu)
            .unwrap();
        let comment = nodes
            .iter()
            .copied()
            .find(|id| g.node(*id).item() == MenuItem::Comment)
            .unwrap();

        assert_eq!(policy.decide(&g, menu, false), Inclusion::Excluded);
        assert_eq!(policy.decide(&g, menu, true), Inclusion::Forced);
        assert_eq!(policy.decide(&g, comment, true), Inclusion::Excluded);
    }

    #[test]
    fn forced_list_and_custom_prefixes() {
        let settings = MenuSettings {
            optional_symbol_prefixes: vec!["OPT_".into()],
            forced_optional_symbols: vec!["CANBUS_FREQUENCY".into()],
            ..MenuSettings::default()
        };
        let policy = OverridePolicy::from_settings(&settings);
        assert!(policy.is_optional_symbol("OPT_LCD"));
        assert!(!policy.is_optional_symbol("WANT_ADXL345"));

        let g = graph();
        let id = node_of(&g, "CANBUS_FREQUENCY");
        assert_eq!(policy.decide(&g, id, true), Inclusion::Forced);
    }

    #[test]
    fn empty_marker_matches_nothing() {
        let settings = MenuSettings {
            optional_menu_marker: String::new(),
            ..MenuSettings::default()
        };
        let policy = OverridePolicy::from_settings(&settings);
        assert!(!policy.is_optional_menu("Optional features"));
        assert!(!Inclusion::Excluded.is_included());
        assert!(Inclusion::Forced.is_included());
    }
}
