//! Profile reading and writing.
//!
//! A profile is the conventional `PREFIX` + `NAME=value` file consumed by
//! firmware builds. Disabled bool/tristate symbols are written as
//! `# PREFIXNAME is not set`; strings are quoted with `\"` and `\\` escapes.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{KconfigError, Result};
use crate::graph::{Kconfig, MenuItem, NodeId, SymbolId, SymbolType};
use crate::tristate::Tristate;

/// Outcome of loading a profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProfileStats {
    /// Assignments stored as user values.
    pub applied: usize,
    /// Assignments naming symbols the tree does not define.
    pub unknown: usize,
    /// Assignments rejected by the symbol's type.
    pub invalid: usize,
}

impl Kconfig {
    /// Replace all user values with the assignments in the profile at `path`.
    ///
    /// Unknown names and invalid values are skipped with a warning. Values
    /// for currently invisible symbols are stored but have no effect until
    /// the symbol becomes visible.
    pub fn load_profile(&mut self, path: impl AsRef<Path>) -> Result<ProfileStats> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| KconfigError::io(path, e))?;
        let stats = self.load_profile_str(&text);
        debug!(
            path = %path.display(),
            applied = stats.applied,
            unknown = stats.unknown,
            invalid = stats.invalid,
            "profile loaded"
        );
        Ok(stats)
    }

    /// [`Kconfig::load_profile`] on in-memory text.
    pub fn load_profile_str(&mut self, text: &str) -> ProfileStats {
        self.unset_all();
        let mut stats = ProfileStats::default();

        for (idx, line) in text.lines().enumerate() {
            let Some((name, value)) = self.parse_assignment(line.trim()) else {
                continue;
            };
            let Some(sym) = self
                .lookup_symbol(&name)
                .filter(|id| self.symbol(*id).is_defined())
            else {
                warn!(line = idx + 1, symbol = %name, "unknown symbol in profile, skipping");
                stats.unknown += 1;
                continue;
            };
            match self.set_value(sym, &value) {
                Ok(()) => stats.applied += 1,
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "invalid profile value, skipping");
                    stats.invalid += 1;
                }
            }
        }
        stats
    }

    fn parse_assignment(&self, line: &str) -> Option<(String, String)> {
        if let Some(rest) = line.strip_prefix("# ") {
            let name = rest
                .strip_prefix(self.prefix.as_str())?
                .strip_suffix(" is not set")?;
            return Some((name.to_string(), "n".to_string()));
        }
        let (key, value) = line.strip_prefix(self.prefix.as_str())?.split_once('=')?;
        let value = match value.strip_prefix('"') {
            Some(quoted) => unescape(quoted)?,
            None => value.to_string(),
        };
        Some((key.to_string(), value))
    }

    /// Profile line for one symbol, empty when it is not written.
    pub fn config_string(&self, sym: SymbolId) -> String {
        if !self.write_to_conf(sym) {
            return String::new();
        }
        let s = self.symbol(sym);
        let key = format!("{}{}", self.prefix, s.name());
        match s.symbol_type() {
            SymbolType::Unknown => String::new(),
            SymbolType::Bool | SymbolType::Tristate => match self.tri_value(sym) {
                Tristate::No => format!("# {key} is not set\n"),
                value => format!("{key}={value}\n"),
            },
            SymbolType::String => format!("{key}=\"{}\"\n", escape(&self.str_value(sym))),
            SymbolType::Int | SymbolType::Hex => format!("{key}={}\n", self.str_value(sym)),
        }
    }

    /// Full profile text: header, then every written symbol in menu order
    /// with menu section comments.
    pub fn profile_string(&self) -> String {
        let mut out = String::from("#\n# Automatically generated file; DO NOT EDIT.\n");
        let _ = writeln!(out, "# {}", self.mainmenu_title());
        out.push_str("#\n");

        let mut writer = ProfileWriter {
            out,
            written: HashSet::new(),
            after_end: false,
        };
        writer.walk(self, self.top_node());
        writer.out
    }

    /// Write the profile to `path` atomically. Parent directories are
    /// created as needed.
    pub fn write_profile(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| KconfigError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| KconfigError::io(&dir, e))?;
        tmp.write_all(self.profile_string().as_bytes())
            .map_err(|e| KconfigError::io(tmp.path(), e))?;
        let _ = tmp
            .persist(path)
            .map_err(|e| KconfigError::io(path, e.error))?;
        debug!(path = %path.display(), "profile written");
        Ok(())
    }
}

struct ProfileWriter {
    out: String,
    written: HashSet<SymbolId>,
    after_end: bool,
}

impl ProfileWriter {
    fn walk(&mut self, graph: &Kconfig, parent: NodeId) {
        for id in graph.children(parent) {
            let node = graph.node(id);
            let shown = graph.eval(node.dep()).is_enabled()
                && (node.item() == MenuItem::Comment || graph.prompt_visibility(id).is_enabled());
            let title = node.prompt().map_or("", |p| p.text.as_str());

            match node.item() {
                MenuItem::Symbol(sym) => {
                    if self.written.insert(sym) {
                        let line = graph.config_string(sym);
                        if !line.is_empty() {
                            if self.after_end {
                                self.out.push('\n');
                                self.after_end = false;
                            }
                            self.out.push_str(&line);
                        }
                    }
                }
                MenuItem::Menu | MenuItem::Comment if shown => {
                    let _ = write!(self.out, "\n#\n# {title}\n#\n");
                    self.after_end = false;
                }
                MenuItem::Menu | MenuItem::Comment | MenuItem::Choice(_) => {}
            }

            self.walk(graph, id);

            if node.item() == MenuItem::Menu && shown {
                let _ = writeln!(self.out, "# end of {title}");
                self.after_end = true;
            }
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Undo [`escape`] for the text after an opening quote. `None` when the
/// closing quote is missing.
fn unescape(quoted: &str) -> Option<String> {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return Some(out),
            _ => out.push(c),
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CANBUS: &str = r#"
mainmenu "Klipper Configuration"

config BOARD_MCU
    string "Micro-controller Architecture"
    default "stm32"

menu "Communication interface"
    config CANBUS_INTERFACE
        bool "CAN bus interface"
        default n

    config CANBUS_SPEED
        int "CAN bus speed"
        depends on CANBUS_INTERFACE
        default 1000000
endmenu

config HAVE_GPIO
    bool
"#;

    fn graph() -> Kconfig {
        Kconfig::parse_str(CANBUS, "Kconfig").unwrap()
    }

    #[test]
    fn default_profile_layout() {
        let g = graph();
        assert_eq!(
            g.profile_string(),
            "#\n# Automatically generated file; DO NOT EDIT.\n# Klipper Configuration\n#\n\
             CONFIG_BOARD_MCU=\"stm32\"\n\
             \n#\n# Communication interface\n#\n\
             # CONFIG_CANBUS_INTERFACE is not set\n\
             # end of Communication interface\n"
        );
    }

    #[test]
    fn enabled_dependency_writes_child() {
        let mut g = graph();
        g.set_value(g.lookup_symbol("CANBUS_INTERFACE").unwrap(), "y")
            .unwrap();
        let text = g.profile_string();
        assert!(text.contains("CONFIG_CANBUS_INTERFACE=y\n"));
        assert!(text.contains("CONFIG_CANBUS_SPEED=1000000\n"));
        assert!(!text.contains("HAVE_GPIO"));
    }

    #[test]
    fn strings_are_escaped() {
        let mut g = graph();
        let mcu = g.lookup_symbol("BOARD_MCU").unwrap();
        g.set_value(mcu, "say \"hi\" \\o/").unwrap();
        assert_eq!(
            g.config_string(mcu),
            "CONFIG_BOARD_MCU=\"say \\\"hi\\\" \\\\o/\"\n"
        );
    }

    #[test]
    fn load_replaces_user_values_and_counts() {
        let mut g = graph();
        let stats = g.load_profile_str(
            "CONFIG_BOARD_MCU=\"rp2040\"\n\
             CONFIG_CANBUS_INTERFACE=y\n\
             CONFIG_CANBUS_SPEED=fast\n\
             CONFIG_REMOVED_OPTION=y\n\
             # CONFIG_HAVE_GPIO is not set\n\
             # a plain comment\n",
        );
        assert_eq!(
            stats,
            ProfileStats {
                applied: 3,
                unknown: 1,
                invalid: 1,
            }
        );
        assert_eq!(g.str_value(g.lookup_symbol("BOARD_MCU").unwrap()), "rp2040");
        assert_eq!(
            g.tri_value(g.lookup_symbol("CANBUS_INTERFACE").unwrap()),
            Tristate::Yes
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.config");

        let mut g = graph();
        g.set_value(g.lookup_symbol("BOARD_MCU").unwrap(), "rp2040")
            .unwrap();
        g.set_value(g.lookup_symbol("CANBUS_INTERFACE").unwrap(), "y")
            .unwrap();
        g.write_profile(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("CONFIG_BOARD_MCU=\"rp2040\""));

        let mut fresh = graph();
        let _ = fresh.load_profile(&path).unwrap();
        assert_eq!(fresh.profile_string(), written);
    }

    #[test]
    fn custom_prefix_is_used() {
        let mut g = graph();
        g.set_config_prefix("KLIPPER_");
        assert!(g.profile_string().contains("KLIPPER_BOARD_MCU=\"stm32\""));
        let _ = g.load_profile_str("KLIPPER_BOARD_MCU=\"avr\"\n");
        assert_eq!(g.str_value(g.lookup_symbol("BOARD_MCU").unwrap()), "avr");
    }

    #[test]
    fn missing_profile_is_io_error() {
        let mut g = graph();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            g.load_profile(dir.path().join("absent.config")),
            Err(KconfigError::Io { .. })
        ));
    }

    #[test]
    fn unescape_requires_closing_quote() {
        assert_eq!(unescape(r#"a\"b""#).as_deref(), Some("a\"b"));
        assert_eq!(unescape("open"), None);
    }
}
