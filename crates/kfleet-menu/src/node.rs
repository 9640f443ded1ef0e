//! Projected tree node model.
//!
//! [`ConfigNode`] is the only shape callers see: a self-contained, serializable
//! snapshot of one menu entry after visibility filtering.

use serde::{Deserialize, Serialize};

/// Kind of a projected entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Two-state symbol.
    Bool,
    /// Three-state symbol.
    Tristate,
    /// Free-form string symbol.
    String,
    /// Decimal integer symbol.
    Int,
    /// Hexadecimal integer symbol.
    Hex,
    /// Symbol with no declared type.
    Unknown,
    /// Mutually exclusive group of bool symbols.
    Choice,
    /// Menu container.
    Menu,
    /// Informational comment.
    Comment,
}

impl NodeKind {
    /// Lower-case name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Tristate => "tristate",
            Self::String => "string",
            Self::Int => "int",
            Self::Hex => "hex",
            Self::Unknown => "unknown",
            Self::Choice => "choice",
            Self::Menu => "menu",
            Self::Comment => "comment",
        }
    }
}

/// One selectable member of a choice group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMember {
    /// Member symbol name.
    pub name: String,
    /// Member prompt, or its name when it has none.
    pub prompt: String,
}

/// A projected menu entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Symbol or choice name, or a synthetic key for anonymous entries.
    pub name: String,
    /// Entry kind.
    pub kind: NodeKind,
    /// Prompt text.
    pub prompt: String,
    /// Help text, when the definition has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Current value, normalized for the kind. Empty for menus and comments.
    pub current_value: String,
    /// Whether the entry should be rendered.
    pub visible: bool,
    /// Dependency expression, for diagnostics.
    pub dependency_expr: String,
    /// Set when another symbol forces this one through `select`.
    pub readonly: bool,
    /// Visible members of a choice, in definition order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choice_members: Vec<ChoiceMember>,
    /// Child entries; absent when the definition node has no descendants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ConfigNode>>,
}

impl ConfigNode {
    /// Depth-first search for the first entry named `name`.
    pub fn find<'a>(nodes: &'a [ConfigNode], name: &str) -> Option<&'a ConfigNode> {
        nodes.iter().find_map(|n| {
            if n.name == name {
                Some(n)
            } else {
                n.children.as_deref().and_then(|c| Self::find(c, name))
            }
        })
    }

    /// Depth-first iterator over this entry and all its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &ConfigNode> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some(children) = &node.children {
                stack.extend(children.iter().rev());
            }
            Some(node)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
