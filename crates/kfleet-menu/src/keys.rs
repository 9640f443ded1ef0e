//! Synthetic identifiers for entries without a name.
//!
//! Keys are built from the prompt text and the definition line, so they are
//! stable across re-parses of the same files but mean nothing outside the
//! session that produced them. They are never written to a profile.

/// Prefix of keys naming anonymous choices.
pub const CHOICE_KEY_PREFIX: &str = "__choice_";

/// Prefix of keys naming menus and comments.
pub const NODE_KEY_PREFIX: &str = "__node_";

/// Key for an anonymous choice.
pub fn choice_key(prompt: &str, line: usize) -> String {
    format!("{CHOICE_KEY_PREFIX}{prompt}_{line}")
}

/// Key for a menu or comment.
pub fn node_key(prompt: &str, line: usize) -> String {
    format!("{NODE_KEY_PREFIX}{prompt}_{line}")
}

/// What a mutation target name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Synthetic key of an anonymous choice.
    Choice,
    /// Synthetic key of a menu or comment.
    Node,
    /// A real symbol or choice name.
    Named,
}

/// Classify a name by its prefix.
pub fn classify(name: &str) -> KeyKind {
    if name.starts_with(CHOICE_KEY_PREFIX) {
        KeyKind::Choice
    } else if name.starts_with(NODE_KEY_PREFIX) {
        KeyKind::Node
    } else {
        KeyKind::Named
    }
}
