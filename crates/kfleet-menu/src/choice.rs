//! Choice resolution for the projected tree.

use kfleet_kconfig::{ChoiceId, Kconfig, SymbolId, Tristate};

use crate::node::ChoiceMember;

/// Projected view of one choice group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceView {
    /// Visible members, in definition order.
    pub members: Vec<ChoiceMember>,
    /// Name of the active member, when there is one.
    pub selection: Option<String>,
    /// The group offers nothing to pick: no visible member, or a single
    /// visible member that is already selected.
    pub redundant: bool,
}

/// Visible members of `choice`, in definition order.
pub fn visible_members(graph: &Kconfig, choice: ChoiceId) -> impl Iterator<Item = SymbolId> + '_ {
    graph
        .choice(choice)
        .members()
        .iter()
        .copied()
        .filter(move |m| graph.visibility(*m).is_enabled())
}

/// Whether `sym` is a visible member of `choice`.
pub fn is_visible_member(graph: &Kconfig, choice: ChoiceId, sym: SymbolId) -> bool {
    graph.symbol(sym).choice() == Some(choice) && graph.visibility(sym).is_enabled()
}

/// Resolve the members, selection and redundancy of `choice`.
pub fn resolve(graph: &Kconfig, choice: ChoiceId) -> ChoiceView {
    let members: Vec<ChoiceMember> = visible_members(graph, choice)
        .map(|m| {
            let sym = graph.symbol(m);
            let prompt = sym
                .nodes()
                .first()
                .and_then(|n| graph.node(*n).prompt())
                .map_or_else(|| sym.name().to_string(), |p| p.text.clone());
            ChoiceMember {
                name: sym.name().to_string(),
                prompt,
            }
        })
        .collect();

    let selection = graph
        .choice_selection(choice)
        .or_else(|| {
            graph
                .choice(choice)
                .members()
                .iter()
                .copied()
                .find(|m| graph.tri_value(*m) == Tristate::Yes)
        })
        .map(|m| graph.symbol(m).name().to_string());

    let redundant = match members.as_slice() {
        [] => true,
        [only] => selection.as_deref() == Some(only.name.as_str()),
        _ => false,
    };

    ChoiceView {
        members,
        selection,
        redundant,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
