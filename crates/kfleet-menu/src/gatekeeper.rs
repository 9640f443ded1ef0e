//! Mutation gatekeeper.
//!
//! Routes a `(name, value)` request to the right engine operation, or
//! absorbs it. Writes to entries the user cannot currently see are dropped,
//! so a stale value can never linger behind a disabled dependency and
//! resurface later.

use kfleet_kconfig::{ChoiceId, Kconfig, KconfigError, MenuItem, SymbolId};
use tracing::debug;

use crate::choice::is_visible_member;
use crate::keys::{choice_key, classify, KeyKind};

/// Why a mutation was absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Menus and comments carry no value.
    MenuKey,
    /// No anonymous choice in the tree has this key.
    UnknownChoiceKey,
    /// The value does not name a visible member of the target choice.
    NotAMember,
    /// The symbol is currently invisible.
    Invisible,
    /// The symbol is forced by another symbol's `select`.
    Readonly,
    /// The named choice is currently invisible.
    ChoiceInvisible,
    /// Nothing in the tree has this name.
    UnknownName,
}

/// What the gatekeeper did with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The value was stored on the named symbol.
    Assigned {
        /// Symbol that received the value.
        symbol: String,
    },
    /// A choice member was selected.
    Selected {
        /// Member that became the selection.
        member: String,
    },
    /// The request had no effect.
    Ignored(IgnoreReason),
}

/// Apply one mutation request to `graph`.
///
/// Only a value the engine's type coercion rejects is an error.
pub fn apply(
    graph: &mut Kconfig,
    name: &str,
    value: &str,
) -> Result<MutationOutcome, KconfigError> {
    let outcome = match classify(name) {
        KeyKind::Choice => match find_anonymous_choice(graph, name) {
            Some(choice) => select_member(graph, choice, value)?,
            None => MutationOutcome::Ignored(IgnoreReason::UnknownChoiceKey),
        },
        KeyKind::Node => MutationOutcome::Ignored(IgnoreReason::MenuKey),
        KeyKind::Named => apply_named(graph, name, value)?,
    };
    debug!(name, value, ?outcome, "mutation");
    Ok(outcome)
}

fn apply_named(
    graph: &mut Kconfig,
    name: &str,
    value: &str,
) -> Result<MutationOutcome, KconfigError> {
    if let Some(sym) = graph
        .lookup_symbol(name)
        .filter(|id| graph.symbol(*id).is_defined())
    {
        return assign_symbol(graph, sym, value);
    }
    if let Some(choice) = graph.lookup_choice(name) {
        if !graph.choice_visibility(choice).is_enabled() {
            return Ok(MutationOutcome::Ignored(IgnoreReason::ChoiceInvisible));
        }
        return select_member(graph, choice, value);
    }
    Ok(MutationOutcome::Ignored(IgnoreReason::UnknownName))
}

fn assign_symbol(
    graph: &mut Kconfig,
    sym: SymbolId,
    value: &str,
) -> Result<MutationOutcome, KconfigError> {
    if !graph.visibility(sym).is_enabled() {
        return Ok(MutationOutcome::Ignored(IgnoreReason::Invisible));
    }
    let s = graph.symbol(sym);
    if graph.eval(s.rev_dep()).is_enabled() {
        return Ok(MutationOutcome::Ignored(IgnoreReason::Readonly));
    }

    if let Some(choice) = s.choice() {
        let names_member = graph
            .lookup_symbol(value)
            .is_some_and(|m| graph.symbol(m).choice() == Some(choice));
        if names_member {
            return select_member(graph, choice, value);
        }
    }

    let symbol = graph.symbol(sym).name().to_string();
    graph.set_value(sym, value)?;
    Ok(MutationOutcome::Assigned { symbol })
}

/// Select the member of `choice` named by `value`, if it is visible.
fn select_member(
    graph: &mut Kconfig,
    choice: ChoiceId,
    value: &str,
) -> Result<MutationOutcome, KconfigError> {
    let Some(member) = graph
        .lookup_symbol(value)
        .filter(|m| is_visible_member(graph, choice, *m))
    else {
        return Ok(MutationOutcome::Ignored(IgnoreReason::NotAMember));
    };
    graph.set_value(member, "y")?;
    Ok(MutationOutcome::Selected {
        member: value.to_string(),
    })
}

/// Anonymous choice whose synthetic key is `key`.
fn find_anonymous_choice(graph: &Kconfig, key: &str) -> Option<ChoiceId> {
    graph.node_ids().find_map(|id| {
        let node = graph.node(id);
        let MenuItem::Choice(choice) = node.item() else {
            return None;
        };
        if graph.choice(choice).name().is_some() {
            return None;
        }
        let prompt = node.prompt()?;
        (choice_key(&prompt.text, node.line()) == key).then_some(choice)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
