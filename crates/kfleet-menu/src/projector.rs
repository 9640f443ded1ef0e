//! Tree projection.
//!
//! Walks the definition tree depth-first, applies the override policy, and
//! produces self-contained [`ConfigNode`] values. Order is preserved;
//! excluded nodes drop out together with their subtrees.

use kfleet_kconfig::{Kconfig, MenuItem, NodeId, SymbolType};

use crate::choice;
use crate::keys::{choice_key, node_key};
use crate::node::{ConfigNode, NodeKind};
use crate::policy::OverridePolicy;

/// Projects a loaded graph into caller-facing nodes.
pub struct Projector<'a> {
    graph: &'a Kconfig,
    policy: &'a OverridePolicy,
    show_optional: bool,
}

impl<'a> Projector<'a> {
    /// Create a projector over `graph`.
    pub fn new(graph: &'a Kconfig, policy: &'a OverridePolicy, show_optional: bool) -> Self {
        Self {
            graph,
            policy,
            show_optional,
        }
    }

    /// Project the whole tree: the included children of the top node.
    pub fn project(&self) -> Vec<ConfigNode> {
        self.project_children(self.graph.top_node())
    }

    fn project_children(&self, parent: NodeId) -> Vec<ConfigNode> {
        self.graph
            .children(parent)
            .filter_map(|id| self.project_node(id))
            .collect()
    }

    fn project_node(&self, id: NodeId) -> Option<ConfigNode> {
        let inclusion = self.policy.decide(self.graph, id, self.show_optional);
        if !inclusion.is_included() {
            return None;
        }
        let g = self.graph;
        let node = g.node(id);
        let prompt = node.prompt().map_or("", |p| p.text.as_str());

        let mut out = ConfigNode {
            name: String::new(),
            kind: NodeKind::Menu,
            prompt: prompt.to_string(),
            help: node.help().map(str::to_string),
            current_value: String::new(),
            visible: true,
            dependency_expr: g.expr_to_string(node.dep()),
            readonly: false,
            choice_members: Vec::new(),
            children: None,
        };

        match node.item() {
            MenuItem::Symbol(sym) => {
                let s = g.symbol(sym);
                out.name = s.name().to_string();
                out.kind = symbol_kind(g.effective_type(sym));
                out.current_value = g.str_value(sym);
                out.readonly = g.eval(s.rev_dep()).is_enabled();
            }
            MenuItem::Choice(c) => {
                let view = choice::resolve(g, c);
                out.name = g
                    .choice(c)
                    .name()
                    .map_or_else(|| choice_key(prompt, node.line()), str::to_string);
                out.kind = NodeKind::Choice;
                out.current_value = view.selection.unwrap_or_default();
                out.visible = out.visible && !view.redundant;
                out.choice_members = view.members;
            }
            MenuItem::Menu => {
                out.name = node_key(prompt, node.line());
            }
            MenuItem::Comment => {
                out.name = node_key(prompt, node.line());
                out.kind = NodeKind::Comment;
            }
        }

        if node.first_child().is_some() {
            out.children = Some(self.project_children(id));
        }
        Some(out)
    }
}

fn symbol_kind(ty: SymbolType) -> NodeKind {
    match ty {
        SymbolType::Bool => NodeKind::Bool,
        SymbolType::Tristate => NodeKind::Tristate,
        SymbolType::String => NodeKind::String,
        SymbolType::Int => NodeKind::Int,
        SymbolType::Hex => NodeKind::Hex,
        SymbolType::Unknown => NodeKind::Unknown,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
