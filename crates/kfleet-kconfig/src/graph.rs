//! The loaded symbol graph.
//!
//! [`Kconfig`] owns three arenas (symbols, choices, menu nodes) addressed by
//! the copyable ids [`SymbolId`], [`ChoiceId`] and [`NodeId`]. Menu nodes form
//! a tree through first-child / next-sibling links in source order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::eval::EvalCache;
use crate::expr::Expr;
use crate::tristate::Tristate;

/// Index of a symbol in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) usize);

/// Index of a choice group in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceId(pub(crate) usize);

/// Index of a menu node in its graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Declared type of a symbol or choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymbolType {
    /// Referenced but never typed.
    #[default]
    Unknown,
    /// `bool`
    Bool,
    /// `tristate`
    Tristate,
    /// `string`
    String,
    /// `int`
    Int,
    /// `hex`
    Hex,
}

impl SymbolType {
    /// Lower-case type keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Bool => "bool",
            Self::Tristate => "tristate",
            Self::String => "string",
            Self::Int => "int",
            Self::Hex => "hex",
        }
    }

    /// Whether values of this type are tri-state letters.
    pub fn is_bool_like(self) -> bool {
        matches!(self, Self::Bool | Self::Tristate)
    }

    /// Whether values of this type are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Hex)
    }
}

/// A configuration symbol.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub(crate) name: String,
    pub(crate) ty: SymbolType,
    pub(crate) nodes: Vec<NodeId>,
    /// `(value, condition)` pairs, conditions include the node dependency.
    pub(crate) defaults: Vec<(Expr, Expr)>,
    /// `(low, high, condition)` triples.
    pub(crate) ranges: Vec<(Expr, Expr, Expr)>,
    pub(crate) rev_dep: Expr,
    pub(crate) weak_rev_dep: Expr,
    pub(crate) direct_dep: Expr,
    pub(crate) choice: Option<ChoiceId>,
    pub(crate) user_value: Option<String>,
}

impl Symbol {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            ty: SymbolType::Unknown,
            nodes: Vec::new(),
            defaults: Vec::new(),
            ranges: Vec::new(),
            rev_dep: Expr::no(),
            weak_rev_dep: Expr::no(),
            direct_dep: Expr::no(),
            choice: None,
            user_value: None,
        }
    }

    /// Symbol name without the profile prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn symbol_type(&self) -> SymbolType {
        self.ty
    }

    /// Menu nodes defining this symbol, in source order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether the symbol has at least one definition (as opposed to only
    /// being referenced).
    pub fn is_defined(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Owning choice group, if the symbol is a choice member.
    pub fn choice(&self) -> Option<ChoiceId> {
        self.choice
    }

    /// Value assigned by the user or a loaded profile, before evaluation.
    pub fn user_value(&self) -> Option<&str> {
        self.user_value.as_deref()
    }

    /// OR of everything that `select`s this symbol.
    pub fn rev_dep(&self) -> &Expr {
        &self.rev_dep
    }

    /// OR of everything that `imply`s this symbol.
    pub fn weak_rev_dep(&self) -> &Expr {
        &self.weak_rev_dep
    }

    /// OR of the dependencies of every definition.
    pub fn direct_dep(&self) -> &Expr {
        &self.direct_dep
    }
}

/// A group of mutually exclusive bool symbols.
#[derive(Clone, Debug)]
pub struct Choice {
    pub(crate) name: Option<String>,
    pub(crate) ty: SymbolType,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) members: Vec<SymbolId>,
    pub(crate) defaults: Vec<(SymbolId, Expr)>,
    pub(crate) optional: bool,
    pub(crate) user_selection: Option<SymbolId>,
    pub(crate) user_mode: Option<Tristate>,
}

impl Choice {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            ty: SymbolType::Unknown,
            nodes: Vec::new(),
            members: Vec::new(),
            defaults: Vec::new(),
            optional: false,
            user_selection: None,
            user_mode: None,
        }
    }

    /// Name, for `choice NAME` definitions.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared (or inferred) type.
    pub fn symbol_type(&self) -> SymbolType {
        self.ty
    }

    /// Member symbols in source order.
    pub fn members(&self) -> &[SymbolId] {
        &self.members
    }

    /// Menu nodes defining this choice.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether the choice may be left with nothing selected.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Member explicitly selected by the user or a loaded profile.
    pub fn user_selection(&self) -> Option<SymbolId> {
        self.user_selection
    }
}

/// What a menu node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    /// A `config` / `menuconfig` definition.
    Symbol(SymbolId),
    /// A `choice` block.
    Choice(ChoiceId),
    /// A `menu` block (also the root node).
    Menu,
    /// A `comment` entry.
    Comment,
}

/// Prompt text plus the condition under which it is shown. The condition
/// already includes the node dependency and any enclosing `visible if`.
#[derive(Clone, Debug)]
pub struct Prompt {
    /// Text shown to the user.
    pub text: String,
    /// Visibility condition.
    pub condition: Expr,
}

/// An entry of the menu tree.
#[derive(Clone, Debug)]
pub struct MenuNode {
    pub(crate) item: MenuItem,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) dep: Expr,
    pub(crate) visible_if: Expr,
    pub(crate) help: Option<String>,
    pub(crate) file: PathBuf,
    pub(crate) line: usize,
    pub(crate) is_menuconfig: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl MenuNode {
    pub(crate) fn new(item: MenuItem, file: PathBuf, line: usize) -> Self {
        Self {
            item,
            prompt: None,
            dep: Expr::yes(),
            visible_if: Expr::yes(),
            help: None,
            file,
            line,
            is_menuconfig: false,
            parent: None,
            first_child: None,
            next: None,
        }
    }

    /// The item this node defines.
    pub fn item(&self) -> MenuItem {
        self.item
    }

    /// Prompt, when the entry has one.
    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Dependency of this node (own `depends on` plus enclosing blocks).
    pub fn dep(&self) -> &Expr {
        &self.dep
    }

    /// `visible if` condition of a menu (`y` otherwise).
    pub fn visible_if(&self) -> &Expr {
        &self.visible_if
    }

    /// Help text.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// File the node was defined in.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-based line of the node header.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the entry was declared with `menuconfig`.
    pub fn is_menuconfig(&self) -> bool {
        self.is_menuconfig
    }

    /// Parent node (`None` for the root).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// First child in source order.
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// Next sibling in source order.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

/// A parsed definition tree with its current values.
///
/// Evaluation results are memoized internally and invalidated by every
/// mutation, so the type is `Send` but not `Sync`; share it behind a mutex.
#[derive(Debug)]
pub struct Kconfig {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) choices: Vec<Choice>,
    pub(crate) nodes: Vec<MenuNode>,
    pub(crate) symbol_index: HashMap<String, SymbolId>,
    pub(crate) choice_index: HashMap<String, ChoiceId>,
    pub(crate) top: NodeId,
    pub(crate) modules: Option<SymbolId>,
    pub(crate) root_file: PathBuf,
    pub(crate) prefix: String,
    pub(crate) cache: RefCell<EvalCache>,
}

/// Default profile key prefix.
pub const DEFAULT_PREFIX: &str = "CONFIG_";

impl Kconfig {
    /// Root file the graph was parsed from.
    pub fn root_file(&self) -> &Path {
        &self.root_file
    }

    /// The root menu node.
    pub fn top_node(&self) -> NodeId {
        self.top
    }

    /// Title from `mainmenu`.
    pub fn mainmenu_title(&self) -> &str {
        self.nodes[self.top.0]
            .prompt
            .as_ref()
            .map_or("", |p| p.text.as_str())
    }

    /// Menu node by id.
    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.0]
    }

    /// Iterate the children of `id` in source order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            graph: self,
            next: self.nodes[id.0].first_child,
        }
    }

    /// Every menu node in arena order (parse order, not tree order).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Symbol by id.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Choice by id.
    pub fn choice(&self, id: ChoiceId) -> &Choice {
        &self.choices[id.0]
    }

    /// Every symbol id, including referenced-but-undefined ones.
    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.symbols.len()).map(SymbolId)
    }

    /// Look up a symbol by name.
    pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbol_index.get(name).copied()
    }

    /// Look up a named choice.
    pub fn lookup_choice(&self, name: &str) -> Option<ChoiceId> {
        self.choice_index.get(name).copied()
    }

    /// Symbol controlling whether `m` is allowed, if any.
    pub fn modules_symbol(&self) -> Option<SymbolId> {
        self.modules
    }

    /// Prefix used for profile keys.
    pub fn config_prefix(&self) -> &str {
        &self.prefix
    }

    /// Change the prefix used for profile keys.
    pub fn set_config_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Render an expression with symbol names.
    pub fn expr_to_string(&self, expr: &Expr) -> String {
        expr.render(&|id| self.symbols[id.0].name.clone())
    }
}

/// Iterator over sibling-linked children.
pub struct Children<'a> {
    graph: &'a Kconfig,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.nodes[current.0].next;
        Some(current)
    }
}
