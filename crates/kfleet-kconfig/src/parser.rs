//! Definition file parser.
//!
//! Entries are collected one at a time: a header (`config`, `menu`, ...)
//! opens a pending entry, property lines attach to it, and the next header
//! (or block terminator) finalizes it. Finalizing ANDs the enclosing block
//! dependencies into the entry and records defaults, ranges and reverse
//! dependencies on the symbol. Automatic sub-menus, sibling links and choice
//! membership are computed once the whole tree has been read.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::mem;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::{KconfigError, Result};
use crate::eval::EvalCache;
use crate::expr::Expr;
use crate::graph::{
    Choice, ChoiceId, Kconfig, MenuItem, MenuNode, NodeId, Prompt, Symbol, SymbolId, SymbolType,
    DEFAULT_PREFIX,
};
use crate::grammar::{parse_expression, RawExpr};
use crate::lexer::{indentation, tokenize_spanned, Span, Token};

/// `$(VAR)`, `${VAR}` or `$VAR`.
static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\(([A-Za-z_][A-Za-z0-9_]*)\)|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap()
});

impl Kconfig {
    /// Parse the tree rooted at `root`.
    ///
    /// Relative paths (the root itself and every `source` target) resolve
    /// against `$srctree`, falling back to the working directory when unset.
    pub fn parse(root: impl AsRef<Path>) -> Result<Self> {
        let srctree = srctree();
        let root = resolve(&srctree, root.as_ref());
        debug!(root = %root.display(), srctree = %srctree.display(), "parsing definitions");

        let mut parser = Parser::new(srctree, root.clone());
        parser.include(&root, false)?;
        parser.finish()
    }

    /// Parse definitions from a string. `name` is used for diagnostics and
    /// as the base for `rsource`.
    pub fn parse_str(text: &str, name: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let mut parser = Parser::new(srctree(), name.clone());
        parser.file_stack.push(name.clone());
        parser.parse_text(text, &name)?;
        let _ = parser.file_stack.pop();
        parser.finish()
    }
}

fn srctree() -> PathBuf {
    std::env::var_os("srctree")
        .or_else(|| std::env::var_os("SRCTREE"))
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Expand environment references. Unset variables expand to nothing.
fn expand_env(text: &str) -> String {
    ENV_REF
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_default()
        })
        .into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Menu,
    Choice,
    If,
}

/// An open block. `dep` and `visible_if` are cumulative.
struct Frame {
    kind: FrameKind,
    node: NodeId,
    dep: Expr,
    visible_if: Expr,
    line: usize,
}

/// Properties of the entry being read, applied on finalize.
struct Pending {
    node: NodeId,
    ctx_dep: Expr,
    ctx_visible_if: Expr,
    deps: Vec<Expr>,
    prompt: Option<(String, Expr)>,
    defaults: Vec<(Expr, Expr)>,
    selects: Vec<(SymbolId, Expr)>,
    implies: Vec<(SymbolId, Expr)>,
    ranges: Vec<(Expr, Expr, Expr)>,
    visible_if: Vec<Expr>,
    help: Option<String>,
    ty: Option<SymbolType>,
}

impl Pending {
    fn new(node: NodeId, frame: &Frame) -> Self {
        Self {
            node,
            ctx_dep: frame.dep.clone(),
            ctx_visible_if: frame.visible_if.clone(),
            deps: Vec::new(),
            prompt: None,
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
            visible_if: Vec::new(),
            help: None,
            ty: None,
        }
    }
}

struct Parser {
    srctree: PathBuf,
    root_file: PathBuf,
    symbols: Vec<Symbol>,
    choices: Vec<Choice>,
    nodes: Vec<MenuNode>,
    children: Vec<Vec<NodeId>>,
    symbol_index: HashMap<String, SymbolId>,
    choice_index: HashMap<String, ChoiceId>,
    frames: Vec<Frame>,
    pending: Option<Pending>,
    file_stack: Vec<PathBuf>,
    modules: Option<SymbolId>,
}

/// One logical line.
struct Line {
    number: usize,
    indent: usize,
    raw: String,
    tokens: Vec<Token>,
    spans: Vec<Span>,
}

impl Parser {
    fn new(srctree: PathBuf, root_file: PathBuf) -> Self {
        let top = MenuNode::new(MenuItem::Menu, root_file.clone(), 0);
        Self {
            srctree,
            root_file,
            symbols: Vec::new(),
            choices: Vec::new(),
            nodes: vec![top],
            children: vec![Vec::new()],
            symbol_index: HashMap::new(),
            choice_index: HashMap::new(),
            frames: vec![Frame {
                kind: FrameKind::Root,
                node: NodeId(0),
                dep: Expr::yes(),
                visible_if: Expr::yes(),
                line: 0,
            }],
            pending: None,
            file_stack: Vec::new(),
            modules: None,
        }
    }

    fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.symbol_index.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol::new(name.to_string()));
        let _ = self.symbol_index.insert(name.to_string(), id);
        id
    }

    fn frame(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Node new entries are attached to: the innermost non-`if` block.
    fn parent_node(&self) -> NodeId {
        self.frames
            .iter()
            .rev()
            .find(|f| f.kind != FrameKind::If)
            .map_or(NodeId(0), |f| f.node)
    }

    fn add_node(&mut self, item: MenuItem, file: &Path, line: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = MenuNode::new(item, file.to_path_buf(), line);
        node.parent = Some(self.parent_node());
        self.nodes.push(node);
        self.children.push(Vec::new());
        let parent = self.parent_node();
        self.children[parent.0].push(id);
        id
    }

    // ── files ──────────────────────────────────────────────────────────────

    fn include(&mut self, path: &Path, optional: bool) -> Result<()> {
        if optional && !path.exists() {
            trace!(path = %path.display(), "optional source missing");
            return Ok(());
        }
        if self.file_stack.iter().any(|p| p == path) {
            let (file, line) = self.location();
            return Err(KconfigError::syntax(
                file,
                line,
                format!("recursive source of {}", path.display()),
            ));
        }
        let text = std::fs::read_to_string(path).map_err(|e| KconfigError::io(path, e))?;
        self.file_stack.push(path.to_path_buf());
        let result = self.parse_text(&text, path);
        let _ = self.file_stack.pop();
        result
    }

    fn location(&self) -> (PathBuf, usize) {
        self.pending.as_ref().map_or_else(
            || (self.root_file.clone(), 0),
            |p| {
                let n = &self.nodes[p.node.0];
                (n.file.clone(), n.line)
            },
        )
    }

    fn parse_text(&mut self, text: &str, file: &Path) -> Result<()> {
        let lines = logical_lines(text);
        let depth = self.frames.len();
        let mut i = 0;
        while i < lines.len() {
            let line = &lines[i];
            i += 1;
            let spanned = tokenize_spanned(&line.raw)
                .map_err(|msg| KconfigError::syntax(file, line.number, msg))?;
            if spanned.is_empty() {
                continue;
            }
            let (tokens, spans) = spanned.into_iter().unzip();
            let line = Line {
                number: line.number,
                indent: line.indent,
                raw: line.raw.clone(),
                tokens,
                spans,
            };
            if is_help(&line.tokens) {
                let help = read_help(&lines, &mut i, line.indent);
                self.pending_mut(file, line.number, "help")?.help = Some(help);
                continue;
            }
            self.statement(&line, file)?;
        }

        if self.frames.len() != depth {
            let open = self.frame();
            let what = match open.kind {
                FrameKind::Menu => "menu",
                FrameKind::Choice => "choice",
                FrameKind::If => "if",
                FrameKind::Root => "block",
            };
            return Err(KconfigError::syntax(
                file,
                open.line,
                format!("unterminated {what}"),
            ));
        }
        Ok(())
    }

    // ── statements ─────────────────────────────────────────────────────────

    fn statement(&mut self, line: &Line, file: &Path) -> Result<()> {
        let err = |msg: String| KconfigError::syntax(file, line.number, msg);
        let Token::Word(keyword) = &line.tokens[0] else {
            return Err(err(format!(
                "expected keyword, found {}",
                line.tokens[0].describe()
            )));
        };
        let rest = &line.tokens[1..];

        match keyword.as_str() {
            "mainmenu" => {
                let text = single_string(rest).ok_or_else(|| err("mainmenu needs a title".into()))?;
                self.nodes[0].prompt = Some(Prompt {
                    text,
                    condition: Expr::yes(),
                });
            }
            "config" | "menuconfig" => {
                let [Token::Word(name)] = rest else {
                    return Err(err(format!("{keyword} needs a symbol name")));
                };
                self.finalize()?;
                let sym = self.intern(name);
                let node = self.add_node(MenuItem::Symbol(sym), file, line.number);
                self.nodes[node.0].is_menuconfig = keyword == "menuconfig";
                self.symbols[sym.0].nodes.push(node);
                self.pending = Some(Pending::new(node, self.frame()));
            }
            "choice" => {
                self.finalize()?;
                let name = match rest {
                    [] => None,
                    [Token::Word(n)] => Some(n.clone()),
                    _ => return Err(err("malformed choice header".into())),
                };
                let existing = name
                    .as_deref()
                    .and_then(|n| self.choice_index.get(n).copied());
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let id = ChoiceId(self.choices.len());
                        self.choices.push(Choice::new(name.clone()));
                        if let Some(n) = name {
                            let _ = self.choice_index.insert(n, id);
                        }
                        id
                    }
                };
                let node = self.add_node(MenuItem::Choice(id), file, line.number);
                self.choices[id.0].nodes.push(node);
                self.pending = Some(Pending::new(node, self.frame()));
                self.push_frame(FrameKind::Choice, node, line.number);
            }
            "menu" => {
                let text = single_string(rest).ok_or_else(|| err("menu needs a title".into()))?;
                self.finalize()?;
                let node = self.add_node(MenuItem::Menu, file, line.number);
                let mut pending = Pending::new(node, self.frame());
                pending.prompt = Some((text, Expr::yes()));
                self.pending = Some(pending);
                self.push_frame(FrameKind::Menu, node, line.number);
            }
            "comment" => {
                let text = single_string(rest).ok_or_else(|| err("comment needs text".into()))?;
                self.finalize()?;
                let node = self.add_node(MenuItem::Comment, file, line.number);
                let mut pending = Pending::new(node, self.frame());
                pending.prompt = Some((text, Expr::yes()));
                self.pending = Some(pending);
            }
            "if" => {
                self.finalize()?;
                let cond = self.parse_expr(line, 1..line.tokens.len()).map_err(err)?;
                let frame = self.frame();
                let dep = Expr::and(frame.dep.clone(), cond);
                let visible_if = frame.visible_if.clone();
                let node = frame.node;
                self.frames.push(Frame {
                    kind: FrameKind::If,
                    node,
                    dep,
                    visible_if,
                    line: line.number,
                });
            }
            "endmenu" => self.close(FrameKind::Menu, "endmenu", file, line.number)?,
            "endchoice" => self.close(FrameKind::Choice, "endchoice", file, line.number)?,
            "endif" => self.close(FrameKind::If, "endif", file, line.number)?,
            "source" | "rsource" | "osource" | "orsource" => {
                let target = single_string(rest)
                    .or_else(|| match rest {
                        [Token::Word(w)] => Some(w.clone()),
                        _ => None,
                    })
                    .ok_or_else(|| err(format!("{keyword} needs a path")))?;
                self.finalize()?;
                let expanded = PathBuf::from(expand_env(&target));
                let relative = keyword.starts_with('r') || keyword.starts_with("or");
                let base = if relative {
                    file.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
                } else {
                    self.srctree.clone()
                };
                let path = resolve(&base, &expanded);
                trace!(path = %path.display(), "source");
                self.include(&path, keyword.starts_with('o'))?;
            }
            _ => self.property(keyword, rest, line, file)?,
        }
        Ok(())
    }

    fn push_frame(&mut self, kind: FrameKind, node: NodeId, line: usize) {
        // Cumulative dependencies are filled in when the header entry is
        // finalized (its own `depends on` lines follow the header).
        let visible_if = self.frame().visible_if.clone();
        self.frames.push(Frame {
            kind,
            node,
            dep: Expr::yes(),
            visible_if,
            line,
        });
    }

    fn close(&mut self, kind: FrameKind, keyword: &str, file: &Path, line: usize) -> Result<()> {
        self.finalize()?;
        if self.frames.len() <= 1 || self.frame().kind != kind {
            return Err(KconfigError::syntax(
                file,
                line,
                format!("unexpected '{keyword}'"),
            ));
        }
        let _ = self.frames.pop();
        Ok(())
    }

    fn pending_mut(&mut self, file: &Path, line: usize, what: &str) -> Result<&mut Pending> {
        self.pending.as_mut().ok_or_else(|| {
            KconfigError::syntax(file, line, format!("'{what}' outside of an entry"))
        })
    }

    // ── properties ─────────────────────────────────────────────────────────

    fn property(&mut self, keyword: &str, rest: &[Token], line: &Line, file: &Path) -> Result<()> {
        let err = |msg: String| KconfigError::syntax(file, line.number, msg);
        let (body, cond_tokens) = split_if(rest);
        // `rest` starts after the keyword; a condition follows `if`.
        let body_end = 1 + body.len();
        let cond = match cond_tokens {
            Some(_) => self
                .parse_expr(line, body_end + 1..line.tokens.len())
                .map_err(err)?,
            None => Expr::yes(),
        };

        match keyword {
            "bool" | "boolean" | "tristate" | "string" | "int" | "hex" => {
                let ty = match keyword {
                    "bool" | "boolean" => SymbolType::Bool,
                    "tristate" => SymbolType::Tristate,
                    "string" => SymbolType::String,
                    "int" => SymbolType::Int,
                    _ => SymbolType::Hex,
                };
                let prompt = match body {
                    [] => None,
                    _ => Some(single_string(body).ok_or_else(|| err("malformed prompt".into()))?),
                };
                let pending = self.pending_mut(file, line.number, keyword)?;
                pending.ty = Some(ty);
                if let Some(text) = prompt {
                    pending.prompt = Some((text, cond));
                }
            }
            "def_bool" | "def_tristate" => {
                let value = self.parse_expr(line, 1..body_end).map_err(err)?;
                let pending = self.pending_mut(file, line.number, keyword)?;
                pending.ty = Some(if keyword == "def_bool" {
                    SymbolType::Bool
                } else {
                    SymbolType::Tristate
                });
                pending.defaults.push((value, cond));
            }
            "prompt" => {
                let text = single_string(body).ok_or_else(|| err("malformed prompt".into()))?;
                self.pending_mut(file, line.number, keyword)?.prompt = Some((text, cond));
            }
            "default" => {
                let value = self.parse_expr(line, 1..body_end).map_err(err)?;
                self.pending_mut(file, line.number, keyword)?
                    .defaults
                    .push((value, cond));
            }
            "depends" => {
                let [Token::Word(on), ..] = body else {
                    return Err(err("expected 'depends on'".into()));
                };
                if on != "on" || cond_tokens.is_some() {
                    return Err(err("expected 'depends on <expr>'".into()));
                }
                let dep = self.parse_expr(line, 2..body_end).map_err(err)?;
                self.pending_mut(file, line.number, keyword)?.deps.push(dep);
            }
            "select" | "imply" => {
                let [Token::Word(target)] = body else {
                    return Err(err(format!("{keyword} needs a symbol name")));
                };
                let target = self.intern(target);
                let pending = self.pending_mut(file, line.number, keyword)?;
                if keyword == "select" {
                    pending.selects.push((target, cond));
                } else {
                    pending.implies.push((target, cond));
                }
            }
            "range" => {
                let [_, _] = body else {
                    return Err(err("range needs two bounds".into()));
                };
                let low = self.parse_expr(line, 1..2).map_err(err)?;
                let high = self.parse_expr(line, 2..3).map_err(err)?;
                self.pending_mut(file, line.number, keyword)?
                    .ranges
                    .push((low, high, cond));
            }
            "visible" => {
                if !body.is_empty() || cond_tokens.is_none() {
                    return Err(err("expected 'visible if <expr>'".into()));
                }
                self.pending_mut(file, line.number, keyword)?.visible_if.push(cond);
            }
            "optional" => {
                let node = self.pending_mut(file, line.number, keyword)?.node;
                if let MenuItem::Choice(c) = self.nodes[node.0].item {
                    self.choices[c.0].optional = true;
                } else {
                    return Err(err("'optional' outside of a choice".into()));
                }
            }
            "modules" => self.mark_modules(file, line.number)?,
            "option" => match body {
                [Token::Word(w)] if w == "modules" => self.mark_modules(file, line.number)?,
                _ => trace!(line = %line.raw.trim(), "ignoring option"),
            },
            "transitional" | "allnoconfig_y" => {}
            _ => return Err(err(format!("unknown keyword '{keyword}'"))),
        }
        Ok(())
    }

    fn mark_modules(&mut self, file: &Path, line: usize) -> Result<()> {
        let node = self.pending_mut(file, line, "modules")?.node;
        if let MenuItem::Symbol(sym) = self.nodes[node.0].item {
            self.modules = Some(sym);
        }
        Ok(())
    }

    // ── expressions ────────────────────────────────────────────────────────

    fn parse_expr(&mut self, line: &Line, range: Range<usize>) -> std::result::Result<Expr, String> {
        let tokens = line.tokens[range.clone()]
            .iter()
            .cloned()
            .zip(line.spans[range].iter().cloned())
            .collect();
        let raw = parse_expression(tokens, line.raw.len())?;
        Ok(self.lower(raw))
    }

    fn lower(&mut self, raw: RawExpr) -> Expr {
        match raw {
            RawExpr::Const(value) => Expr::Const(value),
            RawExpr::Sym(name) => Expr::Sym(self.intern(&name)),
            RawExpr::Not(e) => Expr::Not(Box::new(self.lower(*e))),
            RawExpr::And(l, r) => Expr::And(Box::new(self.lower(*l)), Box::new(self.lower(*r))),
            RawExpr::Or(l, r) => Expr::Or(Box::new(self.lower(*l)), Box::new(self.lower(*r))),
            RawExpr::Cmp(op, l, r) => {
                Expr::Cmp(op, Box::new(self.lower(*l)), Box::new(self.lower(*r)))
            }
        }
    }

    // ── finalize ───────────────────────────────────────────────────────────

    fn finalize(&mut self) -> Result<()> {
        let Some(p) = self.pending.take() else {
            return Ok(());
        };
        let own_dep = Expr::and_all(p.deps);
        let dep = Expr::and(p.ctx_dep, own_dep);
        let item = self.nodes[p.node.0].item;

        let prompt = p.prompt.map(|(text, cond)| {
            let mut condition = Expr::and(cond, dep.clone());
            if matches!(item, MenuItem::Symbol(_) | MenuItem::Choice(_)) {
                condition = Expr::and(condition, p.ctx_visible_if.clone());
            }
            Prompt { text, condition }
        });

        let node = &mut self.nodes[p.node.0];
        node.dep = dep.clone();
        node.prompt = prompt;
        node.help = p.help;
        node.visible_if = Expr::and_all(p.visible_if);
        let visible_if = node.visible_if.clone();

        match item {
            MenuItem::Symbol(sym) => {
                let s = &mut self.symbols[sym.0];
                if let Some(ty) = p.ty {
                    s.ty = ty;
                }
                s.direct_dep = Expr::or(mem::replace(&mut s.direct_dep, Expr::no()), dep.clone());
                for (value, cond) in p.defaults {
                    s.defaults.push((value, Expr::and(cond, dep.clone())));
                }
                for (low, high, cond) in p.ranges {
                    s.ranges.push((low, high, Expr::and(cond, dep.clone())));
                }
                for (target, cond) in p.selects {
                    let term = Expr::and(Expr::Sym(sym), Expr::and(cond, dep.clone()));
                    let t = &mut self.symbols[target.0];
                    t.rev_dep = Expr::or(mem::replace(&mut t.rev_dep, Expr::no()), term);
                }
                for (target, cond) in p.implies {
                    let term = Expr::and(Expr::Sym(sym), Expr::and(cond, dep.clone()));
                    let t = &mut self.symbols[target.0];
                    t.weak_rev_dep = Expr::or(mem::replace(&mut t.weak_rev_dep, Expr::no()), term);
                }
            }
            MenuItem::Choice(choice) => {
                let file = self.nodes[p.node.0].file.clone();
                let line = self.nodes[p.node.0].line;
                if let Some(ty) = p.ty {
                    self.choices[choice.0].ty = ty;
                }
                for (value, cond) in p.defaults {
                    let Expr::Sym(member) = value else {
                        return Err(KconfigError::syntax(
                            file.clone(),
                            line,
                            "choice default must name a symbol",
                        ));
                    };
                    self.choices[choice.0]
                        .defaults
                        .push((member, Expr::and(cond, dep.clone())));
                }
            }
            MenuItem::Menu | MenuItem::Comment => {}
        }

        // Open blocks inherit the header's finalized dependency.
        if let Some(frame) = self.frames.iter_mut().rev().find(|f| f.node == p.node) {
            frame.dep = dep;
            frame.visible_if = Expr::and(frame.visible_if.clone(), visible_if);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Kconfig> {
        self.finalize()?;

        let top_children = mem::take(&mut self.children[0]);
        self.children[0] = self.build_auto_menus(top_children);
        self.link(NodeId(0));
        self.assign_choice_members();

        let modules = self
            .modules
            .or_else(|| self.symbol_index.get("MODULES").copied());

        debug!(
            symbols = self.symbols.len(),
            choices = self.choices.len(),
            nodes = self.nodes.len(),
            "definitions parsed"
        );

        Ok(Kconfig {
            symbols: self.symbols,
            choices: self.choices,
            nodes: self.nodes,
            symbol_index: self.symbol_index,
            choice_index: self.choice_index,
            top: NodeId(0),
            modules,
            root_file: self.root_file,
            prefix: DEFAULT_PREFIX.to_string(),
            cache: RefCell::new(EvalCache::default()),
        })
    }

    /// Move entries that depend on a preceding symbol underneath it.
    fn build_auto_menus(&mut self, list: Vec<NodeId>) -> Vec<NodeId> {
        let mut rest: VecDeque<NodeId> = list.into();
        let mut out = Vec::with_capacity(rest.len());
        while let Some(node) = rest.pop_front() {
            self.absorb_followers(node, &mut rest);
            out.push(node);
        }
        out
    }

    fn absorb_followers(&mut self, node: NodeId, rest: &mut VecDeque<NodeId>) {
        let own = mem::take(&mut self.children[node.0]);
        let mut own = self.build_auto_menus(own);
        if let MenuItem::Symbol(sym) = self.nodes[node.0].item {
            while let Some(&next) = rest.front() {
                if !self.has_auto_menu_dep(next, sym) {
                    break;
                }
                let _ = rest.pop_front();
                self.absorb_followers(next, rest);
                own.push(next);
            }
        }
        self.children[node.0] = own;
    }

    fn has_auto_menu_dep(&self, node: NodeId, sym: SymbolId) -> bool {
        let n = &self.nodes[node.0];
        match &n.prompt {
            Some(p) => p.condition.depends_on(sym),
            None => n.dep.depends_on(sym),
        }
    }

    fn link(&mut self, node: NodeId) {
        let list = mem::take(&mut self.children[node.0]);
        self.nodes[node.0].first_child = list.first().copied();
        for (i, &child) in list.iter().enumerate() {
            self.nodes[child.0].parent = Some(node);
            self.nodes[child.0].next = list.get(i + 1).copied();
            self.link(child);
        }
    }

    fn assign_choice_members(&mut self) {
        for c in 0..self.choices.len() {
            let mut members = Vec::new();
            for &node in &self.choices[c].nodes {
                let mut cur = self.nodes[node.0].first_child;
                while let Some(child) = cur {
                    if let MenuItem::Symbol(sym) = self.nodes[child.0].item {
                        if !members.contains(&sym) {
                            members.push(sym);
                        }
                    }
                    cur = self.nodes[child.0].next;
                }
            }

            let choice = &mut self.choices[c];
            if choice.ty == SymbolType::Unknown {
                choice.ty = members
                    .iter()
                    .map(|m| self.symbols[m.0].ty)
                    .find(|t| *t != SymbolType::Unknown)
                    .unwrap_or(SymbolType::Bool);
            }
            let ty = choice.ty;
            for &m in &members {
                let sym = &mut self.symbols[m.0];
                sym.choice = Some(ChoiceId(c));
                if sym.ty == SymbolType::Unknown {
                    sym.ty = ty;
                }
            }
            self.choices[c].members = members;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Physical line with its 1-based number and indentation. Continued lines
/// are joined and keep the number of their first line.
struct RawLine {
    number: usize,
    indent: usize,
    raw: String,
}

fn logical_lines(text: &str) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut physical = text.lines().enumerate();
    while let Some((idx, line)) = physical.next() {
        let mut raw = line.to_string();
        while raw.ends_with('\\') {
            let _ = raw.pop();
            match physical.next() {
                Some((_, next)) => raw.push_str(next),
                None => break,
            }
        }
        out.push(RawLine {
            number: idx + 1,
            indent: indentation(line),
            raw,
        });
    }
    out
}

fn is_help(tokens: &[Token]) -> bool {
    matches!(tokens, [Token::Word(w)] if w == "help" || w == "---help---")
}

/// Read the help block following a `help` line. The block ends at the first
/// non-blank line indented no deeper than the `help` keyword; its common
/// indentation is stripped.
fn read_help(lines: &[RawLine], i: &mut usize, help_indent: usize) -> String {
    let mut block: Vec<&RawLine> = Vec::new();
    let mut text_indent: Option<usize> = None;
    while let Some(line) = lines.get(*i) {
        if line.raw.trim().is_empty() {
            block.push(line);
            *i += 1;
            continue;
        }
        let limit = text_indent.unwrap_or(help_indent + 1);
        if line.indent < limit || line.indent <= help_indent {
            break;
        }
        if text_indent.is_none() {
            text_indent = Some(line.indent);
        }
        block.push(line);
        *i += 1;
    }

    // Trailing blank lines belong to whatever follows.
    while block.last().is_some_and(|l| l.raw.trim().is_empty()) {
        let _ = block.pop();
        *i -= 1;
    }

    let strip = text_indent.unwrap_or(0);
    block
        .iter()
        .map(|l| strip_indent(&l.raw, strip))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_indent(line: &str, width: usize) -> String {
    let mut col = 0;
    for (pos, c) in line.char_indices() {
        if col >= width {
            return line[pos..].to_string();
        }
        match c {
            ' ' => col += 1,
            '\t' => col = (col / 8 + 1) * 8,
            _ => return line[pos..].to_string(),
        }
    }
    String::new()
}

fn single_string(tokens: &[Token]) -> Option<String> {
    match tokens {
        [Token::Str(s)] => Some(s.clone()),
        _ => None,
    }
}

/// Split `body if cond` at the first top-level `if`.
fn split_if(tokens: &[Token]) -> (&[Token], Option<&[Token]>) {
    match tokens
        .iter()
        .position(|t| matches!(t, Token::Word(w) if w == "if"))
    {
        Some(pos) => (&tokens[..pos], Some(&tokens[pos + 1..])),
        None => (tokens, None),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
