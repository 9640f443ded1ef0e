//! Dependency expressions.
//!
//! Expressions are built by the parser and evaluated by the graph. Operands
//! are either constants (`n`/`m`/`y`, numbers, quoted strings) or symbol
//! references. Helper constructors fold trivial `y`/`n` operands so that
//! propagated dependencies stay readable when printed.

use crate::graph::SymbolId;

/// Comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// Source form of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A dependency expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Constant: `n`, `m`, `y`, a number, or a quoted string.
    Const(String),
    /// Reference to a symbol (defined or not).
    Sym(SymbolId),
    /// `!e`
    Not(Box<Expr>),
    /// `a && b`
    And(Box<Expr>, Box<Expr>),
    /// `a || b`
    Or(Box<Expr>, Box<Expr>),
    /// `a <op> b`
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// The constant `y`.
    pub fn yes() -> Self {
        Self::Const("y".to_string())
    }

    /// The constant `n`.
    pub fn no() -> Self {
        Self::Const("n".to_string())
    }

    /// Whether this is the literal `y`.
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Const(s) if s == "y")
    }

    /// Whether this is the literal `n`.
    pub fn is_no(&self) -> bool {
        matches!(self, Self::Const(s) if s == "n")
    }

    /// `a && b`, folding `y` and `n` operands.
    #[must_use]
    pub fn and(a: Expr, b: Expr) -> Expr {
        if a.is_yes() || b.is_no() {
            return b;
        }
        if b.is_yes() || a.is_no() {
            return a;
        }
        Expr::And(Box::new(a), Box::new(b))
    }

    /// `a || b`, folding `y` and `n` operands.
    #[must_use]
    pub fn or(a: Expr, b: Expr) -> Expr {
        if a.is_no() || b.is_yes() {
            return b;
        }
        if b.is_no() || a.is_yes() {
            return a;
        }
        Expr::Or(Box::new(a), Box::new(b))
    }

    /// Conjunction of every expression in `items` (`y` when empty).
    #[must_use]
    pub fn and_all(items: impl IntoIterator<Item = Expr>) -> Expr {
        items.into_iter().fold(Expr::yes(), Expr::and)
    }

    /// Whether `self` requires `sym` to be enabled, in the sense used to build
    /// automatic sub-menus: `sym`, `sym = y|m`, `sym != n`, or a conjunction
    /// containing one of those.
    pub fn depends_on(&self, sym: SymbolId) -> bool {
        match self {
            Expr::Sym(s) => *s == sym,
            Expr::And(a, b) => a.depends_on(sym) || b.depends_on(sym),
            Expr::Cmp(op, lhs, rhs) => {
                let other = match (lhs.as_ref(), rhs.as_ref()) {
                    (Expr::Sym(s), other) | (other, Expr::Sym(s)) if *s == sym => other,
                    _ => return false,
                };
                match (op, other) {
                    (CmpOp::Eq, Expr::Const(c)) => c == "y" || c == "m",
                    (CmpOp::Ne, Expr::Const(c)) => c == "n",
                    _ => false,
                }
            }
            Expr::Const(_) | Expr::Not(_) | Expr::Or(_, _) => false,
        }
    }

    /// Render the expression using `name_of` for symbol references.
    pub fn render(&self, name_of: &dyn Fn(SymbolId) -> String) -> String {
        self.render_prec(name_of, 0)
    }

    // Precedence: || = 1, && = 2, ! and comparisons = 3.
    fn render_prec(&self, name_of: &dyn Fn(SymbolId) -> String, parent: u8) -> String {
        let (prec, text) = match self {
            Expr::Const(s) => (4, render_const(s)),
            Expr::Sym(id) => (4, name_of(*id)),
            Expr::Not(inner) => (3, format!("!{}", inner.render_prec(name_of, 3))),
            Expr::Cmp(op, a, b) => (
                3,
                format!(
                    "{} {} {}",
                    a.render_prec(name_of, 4),
                    op.as_str(),
                    b.render_prec(name_of, 4)
                ),
            ),
            Expr::And(a, b) => (
                2,
                format!(
                    "{} && {}",
                    a.render_prec(name_of, 2),
                    b.render_prec(name_of, 2)
                ),
            ),
            Expr::Or(a, b) => (
                1,
                format!(
                    "{} || {}",
                    a.render_prec(name_of, 1),
                    b.render_prec(name_of, 1)
                ),
            ),
        };
        if prec < parent {
            format!("({text})")
        } else {
            text
        }
    }
}

fn render_const(s: &str) -> String {
    let bare = matches!(s, "n" | "m" | "y") || is_number(s);
    if bare {
        s.to_string()
    } else {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Whether `s` is a decimal or `0x`-prefixed hexadecimal literal.
pub(crate) fn is_number(s: &str) -> bool {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
