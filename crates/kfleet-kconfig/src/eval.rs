//! Value evaluation.
//!
//! Values are computed on demand and memoized in an [`EvalCache`] owned by
//! the graph. Every mutation clears the cache. A slot found busy while it is
//! being computed means the definitions contain a dependency loop; the
//! evaluation then falls back to `n` / empty and logs a warning.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{KconfigError, Result};
use crate::expr::{CmpOp, Expr};
use crate::graph::{ChoiceId, Kconfig, NodeId, SymbolId, SymbolType};
use crate::tristate::Tristate;

static INT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-+]?[0-9]+$").unwrap());
static HEX_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[xX])?[0-9a-fA-F]+$").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) enum Slot<T> {
    Empty,
    Busy,
    Done(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Memoized evaluation results.
#[derive(Debug, Default)]
pub(crate) struct EvalCache {
    /// Tri-state value plus whether the symbol is written to a profile.
    sym_tri: Vec<Slot<(Tristate, bool)>>,
    /// String value plus the write flag.
    sym_str: Vec<Slot<(String, bool)>>,
    sym_vis: Vec<Slot<Tristate>>,
    choice_mode: Vec<Slot<Tristate>>,
    choice_sel: Vec<Slot<Option<SymbolId>>>,
}

impl EvalCache {
    fn fit(&mut self, symbols: usize, choices: usize) {
        if self.sym_tri.len() < symbols {
            self.sym_tri.resize_with(symbols, Slot::default);
            self.sym_str.resize_with(symbols, Slot::default);
            self.sym_vis.resize_with(symbols, Slot::default);
        }
        if self.choice_mode.len() < choices {
            self.choice_mode.resize_with(choices, Slot::default);
            self.choice_sel.resize_with(choices, Slot::default);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.sym_tri.clear();
        self.sym_str.clear();
        self.sym_vis.clear();
        self.choice_mode.clear();
        self.choice_sel.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

impl Kconfig {
    fn memo<T: Clone>(
        &self,
        slot: impl for<'a> Fn(&'a mut EvalCache) -> &'a mut Slot<T>,
        on_loop: T,
        item: &str,
        compute: impl FnOnce() -> T,
    ) -> T {
        {
            let mut cache = self.cache.borrow_mut();
            cache.fit(self.symbols.len(), self.choices.len());
            let entry = slot(&mut *cache);
            match &*entry {
                Slot::Done(value) => return value.clone(),
                Slot::Busy => {
                    warn!(item, "dependency loop detected, using fallback value");
                    return on_loop;
                }
                Slot::Empty => {}
            }
            *entry = Slot::Busy;
        }
        let value = compute();
        let mut cache = self.cache.borrow_mut();
        cache.fit(self.symbols.len(), self.choices.len());
        *slot(&mut *cache) = Slot::Done(value.clone());
        value
    }

    /// Drop every memoized value.
    pub(crate) fn invalidate(&mut self) {
        self.cache.get_mut().clear();
    }

    /// Evaluate an expression to a tri-state.
    pub fn eval(&self, expr: &Expr) -> Tristate {
        match expr {
            Expr::Const(c) => c.parse().unwrap_or(Tristate::No),
            Expr::Sym(id) => self.tri_value(*id),
            Expr::Not(inner) => self.eval(inner).negate(),
            Expr::And(a, b) => self.eval(a).min(self.eval(b)),
            Expr::Or(a, b) => self.eval(a).max(self.eval(b)),
            Expr::Cmp(op, a, b) => Tristate::from_bool(self.compare(*op, a, b)),
        }
    }

    fn compare(&self, op: CmpOp, lhs: &Expr, rhs: &Expr) -> bool {
        let (a, ta) = self.operand(lhs);
        let (b, tb) = self.operand(rhs);
        let ordering = if ta == Some(SymbolType::String) || tb == Some(SymbolType::String) {
            a.cmp(&b)
        } else {
            match (self.to_number(lhs, &a, ta), self.to_number(rhs, &b, tb)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.cmp(&b),
            }
        };
        match op {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }

    /// String value and declared type of a comparison operand.
    fn operand(&self, expr: &Expr) -> (String, Option<SymbolType>) {
        match expr {
            Expr::Const(c) => (c.clone(), None),
            Expr::Sym(id) => (self.str_value(*id), Some(self.symbols[id.0].ty)),
            other => (self.eval(other).as_str().to_string(), None),
        }
    }

    fn to_number(&self, expr: &Expr, text: &str, ty: Option<SymbolType>) -> Option<i64> {
        match (expr, ty) {
            (Expr::Sym(id), Some(SymbolType::Bool | SymbolType::Tristate)) => {
                Some(i64::from(self.tri_value(*id).ordinal()))
            }
            (_, Some(SymbolType::Int)) => text.parse().ok(),
            (_, Some(SymbolType::Hex)) => parse_hex(text),
            _ => parse_auto(text),
        }
    }

    /// String value of an expression used as a default or range bound.
    fn expr_value_str(&self, expr: &Expr) -> String {
        match expr {
            Expr::Const(c) => c.clone(),
            Expr::Sym(id) => self.str_value(*id),
            other => self.eval(other).as_str().to_string(),
        }
    }

    /// Whether `m` is currently allowed.
    pub fn modules_enabled(&self) -> bool {
        self.modules
            .is_some_and(|m| self.tri_value(m).is_enabled())
    }

    /// Type after accounting for modules support: tristate symbols behave
    /// as bool when modules are off or inside a choice.
    pub fn effective_type(&self, sym: SymbolId) -> SymbolType {
        let s = &self.symbols[sym.0];
        if s.ty == SymbolType::Tristate && (s.choice.is_some() || !self.modules_enabled()) {
            SymbolType::Bool
        } else {
            s.ty
        }
    }

    /// Evaluated prompt condition of a node, `n` when it has no prompt.
    pub fn prompt_visibility(&self, node: NodeId) -> Tristate {
        self.nodes[node.0]
            .prompt
            .as_ref()
            .map_or(Tristate::No, |p| self.eval(&p.condition))
    }

    /// Visibility of a symbol: the best of its prompt conditions, limited by
    /// the owning choice's mode.
    pub fn visibility(&self, sym: SymbolId) -> Tristate {
        let name = &self.symbols[sym.0].name;
        self.memo(
            |c| &mut c.sym_vis[sym.0],
            Tristate::No,
            name,
            || {
                let s = &self.symbols[sym.0];
                let mut vis = s
                    .nodes
                    .iter()
                    .map(|n| self.prompt_visibility(*n))
                    .max()
                    .unwrap_or(Tristate::No);
                if let Some(choice) = s.choice {
                    vis = vis.min(self.choice_mode(choice));
                }
                if vis == Tristate::Module && self.effective_type(sym) != SymbolType::Tristate {
                    vis = Tristate::Yes;
                }
                vis
            },
        )
    }

    /// Visibility of a choice group.
    pub fn choice_visibility(&self, choice: ChoiceId) -> Tristate {
        let vis = self.choices[choice.0]
            .nodes
            .iter()
            .map(|n| self.prompt_visibility(*n))
            .max()
            .unwrap_or(Tristate::No);
        if vis == Tristate::Module {
            Tristate::Yes
        } else {
            vis
        }
    }

    /// Mode of a choice group: `y` when one member must be selected, `n`
    /// when the group is invisible or an unset optional choice.
    pub fn choice_mode(&self, choice: ChoiceId) -> Tristate {
        let label = self.choices[choice.0].name.as_deref().unwrap_or("<choice>");
        self.memo(
            |c| &mut c.choice_mode[choice.0],
            Tristate::No,
            label,
            || {
                let ch = &self.choices[choice.0];
                let mut mode = if ch.optional {
                    Tristate::No
                } else {
                    Tristate::Module
                };
                if let Some(user) = ch.user_mode {
                    mode = mode.max(user);
                }
                mode = mode.min(self.choice_visibility(choice));
                // Choices behave as bool groups.
                if mode == Tristate::Module {
                    mode = Tristate::Yes;
                }
                mode
            },
        )
    }

    /// Selected member of a choice group, if the group is active.
    pub fn choice_selection(&self, choice: ChoiceId) -> Option<SymbolId> {
        let label = self.choices[choice.0].name.as_deref().unwrap_or("<choice>");
        self.memo(
            |c| &mut c.choice_sel[choice.0],
            None,
            label,
            || {
                if self.choice_mode(choice) != Tristate::Yes {
                    return None;
                }
                let ch = &self.choices[choice.0];
                if let Some(sel) = ch.user_selection {
                    if self.visibility(sel).is_enabled() {
                        return Some(sel);
                    }
                }
                ch.defaults
                    .iter()
                    .find(|(sym, cond)| {
                        self.eval(cond).is_enabled() && self.visibility(*sym).is_enabled()
                    })
                    .map(|(sym, _)| *sym)
                    .or_else(|| {
                        ch.members
                            .iter()
                            .copied()
                            .find(|m| self.visibility(*m).is_enabled())
                    })
            },
        )
    }

    /// Tri-state value. `n` for string, int, hex and untyped symbols.
    pub fn tri_value(&self, sym: SymbolId) -> Tristate {
        self.tri_entry(sym).0
    }

    fn tri_entry(&self, sym: SymbolId) -> (Tristate, bool) {
        let name = &self.symbols[sym.0].name;
        self.memo(
            |c| &mut c.sym_tri[sym.0],
            (Tristate::No, false),
            name,
            || self.compute_tri(sym),
        )
    }

    fn compute_tri(&self, sym: SymbolId) -> (Tristate, bool) {
        let s = &self.symbols[sym.0];
        if !s.ty.is_bool_like() {
            return (Tristate::No, false);
        }
        let ty = self.effective_type(sym);
        let vis = self.visibility(sym);
        let mut write = vis.is_enabled();
        let mut value = Tristate::No;

        if let Some(choice) = s.choice {
            if vis == Tristate::Yes && self.choice_selection(choice) == Some(sym) {
                value = Tristate::Yes;
            }
            return (value, write);
        }

        let user = s.user_value.as_deref().and_then(|v| v.parse::<Tristate>().ok());
        match user {
            Some(user) if vis.is_enabled() => value = user.min(vis),
            _ => {
                for (default, cond) in &s.defaults {
                    let cond = self.eval(cond);
                    if cond.is_enabled() {
                        value = self.eval(default).min(cond);
                        if value.is_enabled() {
                            write = true;
                        }
                        break;
                    }
                }
                let implied = self.eval(&s.weak_rev_dep);
                if implied.is_enabled() && self.eval(&s.direct_dep).is_enabled() {
                    value = value.max(implied);
                    write = true;
                }
            }
        }

        let selected = self.eval(&s.rev_dep);
        if selected.is_enabled() {
            if self.eval(&s.direct_dep) < selected {
                warn!(
                    symbol = %s.name,
                    "selected while its own dependencies are unmet"
                );
            }
            value = value.max(selected);
            write = true;
        }

        if value == Tristate::Module
            && (ty == SymbolType::Bool || self.eval(&s.weak_rev_dep) == Tristate::Yes)
        {
            value = Tristate::Yes;
        }
        (value, write)
    }

    /// Normalized string value: `n`/`m`/`y` for bool and tristate symbols,
    /// the effective text for string, int and hex symbols, and the name
    /// itself for untyped symbols.
    pub fn str_value(&self, sym: SymbolId) -> String {
        let s = &self.symbols[sym.0];
        match s.ty {
            SymbolType::Unknown => s.name.clone(),
            SymbolType::Bool | SymbolType::Tristate => self.tri_value(sym).as_str().to_string(),
            SymbolType::String | SymbolType::Int | SymbolType::Hex => self.str_entry(sym).0,
        }
    }

    fn str_entry(&self, sym: SymbolId) -> (String, bool) {
        let name = &self.symbols[sym.0].name;
        self.memo(
            |c| &mut c.sym_str[sym.0],
            (String::new(), false),
            name,
            || self.compute_str(sym),
        )
    }

    fn compute_str(&self, sym: SymbolId) -> (String, bool) {
        let s = &self.symbols[sym.0];
        let numeric = s.ty.is_numeric();
        let vis = self.visibility(sym);
        let mut write = vis.is_enabled();
        let range = if numeric { self.active_range(sym) } else { None };

        if vis.is_enabled() {
            if let Some(user) = &s.user_value {
                let in_range = match (range, parse_typed(user, s.ty)) {
                    (Some((low, high)), Some(n)) => (low..=high).contains(&n),
                    (Some(_), None) => false,
                    (None, _) => true,
                };
                if in_range {
                    return (user.clone(), write);
                }
                warn!(symbol = %s.name, value = %user, "value outside of active range, using default");
            }
        }

        let mut value = String::new();
        for (default, cond) in &s.defaults {
            if self.eval(cond).is_enabled() {
                value = self.expr_value_str(default);
                write = true;
                break;
            }
        }

        if let Some((low, high)) = range {
            let clamped = match parse_typed(&value, s.ty) {
                Some(n) if n < low => Some(low),
                Some(n) if n > high => Some(high),
                Some(_) => None,
                None => Some(low),
            };
            if let Some(n) = clamped {
                value = format_typed(n, s.ty);
            }
        }
        (value, write)
    }

    /// First range whose condition holds, as `(low, high)`.
    fn active_range(&self, sym: SymbolId) -> Option<(i64, i64)> {
        let s = &self.symbols[sym.0];
        s.ranges
            .iter()
            .find(|(_, _, cond)| self.eval(cond).is_enabled())
            .and_then(|(low, high, _)| {
                let low = parse_typed(&self.expr_value_str(low), s.ty)?;
                let high = parse_typed(&self.expr_value_str(high), s.ty)?;
                Some((low, high))
            })
    }

    /// Whether the symbol has a line in a written profile.
    pub fn write_to_conf(&self, sym: SymbolId) -> bool {
        match self.symbols[sym.0].ty {
            SymbolType::Unknown => false,
            SymbolType::Bool | SymbolType::Tristate => self.tri_entry(sym).1,
            SymbolType::String | SymbolType::Int | SymbolType::Hex => self.str_entry(sym).1,
        }
    }

    // ── mutation ───────────────────────────────────────────────────────────

    /// Assign a user value, validated against the declared type.
    ///
    /// Assigning `y` to a choice member also makes it the group's selection.
    /// The value only takes effect while the symbol is visible.
    pub fn set_value(&mut self, sym: SymbolId, value: &str) -> Result<()> {
        let s = &self.symbols[sym.0];
        if !s.is_defined() || s.ty == SymbolType::Unknown {
            return Err(KconfigError::UnknownSymbol(s.name.clone()));
        }
        let valid = match s.ty {
            SymbolType::Bool => matches!(value, "n" | "y"),
            SymbolType::Tristate => matches!(value, "n" | "m" | "y"),
            SymbolType::Int => INT_VALUE.is_match(value),
            SymbolType::Hex => HEX_VALUE.is_match(value),
            SymbolType::String | SymbolType::Unknown => true,
        };
        if !valid {
            return Err(KconfigError::InvalidValue {
                name: s.name.clone(),
                value: value.to_string(),
                kind: s.ty.as_str(),
            });
        }

        let choice = s.choice;
        self.symbols[sym.0].user_value = Some(value.to_string());
        if let Some(choice) = choice {
            if value == "y" {
                let ch = &mut self.choices[choice.0];
                ch.user_selection = Some(sym);
                ch.user_mode = Some(Tristate::Yes);
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Forget every user value and choice selection.
    pub fn unset_all(&mut self) {
        for s in &mut self.symbols {
            s.user_value = None;
        }
        for c in &mut self.choices {
            c.user_selection = None;
            c.user_mode = None;
        }
        self.invalidate();
    }
}

fn parse_hex(text: &str) -> Option<i64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    i64::from_str_radix(digits, 16).ok()
}

fn parse_auto(text: &str) -> Option<i64> {
    if text.starts_with("0x") || text.starts_with("0X") {
        parse_hex(text)
    } else {
        text.parse().ok()
    }
}

fn parse_typed(text: &str, ty: SymbolType) -> Option<i64> {
    match ty {
        SymbolType::Hex => parse_hex(text),
        _ => parse_auto(text),
    }
}

fn format_typed(n: i64, ty: SymbolType) -> String {
    if ty == SymbolType::Hex {
        format!("{n:#x}")
    } else {
        n.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(text: &str) -> Kconfig {
        Kconfig::parse_str(text, "Kconfig").unwrap()
    }

    fn sym(g: &Kconfig, name: &str) -> SymbolId {
        g.lookup_symbol(name).unwrap()
    }

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
"#;

    // ── bool / string / int ──

    #[test]
    fn defaults_apply_when_unset() {
        let g = parse(CANBUS);
        assert_eq!(g.str_value(sym(&g, "BOARD_MCU")), "stm32");
        assert_eq!(g.tri_value(sym(&g, "CANBUS_INTERFACE")), Tristate::No);
        assert_eq!(g.visibility(sym(&g, "CANBUS_SPEED")), Tristate::No);
        assert_eq!(g.str_value(sym(&g, "CANBUS_SPEED")), "");
    }

    #[test]
    fn enabling_dependency_reveals_symbol() {
        let mut g = parse(CANBUS);
        let iface = sym(&g, "CANBUS_INTERFACE");
        g.set_value(iface, "y").unwrap();
        let speed = sym(&g, "CANBUS_SPEED");
        assert_eq!(g.visibility(speed), Tristate::Yes);
        assert_eq!(g.str_value(speed), "1000000");
        assert!(g.write_to_conf(speed));
    }

    #[test]
    fn user_value_ignored_while_invisible() {
        let mut g = parse(CANBUS);
        let speed = sym(&g, "CANBUS_SPEED");
        g.set_value(speed, "500000").unwrap();
        assert_eq!(g.str_value(speed), "");
        assert!(!g.write_to_conf(speed));
    }

    #[test]
    fn select_forces_value_and_write() {
        let mut g = parse(
            r#"
config USB
    bool "USB"
    select HAVE_GPIO
config HAVE_GPIO
    bool
"#,
        );
        let gpio = sym(&g, "HAVE_GPIO");
        assert_eq!(g.tri_value(gpio), Tristate::No);
        assert!(!g.write_to_conf(gpio));
        g.set_value(sym(&g, "USB"), "y").unwrap();
        assert_eq!(g.tri_value(gpio), Tristate::Yes);
        assert!(g.write_to_conf(gpio));
    }

    #[test]
    fn imply_requires_direct_dependencies() {
        let mut g = parse(
            r#"
config A
    bool "A"
    imply B
config GATE
    bool "gate"
config B
    bool "B"
    depends on GATE
"#,
        );
        g.set_value(sym(&g, "A"), "y").unwrap();
        assert_eq!(g.tri_value(sym(&g, "B")), Tristate::No);
        g.set_value(sym(&g, "GATE"), "y").unwrap();
        assert_eq!(g.tri_value(sym(&g, "B")), Tristate::Yes);
    }

    #[test]
    fn tristate_collapses_without_modules() {
        let mut g = parse("config T\n    tristate \"T\"\n");
        let t = sym(&g, "T");
        g.set_value(t, "m").unwrap();
        assert_eq!(g.tri_value(t), Tristate::Yes);
        assert_eq!(g.effective_type(t), SymbolType::Bool);
    }

    #[test]
    fn tristate_keeps_module_with_modules() {
        let mut g = parse(
            "config MODULES\n    bool \"m\"\n    default y\n    option modules\nconfig T\n    tristate \"T\"\n",
        );
        let t = sym(&g, "T");
        g.set_value(t, "m").unwrap();
        assert_eq!(g.tri_value(t), Tristate::Module);
    }

    // ── ranges ──

    #[test]
    fn range_clamps_default_and_rejects_user_value() {
        let mut g = parse(
            "config N\n    int \"n\"\n    range 10 20\n    default 5\nconfig H\n    hex \"h\"\n    range 0x10 0x20\n",
        );
        let n = sym(&g, "N");
        assert_eq!(g.str_value(n), "10");
        g.set_value(n, "15").unwrap();
        assert_eq!(g.str_value(n), "15");
        g.set_value(n, "99").unwrap();
        assert_eq!(g.str_value(n), "10");
        assert_eq!(g.str_value(sym(&g, "H")), "0x10");
    }

    // ── expressions ──

    #[test]
    fn comparisons_use_numbers_when_possible() {
        let g = parse(
            r#"
config SPEED
    int "speed"
    default 250
config FAST
    def_bool SPEED >= 100
config ARCH
    string "arch"
    default "stm32"
config IS_STM
    def_bool ARCH = "stm32"
"#,
        );
        assert_eq!(g.tri_value(sym(&g, "FAST")), Tristate::Yes);
        assert_eq!(g.tri_value(sym(&g, "IS_STM")), Tristate::Yes);
    }

    #[test]
    fn undefined_symbols_are_n_and_named() {
        let g = parse("config A\n    bool \"A\"\n    depends on GHOST\n");
        let ghost = sym(&g, "GHOST");
        assert_eq!(g.tri_value(ghost), Tristate::No);
        assert_eq!(g.str_value(ghost), "GHOST");
        assert_eq!(g.visibility(sym(&g, "A")), Tristate::No);
    }

    #[test]
    fn dependency_loop_falls_back_to_n() {
        let g = parse("config A\n    def_bool B\nconfig B\n    def_bool A\n");
        assert_eq!(g.tri_value(sym(&g, "A")), Tristate::No);
    }

    // ── choices ──

    const CHOICE: &str = r#"
choice
    prompt "Processor"
    default MACH_RP2040
config MACH_STM32
    bool "STM32"
config MACH_RP2040
    bool "RP2040"
config MACH_LPC
    bool "LPC"
    depends on NEVER
endchoice
"#;

    #[test]
    fn choice_uses_default_then_user_selection() {
        let mut g = parse(CHOICE);
        let c = ChoiceId(0);
        let rp = sym(&g, "MACH_RP2040");
        let stm = sym(&g, "MACH_STM32");
        assert_eq!(g.choice_mode(c), Tristate::Yes);
        assert_eq!(g.choice_selection(c), Some(rp));
        assert_eq!(g.tri_value(rp), Tristate::Yes);
        assert_eq!(g.tri_value(stm), Tristate::No);

        g.set_value(stm, "y").unwrap();
        assert_eq!(g.choice_selection(c), Some(stm));
        assert_eq!(g.tri_value(rp), Tristate::No);
    }

    #[test]
    fn invisible_member_cannot_be_selected() {
        let mut g = parse(CHOICE);
        let lpc = sym(&g, "MACH_LPC");
        g.set_value(lpc, "y").unwrap();
        assert_eq!(g.visibility(lpc), Tristate::No);
        assert_eq!(g.choice_selection(ChoiceId(0)), g.lookup_symbol("MACH_RP2040"));
    }

    #[test]
    fn optional_choice_starts_empty() {
        let g = parse(
            "choice\n    prompt \"p\"\n    optional\nconfig X\n    bool \"x\"\nendchoice\n",
        );
        assert_eq!(g.choice_mode(ChoiceId(0)), Tristate::No);
        assert_eq!(g.choice_selection(ChoiceId(0)), None);
    }

    // ── validation ──

    #[test]
    fn set_value_validates_by_type() {
        let mut g = parse(CANBUS);
        assert_matches!(
            g.set_value(sym(&g, "CANBUS_SPEED"), "fast"),
            Err(KconfigError::InvalidValue { kind: "int", .. })
        );
        assert_matches!(
            g.set_value(sym(&g, "CANBUS_INTERFACE"), "maybe"),
            Err(KconfigError::InvalidValue { kind: "bool", .. })
        );
        assert!(g.set_value(sym(&g, "BOARD_MCU"), "any \"text\"").is_ok());
    }

    #[test]
    fn set_value_rejects_undefined_symbol() {
        let mut g = parse("config A\n    bool \"A\"\n    depends on GHOST\n");
        assert_matches!(
            g.set_value(sym(&g, "GHOST"), "y"),
            Err(KconfigError::UnknownSymbol(name)) if name == "GHOST"
        );
    }

    #[test]
    fn unset_all_restores_defaults() {
        let mut g = parse(CANBUS);
        let mcu = sym(&g, "BOARD_MCU");
        g.set_value(mcu, "rp2040").unwrap();
        assert_eq!(g.str_value(mcu), "rp2040");
        g.unset_all();
        assert_eq!(g.str_value(mcu), "stm32");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn int_values_round_trip_when_visible(n in -1_000_000i64..1_000_000) {
                let mut g = parse("config N\n    int \"n\"\n");
                let id = g.lookup_symbol("N").unwrap();
                g.set_value(id, &n.to_string()).unwrap();
                prop_assert_eq!(g.str_value(id), n.to_string());
            }

            #[test]
            fn clamped_defaults_stay_in_range(low in 0i64..100, span in 0i64..100, d in -50i64..300) {
                let high = low + span;
                let text = format!("config N\n    int \"n\"\n    range {low} {high}\n    default {d}\n");
                let g = parse(&text);
                let value: i64 = g.str_value(g.lookup_symbol("N").unwrap()).parse().unwrap();
                prop_assert!((low..=high).contains(&value));
            }
        }
    }
}
