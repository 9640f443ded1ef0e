//! Dependency expression grammar over line tokens.
//!
//! Precedence, loosest first: `||`, `&&`, `!`, comparison. Operands are
//! words or quoted strings; `n`/`m`/`y` and numbers are constants, any other
//! word names a symbol. Symbol names are interned by the caller.

use chumsky::prelude::*;
use chumsky::Stream;

use crate::expr::{is_number, CmpOp};
use crate::lexer::{Span, Token};

/// Parsed expression with symbols still as names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RawExpr {
    Const(String),
    Sym(String),
    Not(Box<RawExpr>),
    And(Box<RawExpr>, Box<RawExpr>),
    Or(Box<RawExpr>, Box<RawExpr>),
    Cmp(CmpOp, Box<RawExpr>, Box<RawExpr>),
}

fn is_constant(word: &str) -> bool {
    matches!(word, "n" | "m" | "y") || is_number(word)
}

fn expression() -> impl Parser<Token, RawExpr, Error = Simple<Token>> {
    let operand = select! {
        Token::Str(s) => RawExpr::Const(s),
        Token::Word(w) => if is_constant(&w) { RawExpr::Const(w) } else { RawExpr::Sym(w) },
    };
    let cmp_op = select! {
        Token::Eq => CmpOp::Eq,
        Token::Ne => CmpOp::Ne,
        Token::Lt => CmpOp::Lt,
        Token::Le => CmpOp::Le,
        Token::Gt => CmpOp::Gt,
        Token::Ge => CmpOp::Ge,
    };

    recursive(|expr| {
        let comparison = operand
            .clone()
            .then(cmp_op.then(operand).or_not())
            .map(|(lhs, rhs)| match rhs {
                Some((op, rhs)) => RawExpr::Cmp(op, Box::new(lhs), Box::new(rhs)),
                None => lhs,
            });
        let atom = expr
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .or(comparison);
        let unary = just(Token::Not)
            .repeated()
            .then(atom)
            .foldr(|_, e| RawExpr::Not(Box::new(e)));
        let and = unary
            .clone()
            .then(just(Token::And).ignore_then(unary).repeated())
            .foldl(|l, r| RawExpr::And(Box::new(l), Box::new(r)));
        and.clone()
            .then(just(Token::Or).ignore_then(and).repeated())
            .foldl(|l, r| RawExpr::Or(Box::new(l), Box::new(r)))
    })
    .then_ignore(end())
}

fn describe_error(err: &Simple<Token>) -> String {
    match err.found() {
        Some(tok) => format!(
            "unexpected {} in expression at column {}",
            tok.describe(),
            err.span().start + 1
        ),
        None => "unexpected end of expression".to_string(),
    }
}

/// Parse a complete expression. `eol` is the line length, used as the span
/// of the end of input.
pub(crate) fn parse_expression(
    tokens: Vec<(Token, Span)>,
    eol: usize,
) -> Result<RawExpr, String> {
    let stream = Stream::from_iter(eol..eol + 1, tokens.into_iter());
    expression().parse(stream).map_err(|errs| {
        errs.first()
            .map_or_else(|| "invalid expression".to_string(), describe_error)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
