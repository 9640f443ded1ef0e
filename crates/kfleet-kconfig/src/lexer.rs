//! Line tokenizer for definition files.
//!
//! Definition files are line oriented: each logical line (after joining `\`
//! continuations) is tokenized independently. `#` starts a comment outside
//! of quoted strings.

use std::ops::Range;

use chumsky::prelude::*;

/// A token of one logical line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    /// Keyword, symbol name, or bare number.
    Word(String),
    /// Quoted string with escapes resolved.
    Str(String),
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{w}'"),
            Token::Str(s) => format!("\"{s}\""),
            Token::Not => "'!'".into(),
            Token::And => "'&&'".into(),
            Token::Or => "'||'".into(),
            Token::Eq => "'='".into(),
            Token::Ne => "'!='".into(),
            Token::Lt => "'<'".into(),
            Token::Le => "'<='".into(),
            Token::Gt => "'>'".into(),
            Token::Ge => "'>='".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '+' | '$')
}

/// Byte range of a token within its line.
pub(crate) type Span = Range<usize>;

fn quoted(quote: char) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    let escape = just('\\').ignore_then(any());
    just(quote)
        .ignore_then(
            filter(move |c: &char| *c != quote && *c != '\\')
                .or(escape)
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just(quote))
}

fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let string = quoted('"').or(quoted('\'')).map(Token::Str);

    let word = filter(|c: &char| is_word_char(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Token::Word);

    let op = choice::<_, Simple<char>>((
        just("!=").to(Token::Ne),
        just("!").to(Token::Not),
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just("=").to(Token::Eq),
        just("<=").to(Token::Le),
        just("<").to(Token::Lt),
        just(">=").to(Token::Ge),
        just(">").to(Token::Gt),
        just("(").to(Token::LParen),
        just(")").to(Token::RParen),
    ));

    let comment = just('#').then(any().repeated()).ignored();

    choice::<_, Simple<char>>((string, op, word))
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(text::whitespace().then(comment.or_not()))
        .then_ignore(end())
}

fn describe_error(err: &Simple<char>) -> String {
    match err.found() {
        Some(c) => format!("unexpected character '{c}' at column {}", err.span().start + 1),
        None => "unexpected end of line (unterminated string or operator)".to_string(),
    }
}

/// Tokenize one logical line. Spans are byte offsets into `line`.
pub(crate) fn tokenize_spanned(line: &str) -> Result<Vec<(Token, Span)>, String> {
    lexer().parse(line).map_err(|errs| {
        errs.first()
            .map_or_else(|| "invalid line".to_string(), describe_error)
    })
}

/// Column width of the leading whitespace, with tabs advancing to the next
/// multiple of eight.
pub(crate) fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => break,
        }
    }
    width
}
