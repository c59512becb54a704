//! Script token definitions using logos

use std::fmt;

use logos::Logos;

use crate::common::Span;

/// A script token with its kind and source location
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Script token kinds. Statement mnemonics, types and block names all lex
/// as [`TokenKind::Ident`]; the parser tells them apart.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r";[^\n]*")]
pub enum TokenKind {
    #[token("\n")]
    Newline,

    #[token("_")]
    Underscore,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("->")]
    Arrow,
    #[token("...")]
    Ellipsis,

    /// `%name`, a variable bound by `alloc`
    #[regex(r"%[A-Za-z0-9_.]+", |lex| lex.slice()[1..].to_string())]
    Var(String),

    /// `@name`, a function
    #[regex(r"@[A-Za-z0-9_.]+", |lex| lex.slice()[1..].to_string())]
    Global(String),

    /// `$N`, parameter N of the active function
    #[regex(r"\$[0-9]+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    Arg(u32),

    /// Typed integer such as `10_i8` or `-1_i32`
    #[regex(r"-?[0-9]+_i[0-9]+", |lex| lex.slice().to_string())]
    IntLiteral(String),

    /// Typed float such as `1.5_f64`
    #[regex(r"-?[0-9]+\.[0-9]+_f[0-9]+", |lex| lex.slice().to_string())]
    FloatLiteral(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),

    #[regex(r"[A-Za-z][A-Za-z0-9_.]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// End of input (synthesized by the lexer)
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Underscore => write!(f, "_"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Ellipsis => write!(f, "..."),
            TokenKind::Var(name) => write!(f, "%{}", name),
            TokenKind::Global(name) => write!(f, "@{}", name),
            TokenKind::Arg(index) => write!(f, "${}", index),
            TokenKind::IntLiteral(s) | TokenKind::FloatLiteral(s) => write!(f, "{}", s),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Ident(name) => write!(f, "{}", name),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
