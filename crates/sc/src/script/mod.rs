//! Text form of action chains
//!
//! A script holds one action per line:
//!
//! ```text
//! module demo
//! function @sum(i8, i8) -> i8
//! block entry
//! push $0
//! push $1
//! add
//! ret _
//! ```
//!
//! Lexing uses logos, parsing is recursive descent, and lowering turns
//! each statement into an [`Action`](crate::builder::Action) against the
//! live builder.

pub mod ast;
mod lexer;
mod lower;
mod parser;
mod token;

pub use lexer::Lexer;
pub use lower::{Lowerer, Step};
pub use parser::Parser;
pub use token::{Token, TokenKind};
