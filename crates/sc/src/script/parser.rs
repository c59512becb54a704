//! Recursive descent parser for action scripts
//!
//! One statement per line. Operands that may be elided parse as
//! [`OperandExpr::Stack`] when absent.

use llir::{BinaryOp, Predicate};

use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::builder::CastKind;
use crate::common::{CompileError, CompileResult, Span};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// End offset of the last consumed token
    last_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            last_end: 0,
        }
    }

    pub fn parse_script(&mut self) -> CompileResult<Script> {
        let mut statements = Vec::new();
        loop {
            while self.match_token(&TokenKind::Newline)? {}
            if self.check(&TokenKind::Eof)? {
                break;
            }
            statements.push(self.parse_statement()?);
            self.end_of_statement()?;
        }
        Ok(Script { statements })
    }

    fn end_of_statement(&mut self) -> CompileResult<()> {
        if self.check(&TokenKind::Eof)? {
            return Ok(());
        }
        let token = self.next()?;
        match token.kind {
            TokenKind::Newline => Ok(()),
            other => Err(CompileError::parser(
                format!("expected end of line, found {}", other),
                token.span,
            )),
        }
    }

    // ==================== Statements ====================

    pub fn parse_statement(&mut self) -> CompileResult<Statement> {
        let token = self.next()?;
        let start = token.span.start;
        let mnemonic = match token.kind {
            TokenKind::Ident(name) => name,
            other => {
                return Err(CompileError::parser(
                    format!("expected statement, found {}", other),
                    token.span,
                ));
            }
        };

        let kind = match mnemonic.as_str() {
            "module" => StmtKind::Module(self.expect_ident()?),
            "function" => self.parse_function()?,
            "use" => StmtKind::Use(self.expect_global()?),
            "block" => StmtKind::Block(self.expect_ident()?),
            "set_block" => StmtKind::SetBlock(self.expect_ident()?),
            "alloc" => {
                let ty = self.parse_type()?;
                let name = if self.check(&TokenKind::Var(String::new()))? {
                    Some(self.expect_var()?)
                } else {
                    None
                };
                StmtKind::Alloc { ty, name }
            }
            "load" => {
                let ty = self.parse_type()?;
                let from = self.optional_operand()?;
                StmtKind::Load { ty, from }
            }
            "store" => {
                let (value, dest) = self.operand_pair()?;
                StmtKind::Store { value, dest }
            }
            "cmp" => {
                let pred = self.parse_predicate()?;
                let (lhs, rhs) = self.operand_pair()?;
                StmtKind::Compare { pred, lhs, rhs }
            }
            "phi" => self.parse_phi()?,
            "condbr" => self.parse_condbr()?,
            "br" => {
                let dest = if self.at_target()? {
                    self.parse_target()?
                } else {
                    BlockTarget::Next(1)
                };
                StmtKind::Br(dest)
            }
            "call" => {
                let callee = self.expect_global()?;
                self.expect(TokenKind::LParen)?;
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen)? {
                    loop {
                        args.push(self.parse_operand()?);
                        if !self.match_token(&TokenKind::Comma)? {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                StmtKind::Call { callee, args }
            }
            "ret" => {
                let value = if self.at_operand()? {
                    Some(self.parse_operand()?)
                } else {
                    None
                };
                StmtKind::Ret(value)
            }
            "push" => StmtKind::Push(self.parse_operand()?),
            "pop" => {
                let count = if self.check(&TokenKind::Number(0))? {
                    self.expect_number()?
                } else {
                    1
                };
                StmtKind::Pop(count)
            }
            "keep_stack" => StmtKind::KeepStack,
            "inspect" => StmtKind::Inspect,
            "last" => StmtKind::Last,
            other => {
                if let Some(op) = BinaryOp::from_mnemonic(other) {
                    let (lhs, rhs) = self.operand_pair()?;
                    StmtKind::Binary { op, lhs, rhs }
                } else if let Some(kind) = CastKind::from_name(other) {
                    let value = self.optional_operand()?;
                    self.expect_keyword("to")?;
                    let to = self.parse_type()?;
                    StmtKind::Cast { kind, value, to }
                } else {
                    return Err(CompileError::parser(
                        format!("unknown statement '{}'", other),
                        token.span,
                    ));
                }
            }
        };

        Ok(Statement {
            kind,
            span: Span::new(start, self.last_end),
        })
    }

    /// `function @name(params) [-> ret]`
    fn parse_function(&mut self) -> CompileResult<StmtKind> {
        let name = self.expect_global()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut vararg = false;
        if !self.check(&TokenKind::RParen)? {
            loop {
                if self.match_token(&TokenKind::Ellipsis)? {
                    vararg = true;
                    break;
                }
                params.push(self.parse_type()?);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RParen)?;
        let ret = if self.match_token(&TokenKind::Arrow)? {
            self.parse_type()?
        } else {
            TypeExpr {
                base: "void".to_string(),
                pointers: 0,
                span: close.span,
            }
        };
        Ok(StmtKind::Function {
            name,
            ret,
            params,
            vararg,
        })
    }

    /// `phi [v, bb], [v, bb]`
    fn parse_phi(&mut self) -> CompileResult<StmtKind> {
        let mut edges = Vec::new();
        loop {
            self.expect(TokenKind::LBracket)?;
            let value = self.parse_operand()?;
            self.expect(TokenKind::Comma)?;
            let block = self.parse_target()?;
            self.expect(TokenKind::RBracket)?;
            edges.push((value, block));
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(StmtKind::Phi(edges))
    }

    /// `condbr [cond] [, then, else]`; targets default to the next two
    /// blocks
    fn parse_condbr(&mut self) -> CompileResult<StmtKind> {
        let explicit = self.at_operand()?;
        let cond = self.optional_operand()?;
        let targets = if explicit {
            self.match_token(&TokenKind::Comma)?
        } else {
            self.at_target()?
        };
        let (then_block, else_block) = if targets {
            let then_block = self.parse_target()?;
            self.expect(TokenKind::Comma)?;
            (then_block, self.parse_target()?)
        } else {
            (BlockTarget::Next(1), BlockTarget::Next(2))
        };
        Ok(StmtKind::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    // ==================== Operands and types ====================

    fn at_operand(&mut self) -> CompileResult<bool> {
        Ok(matches!(
            self.lexer.peek()?.kind,
            TokenKind::Underscore
                | TokenKind::Var(_)
                | TokenKind::Arg(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
        ))
    }

    fn optional_operand(&mut self) -> CompileResult<OperandExpr> {
        if self.at_operand()? {
            self.parse_operand()
        } else {
            Ok(OperandExpr::Stack)
        }
    }

    /// Two comma separated operands, or nothing for two stack operands
    fn operand_pair(&mut self) -> CompileResult<(OperandExpr, OperandExpr)> {
        if !self.at_operand()? {
            return Ok((OperandExpr::Stack, OperandExpr::Stack));
        }
        let lhs = self.parse_operand()?;
        self.expect(TokenKind::Comma)?;
        let rhs = self.parse_operand()?;
        Ok((lhs, rhs))
    }

    fn parse_operand(&mut self) -> CompileResult<OperandExpr> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Underscore => Ok(OperandExpr::Stack),
            TokenKind::Var(name) => Ok(OperandExpr::Var(name, token.span)),
            TokenKind::Arg(index) => Ok(OperandExpr::Arg(index)),
            TokenKind::IntLiteral(text) => {
                let (value, bits) = split_literal(&text, "_i", token.span)?;
                let value = value.parse::<i128>().map_err(|_| {
                    CompileError::parser(format!("integer out of range: {}", text), token.span)
                })?;
                if bits == 0 || bits > 128 {
                    return Err(CompileError::parser(
                        format!("unsupported integer width {}", bits),
                        token.span,
                    ));
                }
                Ok(OperandExpr::Int { value, bits })
            }
            TokenKind::FloatLiteral(text) => {
                let (value, bits) = split_literal(&text, "_f", token.span)?;
                let value = value.parse::<f64>().map_err(|_| {
                    CompileError::parser(format!("invalid float: {}", text), token.span)
                })?;
                if !matches!(bits, 16 | 32 | 64) {
                    return Err(CompileError::parser(
                        format!("unsupported float width {}", bits),
                        token.span,
                    ));
                }
                Ok(OperandExpr::Float { value, bits })
            }
            other => Err(CompileError::parser(
                format!("expected operand, found {}", other),
                token.span,
            )),
        }
    }

    /// Base type name followed by any number of `*`
    fn parse_type(&mut self) -> CompileResult<TypeExpr> {
        let token = self.next()?;
        let base = match token.kind {
            TokenKind::Ident(base) => base,
            other => {
                return Err(CompileError::parser(
                    format!("expected type, found {}", other),
                    token.span,
                ));
            }
        };
        let mut pointers = 0;
        while self.match_token(&TokenKind::Star)? {
            pointers += 1;
        }
        Ok(TypeExpr {
            base,
            pointers,
            span: Span::new(token.span.start, self.last_end),
        })
    }

    fn parse_predicate(&mut self) -> CompileResult<Predicate> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Ident(name) => Predicate::from_name(name).ok_or_else(|| {
                CompileError::parser(format!("unknown predicate '{}'", name), token.span)
            }),
            other => Err(CompileError::parser(
                format!("expected predicate, found {}", other),
                token.span,
            )),
        }
    }

    fn at_target(&mut self) -> CompileResult<bool> {
        Ok(matches!(
            self.lexer.peek()?.kind,
            TokenKind::Ident(_) | TokenKind::Plus
        ))
    }

    /// Block name or `+N`
    fn parse_target(&mut self) -> CompileResult<BlockTarget> {
        if self.match_token(&TokenKind::Plus)? {
            return Ok(BlockTarget::Next(self.expect_number()?));
        }
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(name) => Ok(BlockTarget::Named(name, token.span)),
            other => Err(CompileError::parser(
                format!("expected block, found {}", other),
                token.span,
            )),
        }
    }

    // ==================== Helpers ====================

    fn next(&mut self) -> CompileResult<Token> {
        let token = self.lexer.next_token()?;
        if !matches!(token.kind, TokenKind::Eof) {
            self.last_end = token.span.end;
        }
        Ok(token)
    }

    fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        self.lexer.check(expected)
    }

    fn match_token(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        let token = self.lexer.expect(expected)?;
        self.last_end = token.span.end;
        Ok(token)
    }

    fn expect_ident(&mut self) -> CompileResult<String> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            other => Err(CompileError::parser(
                format!("expected name, found {}", other),
                token.span,
            )),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> CompileResult<()> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Ident(name) if name == keyword => Ok(()),
            other => Err(CompileError::parser(
                format!("expected '{}', found {}", keyword, other),
                token.span,
            )),
        }
    }

    fn expect_global(&mut self) -> CompileResult<String> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Global(name) => Ok(name),
            other => Err(CompileError::parser(
                format!("expected function name, found {}", other),
                token.span,
            )),
        }
    }

    fn expect_var(&mut self) -> CompileResult<String> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Var(name) => Ok(name),
            other => Err(CompileError::parser(
                format!("expected variable, found {}", other),
                token.span,
            )),
        }
    }

    fn expect_number(&mut self) -> CompileResult<usize> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(n) => Ok(n),
            other => Err(CompileError::parser(
                format!("expected number, found {}", other),
                token.span,
            )),
        }
    }
}

/// `"10_i8"` with marker `"_i"` into `("10", 8)`
fn split_literal<'t>(text: &'t str, marker: &str, span: Span) -> CompileResult<(&'t str, u32)> {
    let invalid = || CompileError::parser(format!("invalid literal: {}", text), span);
    let at = text.rfind(marker).ok_or_else(invalid)?;
    let bits = text[at + marker.len()..].parse::<u32>().map_err(|_| invalid())?;
    Ok((&text[..at], bits))
}
