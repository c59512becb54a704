//! Script lexer built on logos

use logos::Logos;

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    peeked: Option<Token>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
            at_eof: false,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    fn scan_token(&mut self) -> CompileResult<Token> {
        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, Span::new(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => Ok(Token::new(kind, self.inner.span().into())),
            Some(Err(())) => Err(CompileError::lexer(
                format!("unexpected input '{}'", self.inner.slice()),
                self.inner.span().into(),
            )),
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, Span::new(len, len)))
            }
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> CompileResult<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Check if the next token has the same kind as `expected`, ignoring
    /// payloads
    pub fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(expected))
    }

    /// Consume the next token if it matches, return true if consumed
    pub fn match_token(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expect a specific token kind, error if not found
    pub fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) {
            Ok(token)
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", expected, token.kind),
                token.span,
            ))
        }
    }

    /// Tokenize the entire source, `Eof` included
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    pub fn source(&self) -> &'a str {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_statement_tokens() {
        assert_eq!(
            kinds("store $0, %a ; spill\n"),
            vec![
                TokenKind::Ident("store".into()),
                TokenKind::Arg(0),
                TokenKind::Comma,
                TokenKind::Var("a".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("10_i8 -1_i32 1.5_f64 2 _"),
            vec![
                TokenKind::IntLiteral("10_i8".into()),
                TokenKind::IntLiteral("-1_i32".into()),
                TokenKind::FloatLiteral("1.5_f64".into()),
                TokenKind::Number(2),
                TokenKind::Underscore,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_signature_tokens() {
        let tokens = kinds("function @printf(i8*, ...) -> i32");
        assert_eq!(tokens[1], TokenKind::Global("printf".into()));
        assert_eq!(tokens[4], TokenKind::Star);
        assert_eq!(tokens[6], TokenKind::Ellipsis);
        assert_eq!(tokens[8], TokenKind::Arrow);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("load i8 #").tokenize_all().unwrap_err();
        assert_eq!(err.span(), Some(Span::new(8, 9)));
    }

    #[test]
    fn test_peek_then_next() {
        let mut lexer = Lexer::new("push _");
        assert!(lexer.check(&TokenKind::Ident(String::new())).unwrap());
        assert!(!lexer.match_token(&TokenKind::Comma).unwrap());
        let token = lexer.next_token().unwrap();
        assert_eq!(token.span, Span::new(0, 4));
        assert!(lexer.expect(TokenKind::Underscore).is_ok());
        assert!(matches!(lexer.next_token().unwrap().kind, TokenKind::Eof));
    }
}
