//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use super::Span;
use crate::builder::BuildError;

/// Script error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Lowering error at {span:?}: {message}")]
    Lowering { message: String, span: Span },

    #[error("Build error at {span:?}: {source}")]
    Build { source: BuildError, span: Span },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn lowering(message: impl Into<String>, span: Span) -> Self {
        Self::Lowering {
            message: message.into(),
            span,
        }
    }

    pub fn build(source: BuildError, span: Span) -> Self {
        Self::Build { source, span }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. }
            | Self::Parser { span, .. }
            | Self::Lowering { span, .. }
            | Self::Build { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn diagnostic(file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        let labelled = |title: &str, message: String, span: &Span| {
            Diagnostic::error()
                .with_message(title)
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message),
                ])
        };
        match error {
            CompileError::Lexer { message, span } => labelled("Lexer error", message.clone(), span),
            CompileError::Parser { message, span } => {
                labelled("Syntax error", message.clone(), span)
            }
            CompileError::Lowering { message, span } => {
                labelled("Invalid action", message.clone(), span)
            }
            CompileError::Build { source, span } => {
                labelled("Build error", source.to_string(), span)
            }
            CompileError::Io(err) => Diagnostic::error().with_message(format!("IO error: {}", err)),
        }
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = Self::diagnostic(file_id, error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_labels_span() {
        let err = CompileError::parser("expected type", Span::new(3, 7));
        let diag = DiagnosticReporter::diagnostic(0, &err);
        assert_eq!(diag.message, "Syntax error");
        assert_eq!(diag.labels[0].range, 3..7);
        assert_eq!(err.span(), Some(Span::new(3, 7)));
    }

    #[test]
    fn test_build_error_message() {
        let err = CompileError::build(BuildError::UnknownVariable("x".into()), Span::new(0, 4));
        assert!(err.to_string().contains("unknown variable 'x'"));
    }
}
