//! Error reporting and source locations shared by the script pipeline

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::Span;
