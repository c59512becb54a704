//! sc - stack-oriented instruction building over llir
//!
//! This library builds IR from chains of small actions that pass values
//! through an implicit operand stack, and adds the helpers needed to work
//! with the result.
//!
//! ## Architecture
//!
//! - **Builder** (`builder/`): [`Action`]s and the [`StackBuilder`] that
//!   interprets them
//! - **Script** (`script/`): a line-per-action text form, lexed, parsed and
//!   lowered to actions
//! - **Driver** (`driver/`): runs a script end to end
//! - **Metadata** (`meta`, `annotation`): string metadata and dotted
//!   annotations on functions, instructions and arguments
//! - **Traversal** (`views`, `transformer`): lazy walks over modules,
//!   functions and blocks, value classes and chained navigation
//! - **Helpers** (`types`, `constant`, `fmt`, `bimap`): type and constant
//!   factories, name formatting and string splitting
//! - **Common** (`common/`): errors, spans and diagnostics

pub mod annotation;
pub mod bimap;
pub mod builder;
pub mod common;
pub mod constant;
pub mod driver;
pub mod fmt;
pub mod meta;
pub mod script;
pub mod transformer;
pub mod types;
pub mod views;

// Re-exports for convenience
pub use annotation::Annotation;
pub use bimap::BiMap;
pub use builder::{Action, BlockRef, BuildError, BuildResult, Callee, CastKind, Operand, PhiEdge, StackBuilder};
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use driver::{Pipeline, ScriptConfig, ScriptOutput, run_script};
pub use transformer::Transformer;
pub use views::{Class, Scope};
