//! Stack-oriented instruction building
//!
//! A chain of [`Action`]s is applied to a [`StackBuilder`], which threads
//! an operand stack, named variables and a name-to-block registry through
//! the chain while emitting instructions with [`llir::IrBuilder`].
//!
//! Operands left as [`Operand::Stack`] resolve right to left: the last
//! operand of an action takes the top of the stack. For `sub` with both
//! operands elided, the most recently pushed value is the right operand.

mod action;
mod error;
mod stack;

pub use action::{Action, BlockRef, Callee, CastKind, FunctionSpec, Inspector, Operand, PhiEdge};
pub use error::{BuildError, BuildResult};
pub use stack::StackBuilder;
