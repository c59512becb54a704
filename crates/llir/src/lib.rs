//! llir - a small typed IR in the style of LLVM
//!
//! The [`Context`] arena owns types, constants, instructions, blocks,
//! functions, modules and metadata. [`IrBuilder`] emits instructions into
//! a block with type checking and integer constant folding, and
//! [`printer`] renders the result as text.

pub mod builder;
pub mod context;
pub mod error;
pub mod inst;
pub mod metadata;
pub mod module;
pub mod printer;
pub mod types;
pub mod value;

pub use builder::IrBuilder;
pub use context::Context;
pub use error::{IrError, IrResult};
pub use inst::{BinaryOp, CastOp, InstKind, Instruction, Predicate};
pub use metadata::{MdNode, MdOperand, MetadataId};
pub use module::{BasicBlock, BlockId, Function, FunctionId, Linkage, Module, ModuleId};
pub use printer::{print_function, print_instruction, print_module, print_operand};
pub use types::{DataLayout, FloatKind, TypeId, TypeKind, TypeTable};
pub use value::{ConstantKind, ValueClass, ValueData, ValueId, ValueKind};
