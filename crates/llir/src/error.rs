//! Errors raised while constructing IR

use thiserror::Error;

/// A violation of the IR's structural or typing rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("invalid operand for {opcode}: {message}")]
    InvalidOperand { opcode: &'static str, message: String },

    #[error("cannot {op} from {from} to {to}")]
    InvalidCast {
        op: &'static str,
        from: String,
        to: String,
    },

    #[error("phi node needs at least one incoming edge")]
    EmptyPhi,

    #[error("builder has no insertion point")]
    NoInsertPoint,

    #[error("block '{block}' already ends in a terminator")]
    BlockTerminated { block: String },

    #[error("block '{block}' is not attached to a function")]
    DetachedBlock { block: String },

    #[error("block '{block}' already belongs to a function")]
    BlockAttached { block: String },

    #[error("call to '{function}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("return does not match '{function}' returning {expected}")]
    ReturnMismatch { function: String, expected: String },

    #[error("type {0} is not a function type")]
    NotAFunction(String),

    #[error("function '{0}' is already defined in this module")]
    DuplicateFunction(String),

    #[error("metadata can only be attached to instructions and functions")]
    MetadataTarget,

    #[error("metadata operand index {index} out of range for node with {len} operands")]
    MetadataIndex { index: usize, len: usize },
}

impl IrError {
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn operand(opcode: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            opcode,
            message: message.into(),
        }
    }
}

pub type IrResult<T> = Result<T, IrError>;
