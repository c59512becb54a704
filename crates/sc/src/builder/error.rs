use llir::IrError;
use thiserror::Error;

/// A malformed action chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("stack underflow: needed {needed} values, {available} available")]
    StackUnderflow { needed: usize, available: usize },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown block '{0}'")]
    UnknownBlock(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("block name '{0}' is already bound")]
    DuplicateBlock(String),

    #[error("'{function}' takes {expected} arguments, {found} given")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("return does not match '{function}' returning {expected}")]
    ReturnMismatch { function: String, expected: String },

    #[error("function has no argument {0}")]
    NoArgument(u32),

    #[error("no active module")]
    NoModule,

    #[error("no active function")]
    NoFunction,

    #[error("no current block")]
    NoCurrentBlock,

    #[error("no block {0} positions after the current one")]
    NoFollowingBlock(usize),

    #[error(transparent)]
    Ir(#[from] IrError),
}

pub type BuildResult<T> = Result<T, BuildError>;
