//! Modules, functions and basic blocks

use crate::types::TypeId;
use crate::value::ValueId;

/// Handle to a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u32);

/// Handle to a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) u32);

/// Handle to a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

impl BlockId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FunctionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbol visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
    #[default]
    External,
    Internal,
    Private,
}

impl Linkage {
    /// Keyword printed before `define`/`declare`, empty for external
    pub fn keyword(self) -> &'static str {
        match self {
            Linkage::External => "",
            Linkage::Internal => "internal ",
            Linkage::Private => "private ",
        }
    }
}

/// Ordered list of instructions
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub name: Option<String>,
    /// `None` while the block is detached
    pub parent: Option<FunctionId>,
    pub insts: Vec<ValueId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// The function type (not the pointer to it)
    pub ty: TypeId,
    /// Signature parts of `ty`
    pub ret: TypeId,
    pub params: Vec<TypeId>,
    pub vararg: bool,
    pub linkage: Linkage,
    pub module: ModuleId,
    /// The function as a value; typed as a pointer to `ty`
    pub value: ValueId,
    pub args: Vec<ValueId>,
    pub blocks: Vec<BlockId>,
}

impl Function {
    /// A function without blocks is a declaration
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub functions: Vec<FunctionId>,
}
