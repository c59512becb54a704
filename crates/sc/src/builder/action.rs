//! The action vocabulary
//!
//! Each [`Action`] describes one construction step. Actions are plain data;
//! the [`StackBuilder`](super::StackBuilder) gives them meaning.

use llir::{BinaryOp, BlockId, FunctionId, ModuleId, Predicate, TypeId, ValueId};

use super::StackBuilder;

/// Where an action takes a value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Top of the operand stack
    Stack,
    /// An explicit value
    Value(ValueId),
    /// A variable bound by a named `alloc`
    Var(String),
    /// Parameter N of the active function
    Arg(u32),
}

impl From<ValueId> for Operand {
    fn from(value: ValueId) -> Self {
        Operand::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Var(name.to_string())
    }
}

/// Target of a branch or phi edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Named(String),
    Block(BlockId),
    /// The block created `n` positions after the current one
    Next(usize),
}

impl From<&str> for BlockRef {
    fn from(name: &str) -> Self {
        BlockRef::Named(name.to_string())
    }
}

impl From<BlockId> for BlockRef {
    fn from(block: BlockId) -> Self {
        BlockRef::Block(block)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Function(FunctionId),
    /// Looked up by name in the active module
    Named(String),
}

impl From<FunctionId> for Callee {
    fn from(function: FunctionId) -> Self {
        Callee::Function(function)
    }
}

impl From<&str> for Callee {
    fn from(name: &str) -> Self {
        Callee::Named(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Bitcast,
    /// No-op when the source already has the target type
    ZextOrTrunc,
    /// No-op when the source already has the target type
    FpToUi,
    PtrToInt,
    IntToPtr,
}

impl CastKind {
    pub const ALL: [CastKind; 5] = [
        CastKind::Bitcast,
        CastKind::ZextOrTrunc,
        CastKind::FpToUi,
        CastKind::PtrToInt,
        CastKind::IntToPtr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CastKind::Bitcast => "bitcast",
            CastKind::ZextOrTrunc => "zext_or_trunc",
            CastKind::FpToUi => "fptoui",
            CastKind::PtrToInt => "ptrtoint",
            CastKind::IntToPtr => "inttoptr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiEdge {
    pub value: Operand,
    pub block: BlockRef,
}

impl PhiEdge {
    pub fn new(value: impl Into<Operand>, block: impl Into<BlockRef>) -> Self {
        Self {
            value: value.into(),
            block: block.into(),
        }
    }
}

/// Signature of a function to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub ret: TypeId,
    pub params: Vec<TypeId>,
    pub vararg: bool,
}

/// Callback run mid-chain with read access to the builder
pub struct Inspector(Box<dyn FnMut(&StackBuilder<'_>)>);

impl Inspector {
    pub fn new(callback: impl FnMut(&StackBuilder<'_>) + 'static) -> Self {
        Self(Box::new(callback))
    }

    pub(crate) fn call(&mut self, builder: &StackBuilder<'_>) {
        (self.0)(builder);
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Inspector(..)")
    }
}

#[derive(Debug)]
pub enum Action {
    /// Stack slot; bound to `name` when given, pushed otherwise
    Alloc { ty: TypeId, name: Option<String> },
    Load { ty: TypeId, from: Operand },
    Store { value: Operand, dest: Operand },
    Binary {
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    Compare {
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    Cast {
        kind: CastKind,
        value: Operand,
        to: TypeId,
    },
    Phi(Vec<PhiEdge>),
    CondBr {
        cond: Operand,
        then_block: BlockRef,
        else_block: BlockRef,
    },
    Branch(BlockRef),
    Call { callee: Callee, args: Vec<Operand> },
    Ret(Option<Operand>),
    CreateBlock(String),
    SetBlock(String),
    CreateFunction(FunctionSpec),
    UseFunction(FunctionId),
    Module(ModuleId),
    Push(Operand),
    Pop(usize),
    KeepStack,
    Inspect(Inspector),
}

impl Action {
    pub fn alloc(ty: TypeId) -> Self {
        Action::Alloc { ty, name: None }
    }

    pub fn alloc_named(ty: TypeId, name: impl Into<String>) -> Self {
        Action::Alloc {
            ty,
            name: Some(name.into()),
        }
    }

    pub fn load(ty: TypeId, from: impl Into<Operand>) -> Self {
        Action::Load {
            ty,
            from: from.into(),
        }
    }

    /// Store with both operands from the stack: destination on top
    pub fn store() -> Self {
        Action::Store {
            value: Operand::Stack,
            dest: Operand::Stack,
        }
    }

    pub fn store_to(value: impl Into<Operand>, dest: impl Into<Operand>) -> Self {
        Action::Store {
            value: value.into(),
            dest: dest.into(),
        }
    }

    /// Binary operation on the two topmost stack values
    pub fn bin(op: BinaryOp) -> Self {
        Self::bin_with(op, Operand::Stack, Operand::Stack)
    }

    pub fn bin_with(op: BinaryOp, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Action::Binary {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn add() -> Self {
        Self::bin(BinaryOp::Add)
    }

    pub fn sub() -> Self {
        Self::bin(BinaryOp::Sub)
    }

    pub fn mul() -> Self {
        Self::bin(BinaryOp::Mul)
    }

    pub fn cmp(pred: Predicate) -> Self {
        Self::cmp_with(pred, Operand::Stack, Operand::Stack)
    }

    pub fn cmp_with(pred: Predicate, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Action::Compare {
            pred,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn cast(kind: CastKind, to: TypeId) -> Self {
        Action::Cast {
            kind,
            value: Operand::Stack,
            to,
        }
    }

    pub fn phi(edges: Vec<PhiEdge>) -> Self {
        Action::Phi(edges)
    }

    /// Conditional branch on the stack top
    pub fn condbr(then_block: impl Into<BlockRef>, else_block: impl Into<BlockRef>) -> Self {
        Action::CondBr {
            cond: Operand::Stack,
            then_block: then_block.into(),
            else_block: else_block.into(),
        }
    }

    /// Conditional branch to the next two blocks in creation order
    pub fn condbr_next() -> Self {
        Self::condbr(BlockRef::Next(1), BlockRef::Next(2))
    }

    pub fn branch(dest: impl Into<BlockRef>) -> Self {
        Action::Branch(dest.into())
    }

    /// Branch to the block created right after the current one
    pub fn branch_next() -> Self {
        Action::Branch(BlockRef::Next(1))
    }

    pub fn call(callee: impl Into<Callee>, args: Vec<Operand>) -> Self {
        Action::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn ret(value: impl Into<Operand>) -> Self {
        Action::Ret(Some(value.into()))
    }

    pub fn ret_void() -> Self {
        Action::Ret(None)
    }

    pub fn create_block(name: impl Into<String>) -> Self {
        Action::CreateBlock(name.into())
    }

    pub fn set_block(name: impl Into<String>) -> Self {
        Action::SetBlock(name.into())
    }

    pub fn create_function(
        name: impl Into<String>,
        ret: TypeId,
        params: Vec<TypeId>,
        vararg: bool,
    ) -> Self {
        Action::CreateFunction(FunctionSpec {
            name: name.into(),
            ret,
            params,
            vararg,
        })
    }

    pub fn push(value: impl Into<Operand>) -> Self {
        Action::Push(value.into())
    }

    pub fn inspect(callback: impl FnMut(&StackBuilder<'_>) + 'static) -> Self {
        Action::Inspect(Inspector::new(callback))
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::Alloc { .. } => "alloc",
            Action::Load { .. } => "load",
            Action::Store { .. } => "store",
            Action::Binary { op, .. } => op.mnemonic(),
            Action::Compare { .. } => "cmp",
            Action::Cast { kind, .. } => kind.name(),
            Action::Phi(_) => "phi",
            Action::CondBr { .. } => "condbr",
            Action::Branch(_) => "branch",
            Action::Call { .. } => "call",
            Action::Ret(_) => "ret",
            Action::CreateBlock(_) => "create_block",
            Action::SetBlock(_) => "set_block",
            Action::CreateFunction(_) => "create_function",
            Action::UseFunction(_) => "function",
            Action::Module(_) => "module",
            Action::Push(_) => "push",
            Action::Pop(_) => "pop",
            Action::KeepStack => "keep_stack",
            Action::Inspect(_) => "inspect",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elided_constructors() {
        match Action::bin(BinaryOp::Sub) {
            Action::Binary { op, lhs, rhs } => {
                assert_eq!(op, BinaryOp::Sub);
                assert_eq!(lhs, Operand::Stack);
                assert_eq!(rhs, Operand::Stack);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            Action::condbr_next(),
            Action::CondBr {
                then_block: BlockRef::Next(1),
                else_block: BlockRef::Next(2),
                ..
            }
        ));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Operand::from("x"), Operand::Var("x".into()));
        assert_eq!(BlockRef::from("then"), BlockRef::Named("then".into()));
        assert_eq!(Callee::from("printf"), Callee::Named("printf".into()));
        assert_eq!(CastKind::from_name("zext_or_trunc"), Some(CastKind::ZextOrTrunc));
        assert_eq!(Action::ret_void().name(), "ret");
        assert_eq!(format!("{:?}", Action::inspect(|_| {})), "Inspect(Inspector(..))");
    }
}
