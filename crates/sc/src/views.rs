//! Lazy traversals over IR and value classification

use llir::{BlockId, Context, FunctionId, InstKind, ModuleId, TypeId, ValueClass, ValueId};

/// What to traverse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Module(ModuleId),
    Function(FunctionId),
    Block(BlockId),
}

impl From<ModuleId> for Scope {
    fn from(module: ModuleId) -> Self {
        Scope::Module(module)
    }
}

impl From<FunctionId> for Scope {
    fn from(function: FunctionId) -> Self {
        Scope::Function(function)
    }
}

impl From<BlockId> for Scope {
    fn from(block: BlockId) -> Self {
        Scope::Block(block)
    }
}

/// A kind of value, coarse (constant, instruction) or by instruction
/// opcode family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Constant,
    Argument,
    Function,
    Instruction,
    Alloca,
    Load,
    Store,
    Binary,
    Compare,
    Cast,
    Phi,
    Branch,
    Call,
    Ret,
    Terminator,
}

impl Class {
    pub fn matches(self, ctx: &Context, value: ValueId) -> bool {
        let data = ctx.value(value);
        let coarse = match self {
            Class::Constant => Some(ValueClass::Constant),
            Class::Argument => Some(ValueClass::Argument),
            Class::Function => Some(ValueClass::Function),
            Class::Instruction => Some(ValueClass::Instruction),
            _ => None,
        };
        if let Some(class) = coarse {
            return data.class() == class;
        }
        let Some(inst) = data.as_instruction() else {
            return false;
        };
        match self {
            Class::Alloca => matches!(inst.kind, InstKind::Alloca { .. }),
            Class::Load => matches!(inst.kind, InstKind::Load { .. }),
            Class::Store => matches!(inst.kind, InstKind::Store { .. }),
            Class::Binary => matches!(inst.kind, InstKind::Binary { .. }),
            Class::Compare => matches!(inst.kind, InstKind::ICmp { .. } | InstKind::FCmp { .. }),
            Class::Cast => matches!(inst.kind, InstKind::Cast { .. }),
            Class::Phi => matches!(inst.kind, InstKind::Phi { .. }),
            Class::Branch => matches!(inst.kind, InstKind::Br { .. } | InstKind::CondBr { .. }),
            Class::Call => matches!(inst.kind, InstKind::Call { .. }),
            Class::Ret => matches!(inst.kind, InstKind::Ret { .. }),
            Class::Terminator => inst.is_terminator(),
            Class::Constant | Class::Argument | Class::Function | Class::Instruction => false,
        }
    }
}

pub fn is(ctx: &Context, value: ValueId, class: Class) -> bool {
    class.matches(ctx, value)
}

pub fn isnot(ctx: &Context, value: ValueId, class: Class) -> bool {
    !class.matches(ctx, value)
}

/// `Some(value)` when it belongs to `class`
pub fn dyncast(ctx: &Context, value: ValueId, class: Class) -> Option<ValueId> {
    class.matches(ctx, value).then_some(value)
}

/// Blocks of a function in layout order
pub fn basic_blocks(ctx: &Context, function: FunctionId) -> impl Iterator<Item = BlockId> + '_ {
    ctx.function_blocks(function).iter().copied()
}

fn blocks_in(ctx: &Context, scope: Scope) -> Vec<BlockId> {
    match scope {
        Scope::Module(module) => ctx
            .module_functions(module)
            .iter()
            .flat_map(|f| basic_blocks(ctx, *f))
            .collect(),
        Scope::Function(function) => basic_blocks(ctx, function).collect(),
        Scope::Block(block) => vec![block],
    }
}

/// Every instruction in `scope`, block by block
pub fn instructions(ctx: &Context, scope: impl Into<Scope>) -> impl Iterator<Item = ValueId> + '_ {
    blocks_in(ctx, scope.into())
        .into_iter()
        .flat_map(move |block| ctx.block_instructions(block).iter().copied())
}

/// Instructions in `scope` belonging to `class`
pub fn filter(
    ctx: &Context,
    scope: impl Into<Scope>,
    class: Class,
) -> impl Iterator<Item = ValueId> + '_ {
    instructions(ctx, scope).filter(move |v| class.matches(ctx, *v))
}

/// Types of a sequence of values
pub fn types<'a>(
    ctx: &'a Context,
    values: impl IntoIterator<Item = ValueId> + 'a,
) -> impl Iterator<Item = TypeId> + 'a {
    values.into_iter().map(|v| ctx.type_of(v))
}
