//! The stack builder state machine

use std::collections::HashMap;

use llir::{BlockId, Context, FunctionId, IrBuilder, Linkage, ModuleId, ValueId};

use super::action::{Action, BlockRef, Callee, CastKind, FunctionSpec, Operand, PhiEdge};
use super::error::{BuildError, BuildResult};
use crate::bimap::BiMap;

/// Interprets [`Action`]s against an operand stack and emits IR
pub struct StackBuilder<'ctx> {
    ir: IrBuilder<'ctx>,
    module: Option<ModuleId>,
    /// Most recent last; the last entry is the active function
    functions: Vec<FunctionId>,
    vars: HashMap<String, ValueId>,
    blocks: BiMap<String, BlockId>,
    /// Blocks in creation order, for positional branch targets
    block_order: Vec<BlockId>,
    stack: Vec<ValueId>,
    keep_stack: bool,
}

impl<'ctx> StackBuilder<'ctx> {
    pub fn new(ctx: &'ctx mut Context) -> Self {
        Self {
            ir: IrBuilder::new(ctx),
            module: None,
            functions: Vec::new(),
            vars: HashMap::new(),
            blocks: BiMap::new(),
            block_order: Vec::new(),
            stack: Vec::new(),
            keep_stack: false,
        }
    }

    /// Apply one action, yielding the updated builder
    pub fn apply(mut self, action: Action) -> BuildResult<Self> {
        self.execute(action)?;
        Ok(self)
    }

    /// Apply actions left to right, stopping at the first failure
    pub fn apply_all(self, actions: impl IntoIterator<Item = Action>) -> BuildResult<Self> {
        actions
            .into_iter()
            .try_fold(self, |builder, action| builder.apply(action))
    }

    /// Take the final value off the stack (or peek it under `keep_stack`)
    pub fn last(&mut self) -> BuildResult<ValueId> {
        self.pop()
    }

    /// Apply one action in place
    pub fn execute(&mut self, action: Action) -> BuildResult<()> {
        tracing::trace!(action = action.name(), depth = self.stack.len(), "apply");
        match action {
            Action::Alloc { ty, name } => {
                let slot = self.ir.alloca(ty, name.as_deref())?;
                match name {
                    Some(name) => {
                        self.vars.insert(name, slot);
                    }
                    None => self.stack.push(slot),
                }
            }
            Action::Load { ty, from } => {
                let ptr = self.resolve(&from)?;
                let value = self.ir.load(ty, ptr)?;
                self.stack.push(value);
            }
            Action::Store { value, dest } => {
                let dest = self.resolve(&dest)?;
                let value = self.resolve(&value)?;
                self.ir.store(value, dest)?;
            }
            Action::Binary { op, lhs, rhs } => {
                let (lhs, rhs) = self.resolve_pair(&lhs, &rhs)?;
                let value = self.ir.binary(op, lhs, rhs)?;
                self.stack.push(value);
            }
            Action::Compare { pred, lhs, rhs } => {
                let (lhs, rhs) = self.resolve_pair(&lhs, &rhs)?;
                let value = self.ir.cmp(pred, lhs, rhs)?;
                self.stack.push(value);
            }
            Action::Cast { kind, value, to } => {
                let value = self.resolve(&value)?;
                let cast = match kind {
                    CastKind::Bitcast => self.ir.bitcast(value, to),
                    CastKind::ZextOrTrunc => self.ir.zext_or_trunc(value, to),
                    CastKind::FpToUi => self.ir.fptoui(value, to),
                    CastKind::PtrToInt => self.ir.ptrtoint(value, to),
                    CastKind::IntToPtr => self.ir.inttoptr(value, to),
                }?;
                self.stack.push(cast);
            }
            Action::Phi(edges) => self.phi(&edges)?,
            Action::CondBr {
                cond,
                then_block,
                else_block,
            } => {
                let then_dest = self.resolve_block(&then_block)?;
                let else_dest = self.resolve_block(&else_block)?;
                let cond = self.resolve(&cond)?;
                let br = self.ir.cond_br(cond, then_dest, else_dest)?;
                self.stack.push(br);
            }
            Action::Branch(dest) => {
                let dest = self.resolve_block(&dest)?;
                let br = self.ir.br(dest)?;
                self.stack.push(br);
            }
            Action::Call { callee, args } => self.call(&callee, &args)?,
            Action::Ret(value) => self.ret(value.as_ref())?,
            Action::CreateBlock(name) => self.create_block(name)?,
            Action::SetBlock(name) => {
                let block = self
                    .block(&name)
                    .ok_or(BuildError::UnknownBlock(name))?;
                self.ir.position_at_end(block);
            }
            Action::CreateFunction(spec) => self.create_function(spec)?,
            Action::UseFunction(function) => {
                self.module = Some(self.ir.context().function(function).module);
                self.functions.push(function);
                self.stack.push(self.ir.context().function_value(function));
            }
            Action::Module(module) => {
                tracing::debug!(module = %self.ir.context().module(module).name, "active module");
                self.module = Some(module);
            }
            Action::Push(operand) => {
                let value = self.resolve(&operand)?;
                self.stack.push(value);
            }
            Action::Pop(count) => {
                if count > self.stack.len() {
                    return Err(BuildError::StackUnderflow {
                        needed: count,
                        available: self.stack.len(),
                    });
                }
                self.stack.truncate(self.stack.len() - count);
            }
            Action::KeepStack => self.keep_stack = true,
            Action::Inspect(mut inspector) => inspector.call(self),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operand resolution
    // ------------------------------------------------------------------

    fn pop(&mut self) -> BuildResult<ValueId> {
        let top = if self.keep_stack {
            self.stack.last().copied()
        } else {
            self.stack.pop()
        };
        top.ok_or(BuildError::StackUnderflow {
            needed: 1,
            available: 0,
        })
    }

    fn resolve(&mut self, operand: &Operand) -> BuildResult<ValueId> {
        match operand {
            Operand::Stack => self.pop(),
            Operand::Value(value) => Ok(*value),
            Operand::Var(name) => self
                .var(name)
                .ok_or_else(|| BuildError::UnknownVariable(name.clone())),
            Operand::Arg(index) => {
                let function = self.current_function().ok_or(BuildError::NoFunction)?;
                self.ir
                    .context()
                    .function_args(function)
                    .get(*index as usize)
                    .copied()
                    .ok_or(BuildError::NoArgument(*index))
            }
        }
    }

    /// Right operand first
    fn resolve_pair(&mut self, lhs: &Operand, rhs: &Operand) -> BuildResult<(ValueId, ValueId)> {
        let rhs = self.resolve(rhs)?;
        let lhs = self.resolve(lhs)?;
        Ok((lhs, rhs))
    }

    fn resolve_block(&self, target: &BlockRef) -> BuildResult<BlockId> {
        match target {
            BlockRef::Named(name) => self
                .block(name)
                .ok_or_else(|| BuildError::UnknownBlock(name.clone())),
            BlockRef::Block(block) => Ok(*block),
            BlockRef::Next(offset) => {
                let current = self.current_block().ok_or(BuildError::NoCurrentBlock)?;
                self.block_order
                    .iter()
                    .position(|block| *block == current)
                    .and_then(|pos| pos.checked_add(*offset))
                    .and_then(|index| self.block_order.get(index))
                    .copied()
                    .ok_or(BuildError::NoFollowingBlock(*offset))
            }
        }
    }

    fn resolve_callee(&self, callee: &Callee) -> BuildResult<FunctionId> {
        match callee {
            Callee::Function(function) => Ok(*function),
            Callee::Named(name) => {
                let module = self.module.ok_or(BuildError::NoModule)?;
                self.ir
                    .context()
                    .get_function(module, name)
                    .ok_or_else(|| BuildError::UnknownFunction(name.clone()))
            }
        }
    }

    // ------------------------------------------------------------------
    // Actions with more than one step
    // ------------------------------------------------------------------

    fn phi(&mut self, edges: &[PhiEdge]) -> BuildResult<()> {
        let mut incoming = Vec::with_capacity(edges.len());
        for edge in edges.iter().rev() {
            let block = self.resolve_block(&edge.block)?;
            let value = self.resolve(&edge.value)?;
            incoming.push((value, block));
        }
        incoming.reverse();
        let phi = self.ir.phi(incoming)?;
        self.stack.push(phi);
        Ok(())
    }

    /// Call with arguments bitcast to the declared parameter types where
    /// their static types differ
    fn call(&mut self, callee: &Callee, args: &[Operand]) -> BuildResult<()> {
        let function = self.resolve_callee(callee)?;
        let ctx = self.ir.context();
        let params = ctx.param_types(function).to_vec();
        let too_many = !ctx.is_vararg(function) && args.len() > params.len();
        if args.len() < params.len() || too_many {
            return Err(BuildError::ArgumentCount {
                function: ctx.function_name(function).to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args.iter().rev() {
            values.push(self.resolve(arg)?);
        }
        values.reverse();

        for (value, param) in values.iter_mut().zip(&params) {
            if self.ir.context().type_of(*value) != *param {
                *value = self.ir.bitcast(*value, *param)?;
            }
        }
        let call = self.ir.call(function, values)?;
        self.stack.push(call);
        Ok(())
    }

    fn ret(&mut self, value: Option<&Operand>) -> BuildResult<()> {
        let function = self.current_function().ok_or(BuildError::NoFunction)?;
        let ctx = self.ir.context();
        let ret_ty = ctx.return_type(function);
        match (ctx.type_kind(ret_ty).is_void(), value) {
            (true, None) => {
                self.ir.ret_void()?;
            }
            (false, Some(operand)) => {
                let value = self.resolve(operand)?;
                self.ir.ret(value)?;
            }
            _ => {
                return Err(BuildError::ReturnMismatch {
                    function: ctx.function_name(function).to_string(),
                    expected: ctx.type_name(ret_ty),
                });
            }
        }
        Ok(())
    }

    fn create_block(&mut self, name: String) -> BuildResult<()> {
        if self.blocks.contains_left(name.as_str()) {
            return Err(BuildError::DuplicateBlock(name));
        }
        let ctx = self.ir.context_mut();
        let block = match self.functions.last() {
            Some(function) => ctx.append_block(*function, Some(&name)),
            None => ctx.create_block(Some(&name)),
        };
        tracing::debug!(block = %name, attached = !self.functions.is_empty(), "created block");
        self.blocks
            .insert(name.clone(), block)
            .map_err(|_| BuildError::DuplicateBlock(name))?;
        self.block_order.push(block);
        self.ir.position_at_end(block);
        Ok(())
    }

    /// Declare a function in the active module and make it active. Blocks
    /// created while no function existed move into it.
    fn create_function(&mut self, spec: FunctionSpec) -> BuildResult<()> {
        let module = self.module.ok_or(BuildError::NoModule)?;
        let ctx = self.ir.context_mut();
        let fn_ty = ctx.function_type(spec.ret, spec.params, spec.vararg);
        let function = ctx.add_function(module, spec.name, fn_ty, Linkage::External)?;
        for block in &self.block_order {
            if ctx.block_parent(*block).is_none() {
                ctx.attach_block(function, *block)?;
            }
        }
        self.ir.clear_insertion_point();
        self.functions.push(function);
        self.stack.push(self.ir.context().function_value(function));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn context(&self) -> &Context {
        self.ir.context()
    }

    pub fn context_mut(&mut self) -> &mut Context {
        self.ir.context_mut()
    }

    pub fn block(&self, name: &str) -> Option<BlockId> {
        self.blocks.get_by_left(name).copied()
    }

    pub fn block_name(&self, block: BlockId) -> Option<&str> {
        self.blocks.get_by_right(&block).map(String::as_str)
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.ir.insert_block()
    }

    pub fn current_block_name(&self) -> Option<&str> {
        self.block_name(self.current_block()?)
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.functions.last().copied()
    }

    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }

    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    pub fn var(&self, name: &str) -> Option<ValueId> {
        self.vars.get(name).copied()
    }

    pub fn stack(&self) -> &[ValueId] {
        &self.stack
    }

    pub fn keeps_stack(&self) -> bool {
        self.keep_stack
    }
}
