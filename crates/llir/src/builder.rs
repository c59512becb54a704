//! Instruction emitter
//!
//! [`IrBuilder`] appends instructions at the end of one insertion block.
//! Every method validates operand types before touching the context, so a
//! failed call leaves the IR unchanged. Integer operations on two constants
//! fold to a constant instead of emitting an instruction.

use crate::context::Context;
use crate::error::{IrError, IrResult};
use crate::inst::{BinaryOp, CastOp, InstKind, Instruction, Predicate};
use crate::module::{BlockId, FunctionId};
use crate::types::{TypeId, TypeKind};
use crate::value::{ValueId, sign_extend};

pub struct IrBuilder<'ctx> {
    ctx: &'ctx mut Context,
    block: Option<BlockId>,
}

impl<'ctx> IrBuilder<'ctx> {
    pub fn new(ctx: &'ctx mut Context) -> Self {
        Self { ctx, block: None }
    }

    pub fn context(&self) -> &Context {
        self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        self.ctx
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.block = Some(block);
    }

    pub fn clear_insertion_point(&mut self) {
        self.block = None;
    }

    pub fn insert_block(&self) -> Option<BlockId> {
        self.block
    }

    /// Block that takes the next instruction, if it can
    fn insertion(&self) -> IrResult<BlockId> {
        let block = self.block.ok_or(IrError::NoInsertPoint)?;
        if self.ctx.block_terminator(block).is_some() {
            return Err(IrError::BlockTerminated {
                block: self.ctx.block_label(block),
            });
        }
        Ok(block)
    }

    fn emit(&mut self, kind: InstKind, ty: TypeId, name: Option<&str>) -> IrResult<ValueId> {
        let block = self.insertion()?;
        let inst = Instruction {
            kind,
            parent: block,
        };
        tracing::trace!(opcode = inst.opcode(), block = block.index(), "emit");
        Ok(self.ctx.add_instruction(block, inst, ty, name))
    }

    fn expect_type(&self, value: ValueId, expected: TypeId) -> IrResult<()> {
        let found = self.ctx.type_of(value);
        if found != expected {
            return Err(IrError::mismatch(
                self.ctx.type_name(expected),
                self.ctx.type_name(found),
            ));
        }
        Ok(())
    }

    fn kind_of(&self, value: ValueId) -> &TypeKind {
        self.ctx.type_kind(self.ctx.type_of(value))
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    pub fn alloca(&mut self, ty: TypeId, name: Option<&str>) -> IrResult<ValueId> {
        if self.ctx.alloc_size(ty).is_none() {
            return Err(IrError::operand(
                "alloca",
                format!("cannot allocate {}", self.ctx.type_name(ty)),
            ));
        }
        let ptr = self.ctx.pointer_type(ty);
        self.emit(InstKind::Alloca { allocated: ty }, ptr, name)
    }

    pub fn load(&mut self, ty: TypeId, ptr: ValueId) -> IrResult<ValueId> {
        let Some(pointee) = self.kind_of(ptr).pointee() else {
            return Err(IrError::operand(
                "load",
                format!("{} is not a pointer", self.ctx.type_name(self.ctx.type_of(ptr))),
            ));
        };
        if pointee != ty {
            return Err(IrError::mismatch(
                self.ctx.type_name(ty),
                self.ctx.type_name(pointee),
            ));
        }
        self.emit(InstKind::Load { ptr }, ty, None)
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) -> IrResult<ValueId> {
        let Some(pointee) = self.kind_of(ptr).pointee() else {
            return Err(IrError::operand(
                "store",
                format!("{} is not a pointer", self.ctx.type_name(self.ctx.type_of(ptr))),
            ));
        };
        self.expect_type(value, pointee)?;
        let void = self.ctx.void_type();
        self.emit(InstKind::Store { value, ptr }, void, None)
    }

    // ------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------

    pub fn binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> IrResult<ValueId> {
        let ty = self.ctx.type_of(lhs);
        self.expect_type(rhs, ty)?;
        let kind = self.ctx.type_kind(ty);
        let valid = if op.is_float() {
            kind.is_float()
        } else {
            kind.is_integer()
        };
        if !valid {
            return Err(IrError::operand(
                op.mnemonic(),
                format!("operands of type {}", self.ctx.type_name(ty)),
            ));
        }
        if let Some(folded) = self.fold_binary(op, lhs, rhs) {
            return Ok(folded);
        }
        self.emit(InstKind::Binary { op, lhs, rhs }, ty, None)
    }

    fn fold_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> Option<ValueId> {
        let a = self.ctx.const_int_value(lhs)?;
        let b = self.ctx.const_int_value(rhs)?;
        let ty = self.ctx.type_of(lhs);
        let bits = self.ctx.type_kind(ty).int_bits()?;
        // payloads are u128, wider integers stay unfolded
        if bits > 128 {
            return None;
        }
        let (sa, sb) = (sign_extend(a, bits), sign_extend(b, bits));
        let result = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::UDiv => a.checked_div(b)?,
            BinaryOp::URem => a.checked_rem(b)?,
            BinaryOp::SDiv => sa.checked_div(sb)? as u128,
            BinaryOp::SRem => sa.checked_rem(sb)? as u128,
            BinaryOp::Shl if b < u128::from(bits) => a << b,
            BinaryOp::LShr if b < u128::from(bits) => a >> b,
            BinaryOp::AShr if b < u128::from(bits) => (sa >> b) as u128,
            BinaryOp::And => a & b,
            BinaryOp::Or => a | b,
            BinaryOp::Xor => a ^ b,
            _ => return None,
        };
        self.ctx.const_int_of(ty, result).ok()
    }

    /// Integer or float comparison, routed by the predicate
    pub fn cmp(&mut self, pred: Predicate, lhs: ValueId, rhs: ValueId) -> IrResult<ValueId> {
        if pred.is_float() {
            self.fcmp(pred, lhs, rhs)
        } else {
            self.icmp(pred, lhs, rhs)
        }
    }

    pub fn icmp(&mut self, pred: Predicate, lhs: ValueId, rhs: ValueId) -> IrResult<ValueId> {
        if pred.is_float() {
            return Err(IrError::operand("icmp", format!("float predicate {}", pred.name())));
        }
        let ty = self.ctx.type_of(lhs);
        self.expect_type(rhs, ty)?;
        let kind = self.ctx.type_kind(ty);
        if !(kind.is_integer() || kind.is_pointer()) {
            return Err(IrError::operand(
                "icmp",
                format!("operands of type {}", self.ctx.type_name(ty)),
            ));
        }
        if let Some(folded) = self.fold_icmp(pred, lhs, rhs) {
            return Ok(folded);
        }
        let i1 = self.ctx.int_type(1);
        self.emit(InstKind::ICmp { pred, lhs, rhs }, i1, None)
    }

    fn fold_icmp(&mut self, pred: Predicate, lhs: ValueId, rhs: ValueId) -> Option<ValueId> {
        let a = self.ctx.const_int_value(lhs)?;
        let b = self.ctx.const_int_value(rhs)?;
        let (sa, sb) = (self.ctx.const_int_signed(lhs)?, self.ctx.const_int_signed(rhs)?);
        let result = match pred {
            Predicate::Eq => a == b,
            Predicate::Ne => a != b,
            Predicate::Ugt => a > b,
            Predicate::Uge => a >= b,
            Predicate::Ult => a < b,
            Predicate::Ule => a <= b,
            Predicate::Sgt => sa > sb,
            Predicate::Sge => sa >= sb,
            Predicate::Slt => sa < sb,
            Predicate::Sle => sa <= sb,
            _ => return None,
        };
        Some(self.ctx.const_int(1, u128::from(result)))
    }

    pub fn fcmp(&mut self, pred: Predicate, lhs: ValueId, rhs: ValueId) -> IrResult<ValueId> {
        if !pred.is_float() {
            return Err(IrError::operand("fcmp", format!("integer predicate {}", pred.name())));
        }
        let ty = self.ctx.type_of(lhs);
        self.expect_type(rhs, ty)?;
        if !self.ctx.type_kind(ty).is_float() {
            return Err(IrError::operand(
                "fcmp",
                format!("operands of type {}", self.ctx.type_name(ty)),
            ));
        }
        let i1 = self.ctx.int_type(1);
        self.emit(InstKind::FCmp { pred, lhs, rhs }, i1, None)
    }

    // ------------------------------------------------------------------
    // Casts
    // ------------------------------------------------------------------

    fn invalid_cast(&self, op: CastOp, value: ValueId, to: TypeId) -> IrError {
        IrError::InvalidCast {
            op: op.mnemonic(),
            from: self.ctx.type_name(self.ctx.type_of(value)),
            to: self.ctx.type_name(to),
        }
    }

    /// Emit a cast after checking it is legal for the operand types
    pub fn cast(&mut self, op: CastOp, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        let from = self.ctx.type_of(value);
        let src = self.ctx.type_kind(from).clone();
        let dst = self.ctx.type_kind(to).clone();
        let legal = match op {
            CastOp::BitCast => {
                (src.is_pointer() && dst.is_pointer())
                    || (!src.is_pointer()
                        && !dst.is_pointer()
                        && (src.is_integer() || src.is_float())
                        && (dst.is_integer() || dst.is_float())
                        && self.ctx.size_in_bits(from) == self.ctx.size_in_bits(to))
            }
            CastOp::ZExt => matches!((src.int_bits(), dst.int_bits()), (Some(a), Some(b)) if a < b),
            CastOp::Trunc => matches!((src.int_bits(), dst.int_bits()), (Some(a), Some(b)) if a > b),
            CastOp::FpToUi => src.is_float() && dst.is_integer(),
            CastOp::PtrToInt => src.is_pointer() && dst.is_integer(),
            CastOp::IntToPtr => src.is_integer() && dst.is_pointer(),
        };
        if !legal {
            return Err(self.invalid_cast(op, value, to));
        }
        if op == CastOp::BitCast && from == to {
            return Ok(value);
        }
        let folds = matches!(op, CastOp::ZExt | CastOp::Trunc);
        if let Some(raw) = self.ctx.const_int_value(value).filter(|_| folds) {
            return self.ctx.const_int_of(to, raw);
        }
        self.emit(InstKind::Cast { op, value }, to, None)
    }

    pub fn bitcast(&mut self, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        self.cast(CastOp::BitCast, value, to)
    }

    /// Zero-extend or truncate to `to`; returns `value` itself when the
    /// types already agree
    pub fn zext_or_trunc(&mut self, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        let from = self.ctx.type_of(value);
        if from == to {
            return Ok(value);
        }
        match (
            self.ctx.type_kind(from).int_bits(),
            self.ctx.type_kind(to).int_bits(),
        ) {
            (Some(a), Some(b)) if a < b => self.cast(CastOp::ZExt, value, to),
            (Some(_), Some(_)) => self.cast(CastOp::Trunc, value, to),
            _ => Err(self.invalid_cast(CastOp::ZExt, value, to)),
        }
    }

    /// Float to unsigned integer; returns `value` itself when the types
    /// already agree
    pub fn fptoui(&mut self, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        if self.ctx.type_of(value) == to {
            return Ok(value);
        }
        self.cast(CastOp::FpToUi, value, to)
    }

    pub fn ptrtoint(&mut self, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        self.cast(CastOp::PtrToInt, value, to)
    }

    pub fn inttoptr(&mut self, value: ValueId, to: TypeId) -> IrResult<ValueId> {
        self.cast(CastOp::IntToPtr, value, to)
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    /// Phi typed by its first incoming value
    pub fn phi(&mut self, incoming: Vec<(ValueId, BlockId)>) -> IrResult<ValueId> {
        let Some(&(first, _)) = incoming.first() else {
            return Err(IrError::EmptyPhi);
        };
        let ty = self.ctx.type_of(first);
        for (value, _) in &incoming {
            self.expect_type(*value, ty)?;
        }
        self.emit(InstKind::Phi { incoming }, ty, None)
    }

    pub fn br(&mut self, dest: BlockId) -> IrResult<ValueId> {
        let void = self.ctx.void_type();
        self.emit(InstKind::Br { dest }, void, None)
    }

    pub fn cond_br(
        &mut self,
        cond: ValueId,
        then_dest: BlockId,
        else_dest: BlockId,
    ) -> IrResult<ValueId> {
        let i1 = self.ctx.int_type(1);
        self.expect_type(cond, i1)?;
        let void = self.ctx.void_type();
        self.emit(
            InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            },
            void,
            None,
        )
    }

    /// Direct call; arguments must match the declared parameter types
    /// exactly, extra arguments are only allowed for variadic callees
    pub fn call(&mut self, callee: FunctionId, args: Vec<ValueId>) -> IrResult<ValueId> {
        let params = self.ctx.param_types(callee).to_vec();
        let count_ok = if self.ctx.is_vararg(callee) {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !count_ok {
            return Err(IrError::ArgumentCount {
                function: self.ctx.function_name(callee).to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }
        for (arg, param) in args.iter().zip(&params) {
            self.expect_type(*arg, *param)?;
        }
        let ret = self.ctx.return_type(callee);
        self.emit(InstKind::Call { callee, args }, ret, None)
    }

    /// Function owning the insertion block
    fn current_function(&self) -> IrResult<FunctionId> {
        let block = self.insertion()?;
        self.ctx.block_parent(block).ok_or_else(|| IrError::DetachedBlock {
            block: self.ctx.block_label(block),
        })
    }

    pub fn ret(&mut self, value: ValueId) -> IrResult<ValueId> {
        let function = self.current_function()?;
        let expected = self.ctx.return_type(function);
        if self.ctx.type_kind(expected).is_void() || self.ctx.type_of(value) != expected {
            return Err(IrError::ReturnMismatch {
                function: self.ctx.function_name(function).to_string(),
                expected: self.ctx.type_name(expected),
            });
        }
        let void = self.ctx.void_type();
        self.emit(InstKind::Ret { value: Some(value) }, void, None)
    }

    pub fn ret_void(&mut self) -> IrResult<ValueId> {
        let function = self.current_function()?;
        let expected = self.ctx.return_type(function);
        if !self.ctx.type_kind(expected).is_void() {
            return Err(IrError::ReturnMismatch {
                function: self.ctx.function_name(function).to_string(),
                expected: self.ctx.type_name(expected),
            });
        }
        let void = self.ctx.void_type();
        self.emit(InstKind::Ret { value: None }, void, None)
    }
}
