//! Chained value navigation where a missing step yields `None`

use llir::{Context, ValueId};

use crate::views::Class;

#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    ctx: &'a Context,
    value: Option<ValueId>,
}

impl<'a> Transformer<'a> {
    pub fn new(ctx: &'a Context, value: impl Into<Option<ValueId>>) -> Self {
        Self {
            ctx,
            value: value.into(),
        }
    }

    /// Map the held value; skipped once empty
    pub fn apply(self, f: impl FnOnce(&'a Context, ValueId) -> Option<ValueId>) -> Self {
        Self {
            value: self.value.and_then(|v| f(self.ctx, v)),
            ..self
        }
    }

    /// Operand `idx` of an instruction
    pub fn operand(self, idx: usize) -> Self {
        self.apply(|ctx, v| ctx.instruction(v)?.operands().get(idx).copied())
    }

    /// Keep the value only if it belongs to `class`
    pub fn cast(self, class: Class) -> Self {
        self.apply(|ctx, v| class.matches(ctx, v).then_some(v))
    }

    pub fn freeze(self) -> Option<ValueId> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llir::{BinaryOp, IrBuilder, Linkage};

    #[test]
    fn test_operand_chain() {
        let mut ctx = Context::new();
        let module = ctx.create_module("m");
        let i8 = ctx.int_type(8);
        let fn_ty = ctx.function_type(i8, vec![i8], false);
        let f = ctx.add_function(module, "f", fn_ty, Linkage::External).unwrap();
        let entry = ctx.append_block(f, None);
        let arg = ctx.function_args(f)[0];
        let ten = ctx.const_int(8, 10);

        let mut b = IrBuilder::new(&mut ctx);
        b.position_at_end(entry);
        let add = b.binary(BinaryOp::Add, ten, arg).unwrap();
        let mul = b.binary(BinaryOp::Mul, add, arg).unwrap();

        let lhs = Transformer::new(&ctx, mul).operand(0).operand(0).freeze();
        assert_eq!(lhs, Some(ten));

        let cast = Transformer::new(&ctx, mul).operand(0).cast(Class::Binary).freeze();
        assert_eq!(cast, Some(add));
    }

    #[test]
    fn test_none_propagates() {
        let mut ctx = Context::new();
        let c = ctx.const_int(8, 1);
        let t = Transformer::new(&ctx, c);
        assert_eq!(t.operand(0).freeze(), None);
        assert_eq!(t.cast(Class::Instruction).operand(0).freeze(), None);
        assert_eq!(t.cast(Class::Constant).freeze(), Some(c));
        let empty = Transformer::new(&ctx, Option::<ValueId>::None);
        assert_eq!(empty.apply(|_, v| Some(v)).freeze(), None);
    }
}
