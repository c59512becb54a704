//! Integer constant factories
//!
//! The width of a constant follows the Rust type it is built from:
//! `10u8.constant(&mut ctx)` is an `i8` constant, `true` an `i1`.

use llir::{Context, ValueId};

pub fn i1(ctx: &mut Context, v: bool) -> ValueId {
    ctx.const_int(1, u128::from(v))
}

pub fn i8(ctx: &mut Context, v: u8) -> ValueId {
    ctx.const_int(8, u128::from(v))
}

pub fn i16(ctx: &mut Context, v: u16) -> ValueId {
    ctx.const_int(16, u128::from(v))
}

pub fn i32(ctx: &mut Context, v: u32) -> ValueId {
    ctx.const_int(32, u128::from(v))
}

pub fn i64(ctx: &mut Context, v: u64) -> ValueId {
    ctx.const_int(64, u128::from(v))
}

/// Rust integers that map onto an IR integer constant of matching width
pub trait IntoConstant {
    fn constant(self, ctx: &mut Context) -> ValueId;
}

impl IntoConstant for bool {
    fn constant(self, ctx: &mut Context) -> ValueId {
        i1(ctx, self)
    }
}

macro_rules! into_constant {
    ($($unsigned:ty, $signed:ty => $bits:expr;)*) => {
        $(
            impl IntoConstant for $unsigned {
                fn constant(self, ctx: &mut Context) -> ValueId {
                    ctx.const_int($bits, u128::from(self))
                }
            }

            impl IntoConstant for $signed {
                fn constant(self, ctx: &mut Context) -> ValueId {
                    // two's complement; const_int masks to the width
                    ctx.const_int($bits, i128::from(self) as u128)
                }
            }
        )*
    };
}

into_constant! {
    u8, i8 => 8;
    u16, i16 => 16;
    u32, i32 => 32;
    u64, i64 => 64;
}

/// Constant of the width implied by `v`'s type
pub fn iv(ctx: &mut Context, v: impl IntoConstant) -> ValueId {
    v.constant(ctx)
}

/// Zero-extended payload of an integer constant
pub fn value(ctx: &Context, c: ValueId) -> Option<u128> {
    ctx.const_int_value(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_follows_rust_type() {
        let mut ctx = Context::new();
        let a = 10u32.constant(&mut ctx);
        let b = i32(&mut ctx, 10);
        assert_eq!(a, b);

        let byte = iv(&mut ctx, 10u8);
        assert_ne!(byte, b);
        assert_eq!(ctx.type_name(ctx.type_of(byte)), "i8");
        assert_eq!(value(&ctx, byte), Some(10));
        assert_eq!(i8(&mut ctx, 10), 10u8.constant(&mut ctx));
    }

    #[test]
    fn test_signed_and_bool() {
        let mut ctx = Context::new();
        let minus_one = (-1i8).constant(&mut ctx);
        assert_eq!(value(&ctx, minus_one), Some(0xff));
        assert_eq!(ctx.const_int_signed(minus_one), Some(-1));

        let t = true.constant(&mut ctx);
        assert_eq!(t, i1(&mut ctx, true));
        assert_eq!(value(&ctx, t), Some(1));
    }

    #[test]
    fn test_value_of_non_constant() {
        let mut ctx = Context::new();
        let ty = ctx.int_type(8);
        let u = ctx.undef(ty);
        assert_eq!(value(&ctx, u), None);
    }
}
