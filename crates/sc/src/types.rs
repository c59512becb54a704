//! Type factories and size queries

use llir::{Context, FloatKind, TypeId, ValueId};

pub fn void_t(ctx: &mut Context) -> TypeId {
    ctx.void_type()
}

/// Integer type of `bits` width
pub fn ii(ctx: &mut Context, bits: u32) -> TypeId {
    ctx.int_type(bits)
}

pub fn i1(ctx: &mut Context) -> TypeId {
    ii(ctx, 1)
}

pub fn i8(ctx: &mut Context) -> TypeId {
    ii(ctx, 8)
}

pub fn i16(ctx: &mut Context) -> TypeId {
    ii(ctx, 16)
}

pub fn i32(ctx: &mut Context) -> TypeId {
    ii(ctx, 32)
}

pub fn i64(ctx: &mut Context) -> TypeId {
    ii(ctx, 64)
}

pub fn i128(ctx: &mut Context) -> TypeId {
    ii(ctx, 128)
}

/// Pointer to an integer of `bits` width in `address_space`
pub fn iip(ctx: &mut Context, bits: u32, address_space: u32) -> TypeId {
    let int = ii(ctx, bits);
    ctx.pointer_type_in(int, address_space)
}

pub fn i1p(ctx: &mut Context) -> TypeId {
    iip(ctx, 1, 0)
}

pub fn i8p(ctx: &mut Context) -> TypeId {
    iip(ctx, 8, 0)
}

pub fn i16p(ctx: &mut Context) -> TypeId {
    iip(ctx, 16, 0)
}

pub fn i32p(ctx: &mut Context) -> TypeId {
    iip(ctx, 32, 0)
}

pub fn i64p(ctx: &mut Context) -> TypeId {
    iip(ctx, 64, 0)
}

pub fn f32(ctx: &mut Context) -> TypeId {
    ctx.float_type(FloatKind::Single)
}

pub fn f64(ctx: &mut Context) -> TypeId {
    ctx.float_type(FloatKind::Double)
}

/// Size of a type in bits; `None` for unsized types
pub fn bits(ctx: &Context, ty: TypeId) -> Option<u64> {
    ctx.size_in_bits(ty)
}

/// Size in bytes, rounded up
pub fn bytes(ctx: &Context, ty: TypeId) -> Option<u64> {
    bits(ctx, ty).map(|b| b.div_ceil(8))
}

pub fn value_bits(ctx: &Context, value: ValueId) -> Option<u64> {
    bits(ctx, ctx.type_of(value))
}

pub fn value_bytes(ctx: &Context, value: ValueId) -> Option<u64> {
    bytes(ctx, ctx.type_of(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_intern() {
        let mut ctx = Context::new();
        let a = i8(&mut ctx);
        let b = ii(&mut ctx, 8);
        assert_eq!(a, b);
        let p = i8p(&mut ctx);
        assert_eq!(ctx.type_kind(p).pointee(), Some(a));
        assert_ne!(iip(&mut ctx, 8, 1), p);
    }

    #[test]
    fn test_sizes() {
        let mut ctx = Context::new();
        let bool_ty = i1(&mut ctx);
        let wide = i64(&mut ctx);
        let ptr = i32p(&mut ctx);
        let void = void_t(&mut ctx);
        assert_eq!(bits(&ctx, bool_ty), Some(1));
        assert_eq!(bytes(&ctx, bool_ty), Some(1));
        assert_eq!(bytes(&ctx, wide), Some(8));
        assert_eq!(bits(&ctx, ptr), Some(64));
        assert_eq!(bits(&ctx, void), None);

        let c = ctx.const_int(16, 3);
        assert_eq!(value_bits(&ctx, c), Some(16));
        assert_eq!(value_bytes(&ctx, c), Some(2));
    }
}
