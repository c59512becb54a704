//! String metadata on values
//!
//! Instructions and functions carry a tuple `!{!{!"text"}}` under a tag.
//! Arguments cannot hold attachments, so their strings live in a tuple on
//! the parent function under [`tag::ARGUMENTS`], one slot per parameter,
//! with [`tag::NONE`] marking unset slots.

use llir::{Context, IrError, IrResult, MdOperand, MetadataId, ValueId, ValueKind};

pub mod tag {
    pub const NONE: &str = "sc.meta.none";
    pub const ARGUMENTS: &str = "sc.meta.arguments";
}

/// Node holding a single string
pub fn node(ctx: &mut Context, s: &str) -> MetadataId {
    ctx.md_string(s)
}

/// The string in the first operand of `node`; `None` if absent or empty
pub fn get_string(ctx: &Context, node: MetadataId) -> Option<&str> {
    match ctx.md(node).operands.first()? {
        MdOperand::String(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Tuple of nodes
pub fn tuple(ctx: &mut Context, nodes: impl IntoIterator<Item = MetadataId>) -> MetadataId {
    let operands = nodes.into_iter().map(MdOperand::Node).collect();
    ctx.md_node(operands)
}

/// Tuple of `size` nodes produced by `init`
pub fn tuple_with(
    ctx: &mut Context,
    size: usize,
    mut init: impl FnMut(&mut Context) -> MetadataId,
) -> MetadataId {
    let nodes: Vec<_> = (0..size).map(|_| init(ctx)).collect();
    tuple(ctx, nodes)
}

/// Attach `meta` to `value` under `tag`. Arguments keep one string each
/// regardless of tag.
pub fn set(ctx: &mut Context, value: ValueId, tag: &str, meta: &str) -> IrResult<()> {
    if let ValueKind::Argument { .. } = ctx.value(value).kind {
        let meta = node(ctx, meta);
        return argument::set(ctx, value, meta);
    }
    let meta = node(ctx, meta);
    let wrapped = tuple(ctx, [meta]);
    ctx.set_metadata(value, tag, wrapped)
}

/// String previously attached with [`set`]
pub fn get<'a>(ctx: &'a Context, value: ValueId, tag: &str) -> Option<&'a str> {
    if let ValueKind::Argument { .. } = ctx.value(value).kind {
        return argument::get(ctx, value);
    }
    let wrapped = ctx.metadata(value, tag)?;
    match ctx.md(wrapped).operands.first()? {
        MdOperand::Node(inner) => get_string(ctx, *inner),
        _ => None,
    }
}

pub mod argument {
    use super::*;

    fn position(ctx: &Context, arg: ValueId) -> IrResult<(ValueId, usize)> {
        match ctx.value(arg).kind {
            ValueKind::Argument { function, index } => {
                Ok((ctx.function_value(function), index as usize))
            }
            _ => Err(IrError::MetadataTarget),
        }
    }

    /// The function's argument tuple, created with every slot unset
    fn slots(ctx: &mut Context, function: ValueId) -> IrResult<MetadataId> {
        if let Some(existing) = ctx.metadata(function, tag::ARGUMENTS) {
            return Ok(existing);
        }
        let size = ctx
            .as_function(function)
            .map_or(0, |f| ctx.function_args(f).len());
        let data = tuple_with(ctx, size, |ctx| node(ctx, tag::NONE));
        ctx.set_metadata(function, tag::ARGUMENTS, data)?;
        Ok(data)
    }

    pub fn set(ctx: &mut Context, arg: ValueId, meta: MetadataId) -> IrResult<()> {
        let (function, index) = position(ctx, arg)?;
        let data = slots(ctx, function)?;
        ctx.replace_md_operand(data, index, MdOperand::Node(meta))
    }

    /// The argument's string, `None` while its slot is unset
    pub fn get(ctx: &Context, arg: ValueId) -> Option<&str> {
        let (function, index) = position(ctx, arg).ok()?;
        let data = ctx.metadata(function, tag::ARGUMENTS)?;
        match ctx.md(data).operands.get(index)? {
            MdOperand::Node(n) => get_string(ctx, *n).filter(|s| *s != tag::NONE),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llir::{IrBuilder, Linkage};

    fn function_with_add(ctx: &mut Context) -> (ValueId, ValueId) {
        let module = ctx.create_module("m");
        let i8 = ctx.int_type(8);
        let fn_ty = ctx.function_type(i8, vec![i8, i8], false);
        let f = ctx.add_function(module, "f", fn_ty, Linkage::External).unwrap();
        let entry = ctx.append_block(f, Some("entry"));
        let args = ctx.function_args(f).to_vec();
        let mut b = IrBuilder::new(ctx);
        b.position_at_end(entry);
        let sum = b.binary(llir::BinaryOp::Add, args[0], args[1]).unwrap();
        (ctx.function_value(f), sum)
    }

    #[test]
    fn test_instruction_round_trip() {
        let mut ctx = Context::new();
        let (function, sum) = function_with_add(&mut ctx);
        set(&mut ctx, sum, "sc.test", "lart.abstract").unwrap();
        assert_eq!(get(&ctx, sum, "sc.test"), Some("lart.abstract"));
        assert_eq!(get(&ctx, sum, "sc.other"), None);

        set(&mut ctx, function, "sc.test", "lart.fn").unwrap();
        assert_eq!(get(&ctx, function, "sc.test"), Some("lart.fn"));
    }

    #[test]
    fn test_argument_slots() {
        let mut ctx = Context::new();
        let (function, _) = function_with_add(&mut ctx);
        let f = ctx.as_function(function).unwrap();
        let args = ctx.function_args(f).to_vec();

        assert_eq!(get(&ctx, args[1], "sc.test"), None);
        set(&mut ctx, args[1], "sc.test", "second").unwrap();
        assert_eq!(get(&ctx, args[1], "sc.test"), Some("second"));
        assert_eq!(get(&ctx, args[0], "sc.test"), None);

        let data = ctx.metadata(function, tag::ARGUMENTS).unwrap();
        assert_eq!(ctx.md(data).operands.len(), 2);
    }

    #[test]
    fn test_constants_reject_metadata() {
        let mut ctx = Context::new();
        let c = ctx.const_int(8, 1);
        assert!(set(&mut ctx, c, "sc.test", "x").is_err());
    }

    #[test]
    fn test_empty_string_reads_as_none() {
        let mut ctx = Context::new();
        let empty = node(&mut ctx, "");
        let bare = ctx.md_node(vec![]);
        let full = node(&mut ctx, "a");
        assert_eq!(get_string(&ctx, empty), None);
        assert_eq!(get_string(&ctx, bare), None);
        assert_eq!(get_string(&ctx, full), Some("a"));
    }
}
