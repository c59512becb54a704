//! String helpers for names and IR text

use llir::{Context, TypeId, TypeKind, ValueId, print_instruction, print_operand};

/// Split at the first (or with `reverse`, the last) `delim`. Without a
/// delimiter the whole string lands on the side away from the search
/// start: `(s, "")` forward, `("", s)` in reverse.
pub fn split(s: &str, delim: char, reverse: bool) -> (&str, &str) {
    let found = if reverse { s.rfind(delim) } else { s.find(delim) };
    match found {
        Some(at) => (&s[..at], &s[at + delim.len_utf8()..]),
        None if reverse => ("", s),
        None => (s, ""),
    }
}

/// Components of a delimited string, front to back or back to front
#[derive(Debug, Clone)]
pub struct Splitter<'a> {
    rest: &'a str,
    delim: char,
    reverse: bool,
}

impl<'a> Iterator for Splitter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let (head, tail) = split(self.rest, self.delim, self.reverse);
        if self.reverse {
            self.rest = head;
            Some(tail)
        } else {
            self.rest = tail;
            Some(head)
        }
    }
}

pub fn splitter(s: &str, delim: char, reverse: bool) -> Splitter<'_> {
    Splitter {
        rest: s,
        delim,
        reverse,
    }
}

/// Name of a value; unnamed instructions use their slot (`%3`), other
/// unnamed values their operand spelling. Instructions without a result
/// (`store`, `br`, `ret`) have no name and yield an empty string.
pub fn value_name(ctx: &Context, value: ValueId) -> String {
    if let Some(name) = ctx.value_name(value) {
        return name.to_string();
    }
    if ctx.instruction(value).is_some() {
        if ctx.type_kind(ctx.type_of(value)).is_void() {
            return String::new();
        }
        let text = print_instruction(ctx, value);
        return splitter(&text, '=', false)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }
    print_operand(ctx, value)
}

/// Compact type spelling: `i8`, `i8p`, `i32pp`
pub fn type_name(ctx: &Context, ty: TypeId) -> String {
    match ctx.type_kind(ty) {
        TypeKind::Pointer { pointee, .. } => type_name(ctx, *pointee) + "p",
        _ => ctx.type_name(ty),
    }
}

/// Operand spellings joined by `separator`
pub fn join(ctx: &Context, values: impl IntoIterator<Item = ValueId>, separator: &str) -> String {
    values
        .into_iter()
        .map(|v| print_operand(ctx, v))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llir::{BinaryOp, IrBuilder, Linkage};

    #[test]
    fn test_split_directions() {
        assert_eq!(split("lart.abstract.sym", '.', false), ("lart", "abstract.sym"));
        assert_eq!(split("lart.abstract.sym", '.', true), ("lart.abstract", "sym"));
        assert_eq!(split("plain", '.', false), ("plain", ""));
        assert_eq!(split("plain", '.', true), ("", "plain"));
    }

    #[test]
    fn test_splitter() {
        let forward: Vec<_> = splitter("a.b.c", '.', false).collect();
        assert_eq!(forward, vec!["a", "b", "c"]);
        let backward: Vec<_> = splitter("a.b.c", '.', true).collect();
        assert_eq!(backward, vec!["c", "b", "a"]);
        assert_eq!(splitter("", '.', false).count(), 0);
    }

    #[test]
    fn test_names() {
        let mut ctx = Context::new();
        let m = ctx.create_module("m");
        let i8 = ctx.int_type(8);
        let i8p = ctx.pointer_type(i8);
        let i8pp = ctx.pointer_type(i8p);
        assert_eq!(type_name(&ctx, i8p), "i8p");
        assert_eq!(type_name(&ctx, i8pp), "i8pp");

        let fn_ty = ctx.function_type(i8, vec![i8, i8], false);
        let f = ctx.add_function(m, "f", fn_ty, Linkage::External).unwrap();
        let entry = ctx.append_block(f, Some("entry"));
        let args = ctx.function_args(f).to_vec();
        ctx.set_value_name(args[0], "x");
        let mut b = IrBuilder::new(&mut ctx);
        b.position_at_end(entry);
        let sum = b.binary(BinaryOp::Add, args[0], args[1]).unwrap();
        let ret = b.ret(sum).unwrap();

        assert_eq!(value_name(&ctx, args[0]), "x");
        assert_eq!(value_name(&ctx, sum), "%1");
        assert_eq!(value_name(&ctx, ret), "");
        let seven = ctx.const_int(8, 7);
        assert_eq!(value_name(&ctx, seven), "i8 7");
        assert_eq!(join(&ctx, [args[0], seven], ", "), "i8 %x, i8 7");
    }
}
