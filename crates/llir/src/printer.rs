//! Textual dump of modules in an LLVM-like syntax

use std::collections::HashMap;
use std::fmt::Write;

use crate::context::Context;
use crate::inst::InstKind;
use crate::metadata::{MdOperand, MetadataId};
use crate::module::{BlockId, FunctionId, ModuleId};
use crate::value::{ConstantKind, ValueId, ValueKind};

/// Render a whole module
pub fn print_module(ctx: &Context, module: ModuleId) -> String {
    let mut printer = Printer::new(ctx);
    let mut out = format!("; ModuleID = '{}'\n", ctx.module(module).name);
    for f in ctx.module_functions(module) {
        out.push('\n');
        out.push_str(&printer.function(*f));
    }
    out.push_str(&printer.metadata_table());
    out
}

/// Render one function with its own metadata table
pub fn print_function(ctx: &Context, function: FunctionId) -> String {
    let mut printer = Printer::new(ctx);
    let mut out = printer.function(function);
    out.push_str(&printer.metadata_table());
    out
}

/// Operand spelling of a value, e.g. `i8 %x` or `i32 10`
pub fn print_operand(ctx: &Context, value: ValueId) -> String {
    let printer = Printer::new(ctx);
    printer.typed(value)
}

/// One instruction as it appears inside its function, e.g. `%3 = add i8 %2, %1`
pub fn print_instruction(ctx: &Context, value: ValueId) -> String {
    let mut printer = Printer::new(ctx);
    if let Some(function) = ctx.instruction_function(value) {
        printer.number(function);
    }
    printer.instruction(value)
}

struct Printer<'a> {
    ctx: &'a Context,
    slots: HashMap<ValueId, String>,
    labels: HashMap<BlockId, String>,
    md_numbers: HashMap<MetadataId, usize>,
    md_order: Vec<MetadataId>,
}

impl<'a> Printer<'a> {
    fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            slots: HashMap::new(),
            labels: HashMap::new(),
            md_numbers: HashMap::new(),
            md_order: Vec::new(),
        }
    }

    /// Number unnamed arguments, blocks and instruction results in order
    fn number(&mut self, function: FunctionId) {
        self.slots.clear();
        self.labels.clear();
        let ctx = self.ctx;
        let mut next = 0usize;
        let mut slot = |name: Option<&str>| match name {
            Some(name) => name.to_string(),
            None => {
                next += 1;
                (next - 1).to_string()
            }
        };
        for arg in ctx.function_args(function) {
            self.slots.insert(*arg, slot(ctx.value_name(*arg)));
        }
        for block in ctx.function_blocks(function) {
            self.labels.insert(*block, slot(ctx.block_name(*block)));
            for inst in ctx.block_instructions(*block) {
                if ctx.type_kind(ctx.type_of(*inst)).is_void() {
                    continue;
                }
                self.slots.insert(*inst, slot(ctx.value_name(*inst)));
            }
        }
    }

    fn function(&mut self, function: FunctionId) -> String {
        self.number(function);
        let ctx = self.ctx;
        let f = ctx.function(function);
        let ret = ctx.type_name(ctx.return_type(function));

        let mut params: Vec<String> = if f.is_declaration() {
            ctx.param_types(function)
                .iter()
                .map(|ty| ctx.type_name(*ty))
                .collect()
        } else {
            f.args.iter().map(|arg| self.typed(*arg)).collect()
        };
        if ctx.is_vararg(function) {
            params.push("...".to_string());
        }

        let keyword = if f.is_declaration() { "declare" } else { "define" };
        let mut out = format!(
            "{} {}{} @{}({})",
            keyword,
            f.linkage.keyword(),
            ret,
            f.name,
            params.join(", ")
        );
        out.push_str(&self.attachments(f.value));

        if f.is_declaration() {
            out.push('\n');
            return out;
        }

        out.push_str(" {\n");
        for (i, block) in f.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "{}:", self.labels[block]);
            for inst in ctx.block_instructions(*block) {
                let line = self.instruction(*inst);
                let meta = self.attachments(*inst);
                let _ = writeln!(out, "  {}{}", line, meta);
            }
        }
        out.push_str("}\n");
        out
    }

    fn name(&self, value: ValueId) -> String {
        let ctx = self.ctx;
        let data = ctx.value(value);
        match &data.kind {
            ValueKind::Constant(ConstantKind::Int(raw)) => {
                if ctx.type_kind(data.ty).int_bits() == Some(1) {
                    String::from(if *raw == 0 { "false" } else { "true" })
                } else {
                    ctx.const_int_signed(value)
                        .map_or_else(|| raw.to_string(), |v| v.to_string())
                }
            }
            ValueKind::Constant(ConstantKind::Float(bits)) => format!("{:?}", f64::from_bits(*bits)),
            ValueKind::Constant(ConstantKind::Null) => "null".to_string(),
            ValueKind::Constant(ConstantKind::Undef) => "undef".to_string(),
            ValueKind::Function(f) => format!("@{}", ctx.function_name(*f)),
            ValueKind::Argument { .. } | ValueKind::Instruction(_) => match self.slots.get(&value) {
                Some(slot) => format!("%{}", slot),
                None => match &data.name {
                    Some(name) => format!("%{}", name),
                    None => format!("%v{}", value.index()),
                },
            },
        }
    }

    fn typed(&self, value: ValueId) -> String {
        format!(
            "{} {}",
            self.ctx.type_name(self.ctx.type_of(value)),
            self.name(value)
        )
    }

    fn label(&self, block: BlockId) -> String {
        match self.labels.get(&block) {
            Some(label) => format!("%{}", label),
            None => format!("%{}", self.ctx.block_label(block)),
        }
    }

    fn instruction(&self, value: ValueId) -> String {
        let ctx = self.ctx;
        let Some(inst) = ctx.instruction(value) else {
            return self.typed(value);
        };
        let ty = ctx.type_of(value);
        let body = match &inst.kind {
            InstKind::Alloca { allocated } => format!("alloca {}", ctx.type_name(*allocated)),
            InstKind::Load { ptr } => format!("load {}, {}", ctx.type_name(ty), self.typed(*ptr)),
            InstKind::Store { value, ptr } => {
                format!("store {}, {}", self.typed(*value), self.typed(*ptr))
            }
            InstKind::Binary { op, lhs, rhs } => {
                format!("{} {}, {}", op, self.typed(*lhs), self.name(*rhs))
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                format!("icmp {} {}, {}", pred, self.typed(*lhs), self.name(*rhs))
            }
            InstKind::FCmp { pred, lhs, rhs } => {
                format!("fcmp {} {}, {}", pred, self.typed(*lhs), self.name(*rhs))
            }
            InstKind::Cast { op, value } => {
                format!("{} {} to {}", op, self.typed(*value), ctx.type_name(ty))
            }
            InstKind::Phi { incoming } => {
                let edges: Vec<String> = incoming
                    .iter()
                    .map(|(v, bb)| format!("[ {}, {} ]", self.name(*v), self.label(*bb)))
                    .collect();
                format!("phi {} {}", ctx.type_name(ty), edges.join(", "))
            }
            InstKind::Br { dest } => format!("br label {}", self.label(*dest)),
            InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            } => format!(
                "br {}, label {}, label {}",
                self.typed(*cond),
                self.label(*then_dest),
                self.label(*else_dest)
            ),
            InstKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| self.typed(*a)).collect();
                format!(
                    "call {} @{}({})",
                    ctx.type_name(ty),
                    ctx.function_name(*callee),
                    args.join(", ")
                )
            }
            InstKind::Ret { value: Some(v) } => format!("ret {}", self.typed(*v)),
            InstKind::Ret { value: None } => "ret void".to_string(),
        };
        if ctx.type_kind(ty).is_void() {
            body
        } else {
            format!("{} = {}", self.name(value), body)
        }
    }

    fn md_number(&mut self, id: MetadataId) -> usize {
        if let Some(n) = self.md_numbers.get(&id) {
            return *n;
        }
        let n = self.md_order.len();
        self.md_numbers.insert(id, n);
        self.md_order.push(id);
        n
    }

    fn attachments(&mut self, value: ValueId) -> String {
        let ctx = self.ctx;
        let mut out = String::new();
        for (kind, node) in ctx.attachments(value) {
            let n = self.md_number(*node);
            let _ = write!(out, ", !{} !{}", kind, n);
        }
        out
    }

    /// `!N = !{...}` lines for every node referenced so far, including
    /// nodes reached through other nodes
    fn metadata_table(&mut self) -> String {
        let ctx = self.ctx;
        let mut out = String::new();
        let mut i = 0;
        while i < self.md_order.len() {
            let id = self.md_order[i];
            let operands: Vec<String> = ctx
                .md(id)
                .operands
                .iter()
                .map(|op| match op {
                    MdOperand::String(s) => format!("!\"{}\"", s),
                    MdOperand::Node(n) => format!("!{}", self.md_number(*n)),
                    MdOperand::Value(v) => self.typed(*v),
                })
                .collect();
            if i == 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "!{} = !{{{}}}", i, operands.join(", "));
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IrBuilder;
    use crate::inst::BinaryOp;
    use crate::module::Linkage;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_module() {
        let mut ctx = Context::new();
        let m = ctx.create_module("demo");
        let i8 = ctx.int_type(8);
        let i8p = ctx.pointer_type(i8);
        let i32 = ctx.int_type(32);
        let printf_ty = ctx.function_type(i32, vec![i8p], true);
        ctx.add_function(m, "printf", printf_ty, Linkage::External).unwrap();
        let sum_ty = ctx.function_type(i8, vec![i8, i8], false);
        let sum = ctx.add_function(m, "sum", sum_ty, Linkage::External).unwrap();
        let args = ctx.function_args(sum).to_vec();
        let entry = ctx.append_block(sum, Some("entry"));

        let mut b = IrBuilder::new(&mut ctx);
        b.position_at_end(entry);
        let slot = b.alloca(i8, Some("a")).unwrap();
        b.store(args[0], slot).unwrap();
        let x = b.load(i8, slot).unwrap();
        let r = b.binary(BinaryOp::Add, x, args[1]).unwrap();
        b.ret(r).unwrap();

        let tag = ctx.md_string("lart.abstract");
        ctx.set_metadata(r, "sc.meta", tag).unwrap();

        let expected = "\
; ModuleID = 'demo'

declare i32 @printf(i8*, ...)

define i8 @sum(i8 %0, i8 %1) {
entry:
  %a = alloca i8
  store i8 %0, i8* %a
  %2 = load i8, i8* %a
  %3 = add i8 %2, %1, !sc.meta !0
  ret i8 %3
}

!0 = !{!\"lart.abstract\"}
";
        assert_eq!(print_module(&ctx, m), expected);
        assert_eq!(print_instruction(&ctx, r), "%3 = add i8 %2, %1");
        assert_eq!(print_instruction(&ctx, slot), "%a = alloca i8");
    }

    #[test]
    fn test_print_operand() {
        let mut ctx = Context::new();
        let c = ctx.const_int(8, 0xff);
        let t = ctx.const_int(1, 1);
        assert_eq!(print_operand(&ctx, c), "i8 -1");
        assert_eq!(print_operand(&ctx, t), "i1 true");
    }
}
