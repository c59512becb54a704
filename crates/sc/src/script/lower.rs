//! Lowering of parsed statements to builder actions
//!
//! Statements are lowered one at a time against the live builder, so a
//! statement can refer to functions created by the ones before it. Names
//! of modules, blocks and variables are interned; references to names no
//! earlier statement declared are reported here with their source span.

use std::collections::{HashMap, HashSet};

use llir::{FloatKind, ModuleId, TypeId};
use string_interner::{DefaultStringInterner, DefaultSymbol};

use super::ast::{BlockTarget, OperandExpr, Statement, StmtKind, TypeExpr};
use crate::builder::{Action, BlockRef, Callee, Operand, PhiEdge, StackBuilder};
use crate::common::{CompileError, CompileResult, Span};

/// One executable step of a script
#[derive(Debug)]
pub enum Step {
    Action(Action),
    /// Take the final value off the stack and report it
    Last,
}

#[derive(Default)]
pub struct Lowerer {
    symbols: DefaultStringInterner,
    modules: HashMap<DefaultSymbol, ModuleId>,
    module_order: Vec<ModuleId>,
    blocks: HashSet<DefaultSymbol>,
    vars: HashSet<DefaultSymbol>,
    /// Span of the statement being lowered
    current: Span,
}

impl Lowerer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules in order of first mention
    pub fn modules(&self) -> &[ModuleId] {
        &self.module_order
    }

    pub fn lower(&mut self, stmt: &Statement, sb: &mut StackBuilder<'_>) -> CompileResult<Step> {
        let span = stmt.span;
        self.current = span;
        let action = match &stmt.kind {
            StmtKind::Module(name) => {
                let symbol = self.symbols.get_or_intern(name);
                let module = match self.modules.get(&symbol) {
                    Some(module) => *module,
                    None => {
                        let module = sb.context_mut().create_module(name.as_str());
                        self.modules.insert(symbol, module);
                        self.module_order.push(module);
                        module
                    }
                };
                Action::Module(module)
            }
            StmtKind::Function {
                name,
                ret,
                params,
                vararg,
            } => {
                let ret = self.lower_type(ret, sb)?;
                let params = params
                    .iter()
                    .map(|p| self.lower_type(p, sb))
                    .collect::<CompileResult<Vec<_>>>()?;
                Action::create_function(name.as_str(), ret, params, *vararg)
            }
            StmtKind::Use(name) => {
                let module = sb
                    .module()
                    .ok_or_else(|| CompileError::lowering("no active module", span))?;
                let function = sb.context().get_function(module, name).ok_or_else(|| {
                    CompileError::lowering(format!("unknown function @{}", name), span)
                })?;
                Action::UseFunction(function)
            }
            StmtKind::Block(name) => {
                self.blocks.insert(self.symbols.get_or_intern(name));
                Action::create_block(name.as_str())
            }
            StmtKind::SetBlock(name) => {
                self.check_block(name, span)?;
                Action::set_block(name.as_str())
            }
            StmtKind::Alloc { ty, name } => {
                let ty = self.lower_type(ty, sb)?;
                match name {
                    Some(name) => {
                        self.vars.insert(self.symbols.get_or_intern(name));
                        Action::alloc_named(ty, name.as_str())
                    }
                    None => Action::alloc(ty),
                }
            }
            StmtKind::Load { ty, from } => {
                let ty = self.lower_type(ty, sb)?;
                Action::load(ty, self.lower_operand(from, sb)?)
            }
            StmtKind::Store { value, dest } => {
                let value = self.lower_operand(value, sb)?;
                Action::store_to(value, self.lower_operand(dest, sb)?)
            }
            StmtKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_operand(lhs, sb)?;
                Action::bin_with(*op, lhs, self.lower_operand(rhs, sb)?)
            }
            StmtKind::Compare { pred, lhs, rhs } => {
                let lhs = self.lower_operand(lhs, sb)?;
                Action::cmp_with(*pred, lhs, self.lower_operand(rhs, sb)?)
            }
            StmtKind::Cast { kind, value, to } => Action::Cast {
                kind: *kind,
                value: self.lower_operand(value, sb)?,
                to: self.lower_type(to, sb)?,
            },
            StmtKind::Phi(edges) => {
                let mut lowered = Vec::with_capacity(edges.len());
                for (value, block) in edges {
                    let value = self.lower_operand(value, sb)?;
                    lowered.push(PhiEdge::new(value, self.lower_target(block)?));
                }
                Action::phi(lowered)
            }
            StmtKind::CondBr {
                cond,
                then_block,
                else_block,
            } => Action::CondBr {
                cond: self.lower_operand(cond, sb)?,
                then_block: self.lower_target(then_block)?,
                else_block: self.lower_target(else_block)?,
            },
            StmtKind::Br(dest) => Action::branch(self.lower_target(dest)?),
            StmtKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|a| self.lower_operand(a, sb))
                    .collect::<CompileResult<Vec<_>>>()?;
                Action::call(Callee::Named(callee.clone()), args)
            }
            StmtKind::Ret(None) => Action::ret_void(),
            StmtKind::Ret(Some(value)) => Action::ret(self.lower_operand(value, sb)?),
            StmtKind::Push(value) => Action::push(self.lower_operand(value, sb)?),
            StmtKind::Pop(count) => Action::Pop(*count),
            StmtKind::KeepStack => Action::KeepStack,
            StmtKind::Inspect => Action::inspect(|b| {
                tracing::info!(
                    depth = b.stack().len(),
                    block = b.current_block_name().unwrap_or("-"),
                    "inspect"
                );
            }),
            StmtKind::Last => return Ok(Step::Last),
        };
        Ok(Step::Action(action))
    }

    fn check_block(&self, name: &str, span: Span) -> CompileResult<()> {
        let known = self
            .symbols
            .get(name)
            .is_some_and(|symbol| self.blocks.contains(&symbol));
        if known {
            Ok(())
        } else {
            Err(CompileError::lowering(format!("unknown block '{}'", name), span))
        }
    }

    fn lower_target(&self, target: &BlockTarget) -> CompileResult<BlockRef> {
        match target {
            BlockTarget::Named(name, span) => {
                self.check_block(name, *span)?;
                Ok(BlockRef::Named(name.clone()))
            }
            BlockTarget::Next(offset) => Ok(BlockRef::Next(*offset)),
        }
    }

    fn lower_operand(&self, operand: &OperandExpr, sb: &mut StackBuilder<'_>) -> CompileResult<Operand> {
        match operand {
            OperandExpr::Stack => Ok(Operand::Stack),
            OperandExpr::Var(name, span) => {
                let known = self
                    .symbols
                    .get(name)
                    .is_some_and(|symbol| self.vars.contains(&symbol));
                if !known {
                    return Err(CompileError::lowering(
                        format!("unknown variable %{}", name),
                        *span,
                    ));
                }
                Ok(Operand::Var(name.clone()))
            }
            OperandExpr::Arg(index) => Ok(Operand::Arg(*index)),
            OperandExpr::Int { value, bits } => {
                Ok(Operand::Value(sb.context_mut().const_int(*bits, *value as u128)))
            }
            OperandExpr::Float { value, bits } => {
                let kind = match bits {
                    16 => FloatKind::Half,
                    32 => FloatKind::Single,
                    _ => FloatKind::Double,
                };
                let ctx = sb.context_mut();
                let ty = ctx.float_type(kind);
                ctx.const_float(ty, *value)
                    .map(Operand::Value)
                    .map_err(|e| CompileError::lowering(e.to_string(), self.current))
            }
        }
    }

    fn lower_type(&self, ty: &TypeExpr, sb: &mut StackBuilder<'_>) -> CompileResult<TypeId> {
        let ctx = sb.context_mut();
        let base = match ty.base.as_str() {
            "void" if ty.pointers == 0 => ctx.void_type(),
            "void" => {
                return Err(CompileError::lowering("pointer to void", ty.span));
            }
            "half" => ctx.float_type(FloatKind::Half),
            "float" | "f32" => ctx.float_type(FloatKind::Single),
            "double" | "f64" => ctx.float_type(FloatKind::Double),
            name => match int_width(name) {
                Some(bits) => ctx.int_type(bits),
                None => {
                    return Err(CompileError::lowering(
                        format!("unknown type '{}'", name),
                        ty.span,
                    ));
                }
            },
        };
        Ok((0..ty.pointers).fold(base, |pointee, _| ctx.pointer_type(pointee)))
    }
}

/// Width of an `iN` type name, for N in 1..=128
fn int_width(name: &str) -> Option<u32> {
    let bits = name.strip_prefix('i')?.parse::<u32>().ok()?;
    (1..=128).contains(&bits).then_some(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Parser;
    use llir::Context;

    fn lower_all(source: &str, ctx: &mut Context) -> CompileResult<Vec<Step>> {
        let script = Parser::new(source).parse_script()?;
        let mut lowerer = Lowerer::new();
        let mut sb = StackBuilder::new(ctx);
        let mut steps = Vec::new();
        for stmt in &script.statements {
            // structural statements run right away so later lookups succeed
            match lowerer.lower(stmt, &mut sb)? {
                Step::Action(action @ (Action::Module(_) | Action::CreateFunction(_))) => {
                    sb.execute(action).unwrap();
                }
                step => steps.push(step),
            }
        }
        Ok(steps)
    }

    #[test]
    fn test_types() {
        let mut ctx = Context::new();
        let steps = lower_all("alloc i32** %p\nload f64 _\n", &mut ctx).unwrap();
        let i32 = ctx.int_type(32);
        let p = ctx.pointer_type(i32);
        let pp = ctx.pointer_type(p);
        let f64 = ctx.float_type(FloatKind::Double);
        assert!(matches!(&steps[0], Step::Action(Action::Alloc { ty, name: Some(n) }) if *ty == pp && n == "p"));
        assert!(matches!(&steps[1], Step::Action(Action::Load { ty, from: Operand::Stack }) if *ty == f64));
        assert_eq!(int_width("i0"), None);
        assert_eq!(int_width("i128"), Some(128));
        assert_eq!(int_width("int"), None);
    }

    #[test]
    fn test_literals_become_constants() {
        let mut ctx = Context::new();
        let steps = lower_all("push -1_i8\n", &mut ctx).unwrap();
        let Step::Action(Action::Push(Operand::Value(v))) = &steps[0] else {
            panic!("unexpected {:?}", steps[0]);
        };
        assert_eq!(ctx.const_int_signed(*v), Some(-1));
    }

    #[test]
    fn test_unknown_names_carry_spans() {
        let mut ctx = Context::new();
        let err = lower_all("alloc i8 %a\nload i8 %b\n", &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::Lowering { .. }));
        assert_eq!(err.span(), Some(Span::new(20, 22)));

        let err = lower_all("block entry\nbr exit\n", &mut ctx).unwrap_err();
        assert!(err.to_string().contains("unknown block 'exit'"));

        let err = lower_all("alloc u8\n", &mut ctx).unwrap_err();
        assert!(err.to_string().contains("unknown type 'u8'"));
    }

    #[test]
    fn test_modules_are_reused_by_name() {
        let mut ctx = Context::new();
        let script = Parser::new("module a\nmodule b\nmodule a\n").parse_script().unwrap();
        let mut lowerer = Lowerer::new();
        let mut sb = StackBuilder::new(&mut ctx);
        let ids: Vec<_> = script
            .statements
            .iter()
            .map(|s| match lowerer.lower(s, &mut sb).unwrap() {
                Step::Action(Action::Module(m)) => m,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(lowerer.modules(), &[ids[0], ids[1]]);
    }

    #[test]
    fn test_use_requires_existing_function() {
        let mut ctx = Context::new();
        let err = lower_all("module m\nuse @missing\n", &mut ctx).unwrap_err();
        assert!(err.to_string().contains("unknown function @missing"));

        let steps = lower_all("module m\nfunction @f()\nuse @f\n", &mut ctx).unwrap();
        assert!(matches!(steps[0], Step::Action(Action::UseFunction(_))));
    }
}
