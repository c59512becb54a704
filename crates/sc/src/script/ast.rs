//! Parsed script statements

use llir::{BinaryOp, Predicate};

use crate::builder::CastKind;
use crate::common::Span;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub span: Span,
}

/// A type spelled as a base name followed by `*`s, e.g. `i8**`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub base: String,
    pub pointers: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperandExpr {
    /// `_`
    Stack,
    /// `%name`
    Var(String, Span),
    /// `$N`
    Arg(u32),
    /// `10_i8`
    Int { value: i128, bits: u32 },
    /// `1.5_f64`
    Float { value: f64, bits: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTarget {
    Named(String, Span),
    /// `+N`
    Next(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Module(String),
    Function {
        name: String,
        ret: TypeExpr,
        params: Vec<TypeExpr>,
        vararg: bool,
    },
    Use(String),
    Block(String),
    SetBlock(String),
    Alloc {
        ty: TypeExpr,
        name: Option<String>,
    },
    Load {
        ty: TypeExpr,
        from: OperandExpr,
    },
    Store {
        value: OperandExpr,
        dest: OperandExpr,
    },
    Binary {
        op: BinaryOp,
        lhs: OperandExpr,
        rhs: OperandExpr,
    },
    Compare {
        pred: Predicate,
        lhs: OperandExpr,
        rhs: OperandExpr,
    },
    Cast {
        kind: CastKind,
        value: OperandExpr,
        to: TypeExpr,
    },
    Phi(Vec<(OperandExpr, BlockTarget)>),
    CondBr {
        cond: OperandExpr,
        then_block: BlockTarget,
        else_block: BlockTarget,
    },
    Br(BlockTarget),
    Call {
        callee: String,
        args: Vec<OperandExpr>,
    },
    /// `ret` alone returns void
    Ret(Option<OperandExpr>),
    Push(OperandExpr),
    Pop(usize),
    KeepStack,
    Inspect,
    Last,
}
