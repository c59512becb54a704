//! IR instruction definitions

use crate::module::{BlockId, FunctionId};
use crate::types::TypeId;
use crate::value::ValueId;

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 18] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::UDiv,
        BinaryOp::SDiv,
        BinaryOp::URem,
        BinaryOp::SRem,
        BinaryOp::Shl,
        BinaryOp::LShr,
        BinaryOp::AShr,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
        BinaryOp::FAdd,
        BinaryOp::FSub,
        BinaryOp::FMul,
        BinaryOp::FDiv,
        BinaryOp::FRem,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::UDiv => "udiv",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::URem => "urem",
            BinaryOp::SRem => "srem",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::AShr => "ashr",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::FRem => "frem",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == name)
    }

    /// Operates on floating point operands
    pub fn is_float(self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv | BinaryOp::FRem
        )
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Mul
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::Xor
                | BinaryOp::FAdd
                | BinaryOp::FMul
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Comparison predicates, float and integer in one set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    // ordered float
    FOeq,
    FOgt,
    FOge,
    FOlt,
    FOle,
    FOne,
    FOrd,
    FUno,
    // unordered float
    FUeq,
    FUgt,
    FUge,
    FUlt,
    FUle,
    FUne,
    // integer
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl Predicate {
    pub const ALL: [Predicate; 24] = [
        Predicate::FOeq,
        Predicate::FOgt,
        Predicate::FOge,
        Predicate::FOlt,
        Predicate::FOle,
        Predicate::FOne,
        Predicate::FOrd,
        Predicate::FUno,
        Predicate::FUeq,
        Predicate::FUgt,
        Predicate::FUge,
        Predicate::FUlt,
        Predicate::FUle,
        Predicate::FUne,
        Predicate::Eq,
        Predicate::Ne,
        Predicate::Ugt,
        Predicate::Uge,
        Predicate::Ult,
        Predicate::Ule,
        Predicate::Sgt,
        Predicate::Sge,
        Predicate::Slt,
        Predicate::Sle,
    ];

    pub fn is_float(self) -> bool {
        matches!(
            self,
            Predicate::FOeq
                | Predicate::FOgt
                | Predicate::FOge
                | Predicate::FOlt
                | Predicate::FOle
                | Predicate::FOne
                | Predicate::FOrd
                | Predicate::FUno
                | Predicate::FUeq
                | Predicate::FUgt
                | Predicate::FUge
                | Predicate::FUlt
                | Predicate::FUle
                | Predicate::FUne
        )
    }

    /// Unique short name; unordered float predicates carry an `f` prefix
    /// so they do not collide with the unsigned integer ones
    pub fn name(self) -> &'static str {
        match self {
            Predicate::FOeq => "oeq",
            Predicate::FOgt => "ogt",
            Predicate::FOge => "oge",
            Predicate::FOlt => "olt",
            Predicate::FOle => "ole",
            Predicate::FOne => "one",
            Predicate::FOrd => "ord",
            Predicate::FUno => "uno",
            Predicate::FUeq => "fueq",
            Predicate::FUgt => "fugt",
            Predicate::FUge => "fuge",
            Predicate::FUlt => "fult",
            Predicate::FUle => "fule",
            Predicate::FUne => "fune",
            Predicate::Eq => "eq",
            Predicate::Ne => "ne",
            Predicate::Ugt => "ugt",
            Predicate::Uge => "uge",
            Predicate::Ult => "ult",
            Predicate::Ule => "ule",
            Predicate::Sgt => "sgt",
            Predicate::Sge => "sge",
            Predicate::Slt => "slt",
            Predicate::Sle => "sle",
        }
    }

    /// Spelling inside an `icmp`/`fcmp` instruction
    pub fn ir_name(self) -> &'static str {
        match self {
            Predicate::FUeq => "ueq",
            Predicate::FUgt => "ugt",
            Predicate::FUge => "uge",
            Predicate::FUlt => "ult",
            Predicate::FUle => "ule",
            Predicate::FUne => "une",
            other => other.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ir_name())
    }
}

/// Conversion instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    BitCast,
    ZExt,
    Trunc,
    FpToUi,
    PtrToInt,
    IntToPtr,
}

impl CastOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CastOp::BitCast => "bitcast",
            CastOp::ZExt => "zext",
            CastOp::Trunc => "trunc",
            CastOp::FpToUi => "fptoui",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::IntToPtr => "inttoptr",
        }
    }
}

impl std::fmt::Display for CastOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Stack slot for one value of `allocated`
    Alloca { allocated: TypeId },

    /// dst = *ptr
    Load { ptr: ValueId },

    /// *ptr = value
    Store { value: ValueId, ptr: ValueId },

    /// dst = lhs op rhs
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
    },

    ICmp {
        pred: Predicate,
        lhs: ValueId,
        rhs: ValueId,
    },

    FCmp {
        pred: Predicate,
        lhs: ValueId,
        rhs: ValueId,
    },

    /// dst = op value to <result type>
    Cast { op: CastOp, value: ValueId },

    Phi { incoming: Vec<(ValueId, BlockId)> },

    /// Unconditional branch
    Br { dest: BlockId },

    /// Conditional branch on an `i1`
    CondBr {
        cond: ValueId,
        then_dest: BlockId,
        else_dest: BlockId,
    },

    /// Direct call
    Call { callee: FunctionId, args: Vec<ValueId> },

    /// Return from function
    Ret { value: Option<ValueId> },
}

/// An instruction placed in a basic block
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub kind: InstKind,
    pub parent: BlockId,
}

impl Instruction {
    /// Opcode name as printed
    pub fn opcode(&self) -> &'static str {
        match &self.kind {
            InstKind::Alloca { .. } => "alloca",
            InstKind::Load { .. } => "load",
            InstKind::Store { .. } => "store",
            InstKind::Binary { op, .. } => op.mnemonic(),
            InstKind::ICmp { .. } => "icmp",
            InstKind::FCmp { .. } => "fcmp",
            InstKind::Cast { op, .. } => op.mnemonic(),
            InstKind::Phi { .. } => "phi",
            InstKind::Br { .. } | InstKind::CondBr { .. } => "br",
            InstKind::Call { .. } => "call",
            InstKind::Ret { .. } => "ret",
        }
    }

    /// Value operands in positional order
    pub fn operands(&self) -> Vec<ValueId> {
        match &self.kind {
            InstKind::Alloca { .. } | InstKind::Br { .. } => Vec::new(),
            InstKind::Load { ptr } => vec![*ptr],
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Binary { lhs, rhs, .. }
            | InstKind::ICmp { lhs, rhs, .. }
            | InstKind::FCmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstKind::Cast { value, .. } => vec![*value],
            InstKind::Phi { incoming } => incoming.iter().map(|(v, _)| *v).collect(),
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Ret { value } => value.iter().copied().collect(),
        }
    }

    /// Successor blocks of a terminator (empty for everything else)
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.kind {
            InstKind::Br { dest } => vec![*dest],
            InstKind::CondBr { then_dest, else_dest, .. } => vec![*then_dest, *else_dest],
            _ => Vec::new(),
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            InstKind::Br { .. } | InstKind::CondBr { .. } | InstKind::Ret { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_names_are_unique() {
        for a in Predicate::ALL {
            assert_eq!(Predicate::from_name(a.name()), Some(a));
        }
        assert_eq!(Predicate::FUgt.ir_name(), "ugt");
        assert!(Predicate::FUgt.is_float());
        assert!(!Predicate::Ugt.is_float());
    }

    #[test]
    fn test_binary_mnemonics() {
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert!(BinaryOp::FRem.is_float());
        assert!(!BinaryOp::Sub.is_commutative());
    }

    #[test]
    fn test_terminators() {
        let br = Instruction {
            kind: InstKind::CondBr {
                cond: ValueId(0),
                then_dest: BlockId(1),
                else_dest: BlockId(2),
            },
            parent: BlockId(0),
        };
        assert!(br.is_terminator());
        assert_eq!(br.successors(), vec![BlockId(1), BlockId(2)]);
        assert_eq!(br.operands(), vec![ValueId(0)]);
        assert_eq!(br.opcode(), "br");
    }
}
