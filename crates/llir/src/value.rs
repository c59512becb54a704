//! Values: constants, arguments, functions and instruction results

use crate::inst::Instruction;
use crate::module::FunctionId;
use crate::types::TypeId;

/// Handle to a value in the [`Context`](crate::Context) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Constant payloads. Integers are stored zero-extended and masked to the
/// bit width of their type; floats keep their IEEE bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Int(u128),
    Float(u64),
    Null,
    Undef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Constant(ConstantKind),
    Argument { function: FunctionId, index: u32 },
    Function(FunctionId),
    Instruction(Instruction),
}

/// Broad classification of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    Constant,
    Argument,
    Function,
    Instruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueData {
    pub ty: TypeId,
    pub name: Option<String>,
    pub kind: ValueKind,
}

impl ValueData {
    pub fn class(&self) -> ValueClass {
        match self.kind {
            ValueKind::Constant(_) => ValueClass::Constant,
            ValueKind::Argument { .. } => ValueClass::Argument,
            ValueKind::Function(_) => ValueClass::Function,
            ValueKind::Instruction(_) => ValueClass::Instruction,
        }
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match &self.kind {
            ValueKind::Instruction(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<ConstantKind> {
        match self.kind {
            ValueKind::Constant(c) => Some(c),
            _ => None,
        }
    }
}

/// Sign-extend the low `bits` bits of `raw`
pub(crate) fn sign_extend(raw: u128, bits: u32) -> i128 {
    if bits == 0 || bits >= 128 {
        return raw as i128;
    }
    let shift = 128 - bits;
    ((raw << shift) as i128) >> shift
}

/// Keep only the low `bits` bits of `raw`
pub(crate) fn mask(raw: u128, bits: u32) -> u128 {
    if bits >= 128 { raw } else { raw & ((1u128 << bits) - 1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xff, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(1, 1), -1);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(0x1ff, 8), 0xff);
        assert_eq!(mask(u128::MAX, 128), u128::MAX);
    }
}
