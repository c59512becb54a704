//! Metadata nodes
//!
//! Metadata lives beside the value graph: nodes hold strings, other nodes
//! or value references, and are attached to instructions and functions
//! under a kind string.

use crate::value::ValueId;

/// Handle to a metadata node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataId(pub(crate) u32);

impl MetadataId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MdOperand {
    String(String),
    Node(MetadataId),
    Value(ValueId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdNode {
    pub operands: Vec<MdOperand>,
}

impl MdNode {
    pub fn new(operands: Vec<MdOperand>) -> Self {
        Self { operands }
    }

    /// The string of a single-string node
    pub fn as_string(&self) -> Option<&str> {
        match self.operands.as_slice() {
            [MdOperand::String(s)] => Some(s.as_str()),
            _ => None,
        }
    }
}
