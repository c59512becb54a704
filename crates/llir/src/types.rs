//! Type system for the IR
//!
//! Types are interned in a [`TypeTable`] owned by the
//! [`Context`](crate::Context): two structurally equal types always share
//! one [`TypeId`], so type equality is id equality.

use std::collections::HashMap;

/// Interned type handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Get the index as `usize` (for indexing into `Vec`s)
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Floating point formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    Half,
    Single,
    Double,
}

impl FloatKind {
    pub fn bits(self) -> u32 {
        match self {
            FloatKind::Half => 16,
            FloatKind::Single => 32,
            FloatKind::Double => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatKind::Half => "half",
            FloatKind::Single => "float",
            FloatKind::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Void type (no value)
    Void,

    /// Integer type of arbitrary width
    Int { bits: u32 },

    /// Floating point
    Float(FloatKind),

    /// Typed pointer
    Pointer { pointee: TypeId, address_space: u32 },

    /// Array type
    Array { element: TypeId, len: u64 },

    /// Struct type
    Struct { fields: Vec<TypeId>, packed: bool },

    /// Function type
    Function {
        ret: TypeId,
        params: Vec<TypeId>,
        vararg: bool,
    },
}

impl TypeKind {
    pub fn is_void(&self) -> bool {
        matches!(self, TypeKind::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, TypeKind::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeKind::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeKind::Pointer { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeKind::Function { .. })
    }

    /// Types a value can have (everything but void and bare functions)
    pub fn is_first_class(&self) -> bool {
        !matches!(self, TypeKind::Void | TypeKind::Function { .. })
    }

    /// Get bit width for integer types
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            TypeKind::Int { bits } => Some(*bits),
            _ => None,
        }
    }

    /// Get the pointee if this is a pointer
    pub fn pointee(&self) -> Option<TypeId> {
        match self {
            TypeKind::Pointer { pointee, .. } => Some(*pointee),
            _ => None,
        }
    }
}

/// Size and alignment rules of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLayout {
    pub pointer_bits: u32,
    /// Largest alignment any scalar gets, in bytes
    pub max_align: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            pointer_bits: 64,
            max_align: 8,
        }
    }
}

/// Interner for [`TypeKind`]s
#[derive(Debug, Default)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    index: HashMap<TypeKind, TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.index.get(&kind) {
            return id;
        }
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.index.insert(kind, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.index()]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Textual spelling, e.g. `i8*` or `i32 (i8*, ...)`
    pub fn name(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeKind::Void => "void".to_string(),
            TypeKind::Int { bits } => format!("i{}", bits),
            TypeKind::Float(kind) => kind.name().to_string(),
            TypeKind::Pointer { pointee, address_space } => {
                if *address_space == 0 {
                    format!("{}*", self.name(*pointee))
                } else {
                    format!("{} addrspace({})*", self.name(*pointee), address_space)
                }
            }
            TypeKind::Array { element, len } => format!("[{} x {}]", len, self.name(*element)),
            TypeKind::Struct { fields, packed } => {
                let inner = fields
                    .iter()
                    .map(|f| self.name(*f))
                    .collect::<Vec<_>>()
                    .join(", ");
                if *packed {
                    format!("<{{ {} }}>", inner)
                } else {
                    format!("{{ {} }}", inner)
                }
            }
            TypeKind::Function { ret, params, vararg } => {
                let mut parts: Vec<String> = params.iter().map(|p| self.name(*p)).collect();
                if *vararg {
                    parts.push("...".to_string());
                }
                format!("{} ({})", self.name(*ret), parts.join(", "))
            }
        }
    }

    /// Size in bits under `layout`; `None` for unsized types (void, functions)
    /// and for sizes that do not fit in a `u64`
    pub fn size_in_bits(&self, id: TypeId, layout: &DataLayout) -> Option<u64> {
        match self.get(id) {
            TypeKind::Void | TypeKind::Function { .. } => None,
            TypeKind::Int { bits } => Some(u64::from(*bits)),
            TypeKind::Float(kind) => Some(u64::from(kind.bits())),
            TypeKind::Pointer { .. } => Some(u64::from(layout.pointer_bits)),
            TypeKind::Array { element, len } => {
                self.alloc_size(*element, layout)?.checked_mul(8)?.checked_mul(*len)
            }
            TypeKind::Struct { fields, packed } => {
                let mut offset = 0u64;
                let mut align = 1u64;
                for field in fields {
                    let size = self.alloc_size(*field, layout)?;
                    if !*packed {
                        let a = self.abi_align(*field, layout);
                        offset = offset.div_ceil(a).checked_mul(a)?;
                        align = align.max(a);
                    }
                    offset = offset.checked_add(size)?;
                }
                offset.div_ceil(align).checked_mul(align)?.checked_mul(8)
            }
        }
    }

    /// Bytes a value of this type occupies in memory, padding included
    pub fn alloc_size(&self, id: TypeId, layout: &DataLayout) -> Option<u64> {
        let bytes = self.size_in_bits(id, layout)?.div_ceil(8);
        let align = self.abi_align(id, layout);
        bytes.div_ceil(align).checked_mul(align)
    }

    pub fn abi_align(&self, id: TypeId, layout: &DataLayout) -> u64 {
        match self.get(id) {
            TypeKind::Array { element, .. } => self.abi_align(*element, layout),
            TypeKind::Struct { fields, packed } => {
                if *packed {
                    1
                } else {
                    fields
                        .iter()
                        .map(|f| self.abi_align(*f, layout))
                        .max()
                        .unwrap_or(1)
                }
            }
            _ => match self.size_in_bits(id, layout) {
                Some(bits) => bits.div_ceil(8).next_power_of_two().clamp(1, layout.max_align),
                None => 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_structural() {
        let mut table = TypeTable::new();
        let a = table.intern(TypeKind::Int { bits: 8 });
        let b = table.intern(TypeKind::Int { bits: 8 });
        let c = table.intern(TypeKind::Int { bits: 16 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_names() {
        let mut table = TypeTable::new();
        let i8 = table.intern(TypeKind::Int { bits: 8 });
        let i32 = table.intern(TypeKind::Int { bits: 32 });
        let p = table.intern(TypeKind::Pointer { pointee: i8, address_space: 0 });
        let arr = table.intern(TypeKind::Array { element: i32, len: 4 });
        let f = table.intern(TypeKind::Function { ret: i32, params: vec![p], vararg: true });
        assert_eq!(table.name(p), "i8*");
        assert_eq!(table.name(arr), "[4 x i32]");
        assert_eq!(table.name(f), "i32 (i8*, ...)");
    }

    #[test]
    fn test_sizes() {
        let layout = DataLayout::default();
        let mut table = TypeTable::new();
        let i1 = table.intern(TypeKind::Int { bits: 1 });
        let i8 = table.intern(TypeKind::Int { bits: 8 });
        let i32 = table.intern(TypeKind::Int { bits: 32 });
        let p = table.intern(TypeKind::Pointer { pointee: i8, address_space: 0 });
        let s = table.intern(TypeKind::Struct { fields: vec![i8, i32], packed: false });
        let packed = table.intern(TypeKind::Struct { fields: vec![i8, i32], packed: true });

        assert_eq!(table.size_in_bits(i1, &layout), Some(1));
        assert_eq!(table.alloc_size(i1, &layout), Some(1));
        assert_eq!(table.size_in_bits(p, &layout), Some(64));
        assert_eq!(table.alloc_size(s, &layout), Some(8));
        assert_eq!(table.alloc_size(packed, &layout), Some(5));
    }

    #[test]
    fn test_oversized_aggregates_have_no_size() {
        let layout = DataLayout::default();
        let mut table = TypeTable::new();
        let i64 = table.intern(TypeKind::Int { bits: 64 });
        let huge = table.intern(TypeKind::Array { element: i64, len: u64::MAX / 4 });
        let nested = table.intern(TypeKind::Struct { fields: vec![huge, huge], packed: false });

        assert_eq!(table.size_in_bits(huge, &layout), None);
        assert_eq!(table.alloc_size(huge, &layout), None);
        assert_eq!(table.alloc_size(nested, &layout), None);
    }
}
