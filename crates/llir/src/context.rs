//! The IR arena
//!
//! A [`Context`] owns every type, value, block, function, module and
//! metadata node. Everything else in the crate refers to these through
//! copyable ids, so there is no shared ownership and no global state: the
//! caller creates a context and passes it to whatever needs to build IR.

use std::collections::HashMap;

use crate::error::{IrError, IrResult};
use crate::inst::Instruction;
use crate::metadata::{MdNode, MdOperand, MetadataId};
use crate::module::{BasicBlock, BlockId, Function, FunctionId, Linkage, Module, ModuleId};
use crate::types::{DataLayout, FloatKind, TypeId, TypeKind, TypeTable};
use crate::value::{ConstantKind, ValueClass, ValueData, ValueId, ValueKind, mask, sign_extend};

#[derive(Debug, Default)]
pub struct Context {
    types: TypeTable,
    layout: DataLayout,
    values: Vec<ValueData>,
    constants: HashMap<(TypeId, ConstantKind), ValueId>,
    blocks: Vec<BasicBlock>,
    functions: Vec<Function>,
    modules: Vec<Module>,
    metadata: Vec<MdNode>,
    attachments: HashMap<ValueId, Vec<(String, MetadataId)>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: DataLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn data_layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    pub fn void_type(&mut self) -> TypeId {
        self.types.intern(TypeKind::Void)
    }

    pub fn int_type(&mut self, bits: u32) -> TypeId {
        self.types.intern(TypeKind::Int { bits })
    }

    pub fn float_type(&mut self, kind: FloatKind) -> TypeId {
        self.types.intern(TypeKind::Float(kind))
    }

    pub fn pointer_type(&mut self, pointee: TypeId) -> TypeId {
        self.pointer_type_in(pointee, 0)
    }

    pub fn pointer_type_in(&mut self, pointee: TypeId, address_space: u32) -> TypeId {
        self.types.intern(TypeKind::Pointer {
            pointee,
            address_space,
        })
    }

    pub fn array_type(&mut self, element: TypeId, len: u64) -> TypeId {
        self.types.intern(TypeKind::Array { element, len })
    }

    pub fn struct_type(&mut self, fields: Vec<TypeId>, packed: bool) -> TypeId {
        self.types.intern(TypeKind::Struct { fields, packed })
    }

    pub fn function_type(&mut self, ret: TypeId, params: Vec<TypeId>, vararg: bool) -> TypeId {
        self.types.intern(TypeKind::Function {
            ret,
            params,
            vararg,
        })
    }

    pub fn type_kind(&self, ty: TypeId) -> &TypeKind {
        self.types.get(ty)
    }

    pub fn type_name(&self, ty: TypeId) -> String {
        self.types.name(ty)
    }

    pub fn size_in_bits(&self, ty: TypeId) -> Option<u64> {
        self.types.size_in_bits(ty, &self.layout)
    }

    pub fn alloc_size(&self, ty: TypeId) -> Option<u64> {
        self.types.alloc_size(ty, &self.layout)
    }

    // ------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------

    fn constant(&mut self, ty: TypeId, kind: ConstantKind) -> ValueId {
        if let Some(&id) = self.constants.get(&(ty, kind)) {
            return id;
        }
        let id = self.push_value(ValueData {
            ty,
            name: None,
            kind: ValueKind::Constant(kind),
        });
        self.constants.insert((ty, kind), id);
        id
    }

    /// Integer constant of `bits` width; `value` is truncated to fit
    pub fn const_int(&mut self, bits: u32, value: u128) -> ValueId {
        let ty = self.int_type(bits);
        self.constant(ty, ConstantKind::Int(mask(value, bits)))
    }

    /// Integer constant of an existing integer type
    pub fn const_int_of(&mut self, ty: TypeId, value: u128) -> IrResult<ValueId> {
        match self.types.get(ty).int_bits() {
            Some(bits) => Ok(self.constant(ty, ConstantKind::Int(mask(value, bits)))),
            None => Err(IrError::mismatch("integer type", self.type_name(ty))),
        }
    }

    pub fn const_float(&mut self, ty: TypeId, value: f64) -> IrResult<ValueId> {
        let stored = match self.types.get(ty) {
            TypeKind::Float(FloatKind::Single) => f64::from(value as f32),
            TypeKind::Float(_) => value,
            _ => return Err(IrError::mismatch("floating point type", self.type_name(ty))),
        };
        Ok(self.constant(ty, ConstantKind::Float(stored.to_bits())))
    }

    pub fn const_null(&mut self, ty: TypeId) -> IrResult<ValueId> {
        if !self.types.get(ty).is_pointer() {
            return Err(IrError::mismatch("pointer type", self.type_name(ty)));
        }
        Ok(self.constant(ty, ConstantKind::Null))
    }

    pub fn undef(&mut self, ty: TypeId) -> ValueId {
        self.constant(ty, ConstantKind::Undef)
    }

    /// Zero-extended payload of an integer constant
    pub fn const_int_value(&self, v: ValueId) -> Option<u128> {
        match self.value(v).as_constant()? {
            ConstantKind::Int(raw) => Some(raw),
            _ => None,
        }
    }

    /// Sign-extended payload of an integer constant
    pub fn const_int_signed(&self, v: ValueId) -> Option<i128> {
        let raw = self.const_int_value(v)?;
        let bits = self.types.get(self.type_of(v)).int_bits()?;
        Some(sign_extend(raw, bits))
    }

    pub fn const_float_value(&self, v: ValueId) -> Option<f64> {
        match self.value(v).as_constant()? {
            ConstantKind::Float(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn push_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    pub fn value(&self, v: ValueId) -> &ValueData {
        &self.values[v.index()]
    }

    pub fn type_of(&self, v: ValueId) -> TypeId {
        self.value(v).ty
    }

    pub fn value_class(&self, v: ValueId) -> ValueClass {
        self.value(v).class()
    }

    pub fn value_name(&self, v: ValueId) -> Option<&str> {
        self.value(v).name.as_deref()
    }

    /// Rename an argument or instruction; constants and functions keep
    /// their identity names
    pub fn set_value_name(&mut self, v: ValueId, name: impl Into<String>) {
        let data = &mut self.values[v.index()];
        if matches!(
            data.kind,
            ValueKind::Argument { .. } | ValueKind::Instruction(_)
        ) {
            data.name = Some(name.into());
        }
    }

    pub fn instruction(&self, v: ValueId) -> Option<&Instruction> {
        self.value(v).as_instruction()
    }

    pub fn instruction_parent(&self, v: ValueId) -> Option<BlockId> {
        self.instruction(v).map(|inst| inst.parent)
    }

    pub fn instruction_function(&self, v: ValueId) -> Option<FunctionId> {
        self.block_parent(self.instruction_parent(v)?)
    }

    pub(crate) fn add_instruction(
        &mut self,
        block: BlockId,
        inst: Instruction,
        ty: TypeId,
        name: Option<&str>,
    ) -> ValueId {
        let id = self.push_value(ValueData {
            ty,
            name: name.map(str::to_string),
            kind: ValueKind::Instruction(inst),
        });
        self.blocks[block.index()].insts.push(id);
        id
    }

    // ------------------------------------------------------------------
    // Modules and functions
    // ------------------------------------------------------------------

    pub fn create_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name: name.into(),
            functions: Vec::new(),
        });
        tracing::debug!(module = id.index(), "created module");
        id
    }

    pub fn module(&self, m: ModuleId) -> &Module {
        &self.modules[m.index()]
    }

    pub fn module_functions(&self, m: ModuleId) -> &[FunctionId] {
        &self.module(m).functions
    }

    pub fn get_function(&self, m: ModuleId, name: &str) -> Option<FunctionId> {
        self.module(m)
            .functions
            .iter()
            .copied()
            .find(|f| self.function(*f).name == name)
    }

    /// Declare a function in `module`; it becomes a definition once a block
    /// is appended
    pub fn add_function(
        &mut self,
        module: ModuleId,
        name: impl Into<String>,
        fn_ty: TypeId,
        linkage: Linkage,
    ) -> IrResult<FunctionId> {
        let name = name.into();
        let TypeKind::Function {
            ret,
            params,
            vararg,
        } = self.types.get(fn_ty).clone()
        else {
            return Err(IrError::NotAFunction(self.type_name(fn_ty)));
        };
        if self.get_function(module, &name).is_some() {
            return Err(IrError::DuplicateFunction(name));
        }

        let id = FunctionId(self.functions.len() as u32);
        let ptr_ty = self.pointer_type(fn_ty);
        let value = self.push_value(ValueData {
            ty: ptr_ty,
            name: Some(name.clone()),
            kind: ValueKind::Function(id),
        });
        let args = params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                self.push_value(ValueData {
                    ty: *ty,
                    name: None,
                    kind: ValueKind::Argument {
                        function: id,
                        index: index as u32,
                    },
                })
            })
            .collect();

        tracing::debug!(function = %name, ty = %self.type_name(fn_ty), "added function");
        self.functions.push(Function {
            name,
            ty: fn_ty,
            ret,
            params,
            vararg,
            linkage,
            module,
            value,
            args,
            blocks: Vec::new(),
        });
        self.modules[module.index()].functions.push(id);
        Ok(id)
    }

    pub fn function(&self, f: FunctionId) -> &Function {
        &self.functions[f.index()]
    }

    pub fn function_name(&self, f: FunctionId) -> &str {
        &self.function(f).name
    }

    /// The function's own type (not the pointer type of its value)
    pub fn function_type_of(&self, f: FunctionId) -> TypeId {
        self.function(f).ty
    }

    pub fn return_type(&self, f: FunctionId) -> TypeId {
        self.function(f).ret
    }

    pub fn param_types(&self, f: FunctionId) -> &[TypeId] {
        &self.function(f).params
    }

    pub fn is_vararg(&self, f: FunctionId) -> bool {
        self.function(f).vararg
    }

    pub fn function_value(&self, f: FunctionId) -> ValueId {
        self.function(f).value
    }

    /// The function a value denotes, if it is a function value
    pub fn as_function(&self, v: ValueId) -> Option<FunctionId> {
        match self.value(v).kind {
            ValueKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn function_args(&self, f: FunctionId) -> &[ValueId] {
        &self.function(f).args
    }

    pub fn function_blocks(&self, f: FunctionId) -> &[BlockId] {
        &self.function(f).blocks
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Create a block at the end of `function`
    pub fn append_block(&mut self, function: FunctionId, name: Option<&str>) -> BlockId {
        let id = self.create_block(name);
        self.blocks[id.index()].parent = Some(function);
        self.functions[function.index()].blocks.push(id);
        id
    }

    /// Create a block that belongs to no function yet
    pub fn create_block(&mut self, name: Option<&str>) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock {
            name: name.map(str::to_string),
            parent: None,
            insts: Vec::new(),
        });
        id
    }

    /// Move a detached block to the end of `function`
    pub fn attach_block(&mut self, function: FunctionId, block: BlockId) -> IrResult<()> {
        if self.blocks[block.index()].parent.is_some() {
            return Err(IrError::BlockAttached {
                block: self.block_label(block),
            });
        }
        self.blocks[block.index()].parent = Some(function);
        self.functions[function.index()].blocks.push(block);
        Ok(())
    }

    pub fn block(&self, b: BlockId) -> &BasicBlock {
        &self.blocks[b.index()]
    }

    pub fn block_name(&self, b: BlockId) -> Option<&str> {
        self.block(b).name.as_deref()
    }

    /// Name for diagnostics: the block name or its index
    pub fn block_label(&self, b: BlockId) -> String {
        match self.block_name(b) {
            Some(name) => name.to_string(),
            None => format!("bb{}", b.index()),
        }
    }

    pub fn block_parent(&self, b: BlockId) -> Option<FunctionId> {
        self.block(b).parent
    }

    pub fn block_instructions(&self, b: BlockId) -> &[ValueId] {
        &self.block(b).insts
    }

    pub fn block_terminator(&self, b: BlockId) -> Option<ValueId> {
        let last = *self.block(b).insts.last()?;
        self.instruction(last)
            .filter(|inst| inst.is_terminator())
            .map(|_| last)
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn md_node(&mut self, operands: Vec<MdOperand>) -> MetadataId {
        let id = MetadataId(self.metadata.len() as u32);
        self.metadata.push(MdNode::new(operands));
        id
    }

    /// Node holding a single string
    pub fn md_string(&mut self, s: impl Into<String>) -> MetadataId {
        self.md_node(vec![MdOperand::String(s.into())])
    }

    pub fn md(&self, id: MetadataId) -> &MdNode {
        &self.metadata[id.index()]
    }

    pub fn replace_md_operand(
        &mut self,
        node: MetadataId,
        index: usize,
        operand: MdOperand,
    ) -> IrResult<()> {
        let operands = &mut self.metadata[node.index()].operands;
        let len = operands.len();
        match operands.get_mut(index) {
            Some(slot) => {
                *slot = operand;
                Ok(())
            }
            None => Err(IrError::MetadataIndex { index, len }),
        }
    }

    /// Attach `node` to an instruction or function under `kind`,
    /// replacing any previous attachment of that kind
    pub fn set_metadata(&mut self, v: ValueId, kind: &str, node: MetadataId) -> IrResult<()> {
        if !matches!(
            self.value(v).kind,
            ValueKind::Instruction(_) | ValueKind::Function(_)
        ) {
            return Err(IrError::MetadataTarget);
        }
        let list = self.attachments.entry(v).or_default();
        match list.iter_mut().find(|(k, _)| k == kind) {
            Some(entry) => entry.1 = node,
            None => list.push((kind.to_string(), node)),
        }
        Ok(())
    }

    pub fn metadata(&self, v: ValueId, kind: &str) -> Option<MetadataId> {
        self.attachments
            .get(&v)?
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, node)| *node)
    }

    pub fn attachments(&self, v: ValueId) -> &[(String, MetadataId)] {
        self.attachments.get(&v).map_or(&[][..], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_uniqued() {
        let mut ctx = Context::new();
        let a = ctx.const_int(8, 10);
        let b = ctx.const_int(8, 10);
        let c = ctx.const_int(16, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ctx.const_int(8, 0x10a), a);
        let minus_one = ctx.const_int(8, 0xff);
        assert_eq!(ctx.const_int_signed(minus_one), Some(-1));
    }

    #[test]
    fn test_float_constants() {
        let mut ctx = Context::new();
        let f32_ty = ctx.float_type(FloatKind::Single);
        let x = ctx.const_float(f32_ty, 1.5).unwrap();
        assert_eq!(ctx.const_float_value(x), Some(1.5));
        let i8_ty = ctx.int_type(8);
        assert!(ctx.const_float(i8_ty, 1.0).is_err());
    }

    #[test]
    fn test_add_function() {
        let mut ctx = Context::new();
        let m = ctx.create_module("m");
        let i8 = ctx.int_type(8);
        let fn_ty = ctx.function_type(i8, vec![i8, i8], false);
        let f = ctx.add_function(m, "sum", fn_ty, Linkage::External).unwrap();

        assert_eq!(ctx.get_function(m, "sum"), Some(f));
        assert_eq!(ctx.return_type(f), i8);
        assert_eq!(ctx.param_types(f), &[i8, i8]);
        assert_eq!(ctx.function_args(f).len(), 2);
        assert!(!ctx.is_vararg(f));
        assert!(ctx.function(f).is_declaration());
        assert_eq!(ctx.as_function(ctx.function_value(f)), Some(f));
        assert!(ctx.type_kind(ctx.type_of(ctx.function_value(f))).is_pointer());

        assert_eq!(
            ctx.add_function(m, "sum", fn_ty, Linkage::External),
            Err(IrError::DuplicateFunction("sum".into()))
        );
        assert!(matches!(
            ctx.add_function(m, "bad", i8, Linkage::External),
            Err(IrError::NotAFunction(_))
        ));
    }

    #[test]
    fn test_blocks() {
        let mut ctx = Context::new();
        let m = ctx.create_module("m");
        let void = ctx.void_type();
        let fn_ty = ctx.function_type(void, vec![], false);
        let f = ctx.add_function(m, "f", fn_ty, Linkage::Internal).unwrap();

        let entry = ctx.append_block(f, Some("entry"));
        let loose = ctx.create_block(None);
        assert_eq!(ctx.block_parent(loose), None);
        ctx.attach_block(f, loose).unwrap();
        assert_eq!(ctx.function_blocks(f), &[entry, loose]);
        assert!(ctx.attach_block(f, loose).is_err());
        assert_eq!(ctx.block_label(loose), format!("bb{}", loose.index()));
    }

    #[test]
    fn test_metadata_targets() {
        let mut ctx = Context::new();
        let m = ctx.create_module("m");
        let void = ctx.void_type();
        let fn_ty = ctx.function_type(void, vec![], false);
        let f = ctx.add_function(m, "f", fn_ty, Linkage::External).unwrap();
        let fv = ctx.function_value(f);

        let tag = ctx.md_string("hello");
        ctx.set_metadata(fv, "note", tag).unwrap();
        assert_eq!(ctx.metadata(fv, "note"), Some(tag));
        assert_eq!(ctx.md(tag).as_string(), Some("hello"));

        let other = ctx.md_string("bye");
        ctx.set_metadata(fv, "note", other).unwrap();
        assert_eq!(ctx.attachments(fv).len(), 1);

        let c = ctx.const_int(8, 1);
        assert_eq!(ctx.set_metadata(c, "note", tag), Err(IrError::MetadataTarget));
        assert_eq!(
            ctx.replace_md_operand(tag, 3, MdOperand::Value(c)),
            Err(IrError::MetadataIndex { index: 3, len: 1 })
        );
    }
}
