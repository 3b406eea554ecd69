//! This module contains the IR data flow graph.
use std::fmt;

use cranelift_entity::{PrimaryMap, SecondaryMap, entity_impl, packed_option::PackedOption};
use rustc_hash::FxHashMap;

use crate::{
    GlobalVariable, Type,
    inst::{InstData, InstId},
    metadata::MdNode,
    module::FuncRef,
    value::{ConstExpr, GlobalRef, Immediate, Value, ValueId},
};

#[derive(Debug, Clone, Default)]
pub struct DataFlowGraph {
    #[doc(hidden)]
    pub blocks: PrimaryMap<BlockId, Block>,
    #[doc(hidden)]
    pub values: PrimaryMap<ValueId, Value>,
    insts: PrimaryMap<InstId, InstData>,
    inst_results: SecondaryMap<InstId, PackedOption<ValueId>>,
    immediates: FxHashMap<Immediate, ValueId>,
    block_values: FxHashMap<BlockId, ValueId>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_block(&mut self) -> BlockId {
        self.blocks.push(Block::new())
    }

    pub fn make_value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }

    /// Inserts an instruction. A result value is created unless the result
    /// type is `void`.
    pub fn make_inst(&mut self, data: InstData) -> InstId {
        let ty = data.ty;
        let inst = self.insts.push(data);
        if !ty.is_void() {
            let result = self.make_value(Value::Inst { inst, ty });
            self.inst_results[inst] = result.into();
        }
        inst
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        let imm: Immediate = imm.into();
        if let Some(&value) = self.immediates.get(&imm) {
            return value;
        }

        let ty = imm.ty();
        let value = self.make_value(Value::Immediate { imm, ty });
        self.immediates.insert(imm, value);
        value
    }

    pub fn make_undef_value(&mut self, ty: Type) -> ValueId {
        self.make_value(Value::Undef { ty })
    }

    pub fn make_null_value(&mut self, ty: Type) -> ValueId {
        self.make_value(Value::Null { ty })
    }

    pub fn make_const_vector(&mut self, elems: &[Immediate], ty: Type) -> ValueId {
        self.make_value(Value::ConstVector {
            elems: elems.into(),
            ty,
        })
    }

    pub fn make_const_expr(&mut self, expr: ConstExpr, ty: Type) -> ValueId {
        self.make_value(Value::ConstExpr { expr, ty })
    }

    pub fn make_global_value(&mut self, gv: GlobalVariable, ty: Type) -> ValueId {
        self.make_value(Value::Global {
            gv: GlobalRef::Var(gv),
            ty,
        })
    }

    pub fn make_func_value(&mut self, func: FuncRef, ty: Type) -> ValueId {
        self.make_value(Value::Global {
            gv: GlobalRef::Func(func),
            ty,
        })
    }

    /// Returns the label value of `block`, creating it on first use.
    pub fn make_block_value(&mut self, block: BlockId) -> ValueId {
        if let Some(&value) = self.block_values.get(&block) {
            return value;
        }
        let value = self.make_value(Value::Block { block });
        self.block_values.insert(block, value);
        value
    }

    pub fn make_metadata_value(&mut self, node: MdNode) -> ValueId {
        self.make_value(Value::Metadata { node })
    }

    pub fn make_inline_asm(&mut self, asm: &str, ty: Type) -> ValueId {
        self.make_value(Value::InlineAsm {
            asm: asm.to_string(),
            ty,
        })
    }

    pub fn inst(&self, inst: InstId) -> &InstData {
        &self.insts[inst]
    }

    pub fn inst_mut(&mut self, inst: InstId) -> &mut InstData {
        &mut self.insts[inst]
    }

    pub fn has_inst(&self, inst: InstId) -> bool {
        self.insts.is_valid(inst)
    }

    pub fn inst_result(&self, inst: InstId) -> Option<ValueId> {
        self.inst_results[inst].expand()
    }

    pub fn value(&self, value: ValueId) -> &Value {
        &self.values[value]
    }

    pub fn get_value(&self, value: ValueId) -> Option<&Value> {
        self.values.get(value)
    }

    pub fn value_ty(&self, value: ValueId) -> Type {
        self.values[value].ty()
    }

    /// Returns the instruction defining `value`, if any.
    pub fn value_inst(&self, value: ValueId) -> Option<InstId> {
        match self.values[value] {
            Value::Inst { inst, .. } => Some(inst),
            _ => None,
        }
    }

    /// Returns the instruction data defining `value`, if any.
    pub fn value_inst_data(&self, value: ValueId) -> Option<&InstData> {
        self.value_inst(value).map(|inst| self.inst(inst))
    }

    pub fn num_insts(&self) -> usize {
        self.insts.len()
    }
}

/// An opaque reference to [`Block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);
entity_impl!(BlockId);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

/// A block data definition.
/// A Block data doesn't hold any information for layout of a program. It is
/// managed by [`super::layout::Layout`].
#[derive(Debug, Clone, Default)]
pub struct Block {}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }
}
