use super::{BuilderError, ModuleBuilder};
use crate::{
    BlockId, Function, GlobalVariable, Immediate, InstId, Type, ValueId,
    inst::{ArithFlags, CallAttrs, InstData, InstDetail, MemAccess, Opcode},
    metadata::{MdKind, MdNode},
    module::FuncRef,
    value::ConstExpr,
};

pub struct FunctionBuilder<'a> {
    pub module_builder: &'a mut ModuleBuilder,
    pub func: Function,
    func_ref: FuncRef,
    current_block: Option<BlockId>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(module_builder: &'a mut ModuleBuilder, func_ref: FuncRef, func: Function) -> Self {
        Self {
            module_builder,
            func,
            func_ref,
            current_block: None,
        }
    }

    /// Moves the function body into the module.
    pub fn finish(self) -> Result<(), BuilderError> {
        let Self {
            module_builder,
            func,
            func_ref,
            ..
        } = self;
        module_builder.define(func_ref, func)
    }

    pub fn func_ref(&self) -> FuncRef {
        self.func_ref
    }

    pub fn args(&self) -> &[ValueId] {
        &self.func.arg_values
    }

    pub fn append_block(&mut self) -> BlockId {
        let block = self.func.dfg.make_block();
        self.func.layout.append_block(block);
        block
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        self.func.dfg.make_imm_value(imm)
    }

    pub fn make_undef_value(&mut self, ty: Type) -> ValueId {
        self.func.dfg.make_undef_value(ty)
    }

    pub fn make_null_value(&mut self, ty: Type) -> ValueId {
        self.func.dfg.make_null_value(ty)
    }

    pub fn make_const_vector(&mut self, elems: &[Immediate], ty: Type) -> ValueId {
        self.func.dfg.make_const_vector(elems, ty)
    }

    pub fn make_const_expr(&mut self, expr: ConstExpr, ty: Type) -> ValueId {
        self.func.dfg.make_const_expr(expr, ty)
    }

    /// Returns a pointer value to the global variable.
    pub fn make_global_value(&mut self, gv: GlobalVariable) -> ValueId {
        let gv_ty = self.module_builder.ctx().gv_store().ty(gv);
        let ty = self.module_builder.ptr_type(gv_ty);
        self.func.dfg.make_global_value(gv, ty)
    }

    /// Returns a function pointer value to `func`.
    pub fn make_func_value(&mut self, func: FuncRef) -> ValueId {
        let sig = self.module_builder.ctx().func_sig(func).clone();
        let ty = sig.func_ptr_type(self.module_builder.ctx_mut());
        self.func.dfg.make_func_value(func, ty)
    }

    pub fn make_block_value(&mut self, block: BlockId) -> ValueId {
        self.func.dfg.make_block_value(block)
    }

    pub fn make_metadata_value(&mut self, node: MdNode) -> ValueId {
        self.func.dfg.make_metadata_value(node)
    }

    pub fn make_inline_asm(&mut self, asm: &str, ty: Type) -> ValueId {
        self.func.dfg.make_inline_asm(asm, ty)
    }

    pub fn ptr_type(&mut self, ty: Type) -> Type {
        self.module_builder.ptr_type(ty)
    }

    pub fn vector_type(&mut self, elem: Type, len: u32) -> Type {
        self.module_builder.vector_type(elem, len)
    }

    pub fn value_ty(&self, value: ValueId) -> Type {
        self.func.dfg.value_ty(value)
    }

    /// Appends `data` to the current block. Instructions inserted before any
    /// block is selected go to a fresh block.
    pub fn insert_inst(&mut self, data: InstData) -> InstId {
        let block = match self.current_block {
            Some(block) => block,
            None => {
                let block = self.append_block();
                self.current_block = Some(block);
                block
            }
        };

        let inst = self.func.dfg.make_inst(data);
        self.func.layout.append_inst(inst, block);
        inst
    }

    pub fn inst_result(&self, inst: InstId) -> Option<ValueId> {
        self.func.dfg.inst_result(inst)
    }

    /// Inserts an instruction that produces a value and returns the value.
    fn insert_value_inst(&mut self, data: InstData) -> ValueId {
        debug_assert!(!data.ty.is_void());
        let inst = self.insert_inst(data);
        // Non-void instructions always get a result in `make_inst`.
        self.func
            .dfg
            .inst_result(inst)
            .unwrap_or_else(|| unreachable!("non-void instruction without result"))
    }

    pub fn inst_mut(&mut self, inst: InstId) -> &mut InstData {
        self.func.dfg.inst_mut(inst)
    }

    pub fn last_inst(&self) -> Option<InstId> {
        self.current_block
            .and_then(|block| self.func.layout.last_inst_of(block))
    }

    pub fn set_metadata(&mut self, inst: InstId, kind: MdKind, node: MdNode) {
        self.func.dfg.inst_mut(inst).metadata.push((kind, node));
    }

    pub fn binary(&mut self, op: Opcode, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary_with_flags(op, lhs, rhs, ArithFlags::default())
    }

    pub fn binary_with_flags(
        &mut self,
        op: Opcode,
        lhs: ValueId,
        rhs: ValueId,
        flags: ArithFlags,
    ) -> ValueId {
        let ty = self.value_ty(lhs);
        self.insert_value_inst(InstData::new(op, &[lhs, rhs], ty).with_flags(flags))
    }

    fn cmp_result_ty(&mut self, operand: ValueId) -> Type {
        let ty = self.value_ty(operand);
        match self.module_builder.ctx().types().vector_def(ty) {
            Some((_, len)) => self.vector_type(Type::I1, len),
            None => Type::I1,
        }
    }

    pub fn icmp(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.cmp_result_ty(lhs);
        self.insert_value_inst(InstData::new(Opcode::ICmp, &[lhs, rhs], ty))
    }

    pub fn fcmp(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.cmp_result_ty(lhs);
        self.insert_value_inst(InstData::new(Opcode::FCmp, &[lhs, rhs], ty))
    }

    pub fn cast(&mut self, op: Opcode, from: ValueId, ty: Type) -> ValueId {
        debug_assert!(op.is_cast());
        self.insert_value_inst(InstData::new(op, &[from], ty))
    }

    pub fn select(&mut self, cond: ValueId, then: ValueId, els: ValueId) -> ValueId {
        let ty = self.value_ty(then);
        self.insert_value_inst(InstData::new(Opcode::Select, &[cond, then, els], ty))
    }

    pub fn phi(&mut self, ty: Type, incoming: &[(ValueId, BlockId)]) -> ValueId {
        let mut args = Vec::with_capacity(incoming.len() * 2);
        for &(value, block) in incoming {
            args.push(value);
            args.push(self.make_block_value(block));
        }
        self.insert_value_inst(InstData::new(Opcode::Phi, &args, ty))
    }

    pub fn load(&mut self, ptr: ValueId, ty: Type, mem: MemAccess) -> ValueId {
        self.insert_value_inst(InstData::new(Opcode::Load, &[ptr], ty).with_detail(InstDetail::Mem(mem)))
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId, mem: MemAccess) -> InstId {
        self.insert_inst(
            InstData::new(Opcode::Store, &[value, ptr], Type::Void).with_detail(InstDetail::Mem(mem)),
        )
    }

    /// Allocates `size` elements of `allocated_ty` on the stack.
    pub fn alloca(&mut self, allocated_ty: Type, size: ValueId, align: u32) -> ValueId {
        let ty = self.ptr_type(allocated_ty);
        let detail = InstDetail::Alloca {
            allocated_ty,
            align,
        };
        self.insert_value_inst(InstData::new(Opcode::Alloca, &[size], ty).with_detail(detail))
    }

    /// Calls a declared function with default attributes.
    pub fn call(&mut self, func: FuncRef, args: &[ValueId]) -> InstId {
        let ret_ty = self.module_builder.ctx().func_sig(func).ret_ty();
        let callee = self.make_func_value(func);
        self.call_indirect(callee, args, ret_ty, CallAttrs::default())
    }

    /// Calls an arbitrary callee value.
    pub fn call_indirect(
        &mut self,
        callee: ValueId,
        args: &[ValueId],
        ret_ty: Type,
        attrs: CallAttrs,
    ) -> InstId {
        let mut operands = args.to_vec();
        operands.push(callee);
        self.insert_inst(
            InstData::new(Opcode::Call, &operands, ret_ty).with_detail(InstDetail::Call(attrs)),
        )
    }

    pub fn extract_element(&mut self, vec: ValueId, idx: ValueId) -> ValueId {
        let vec_ty = self.value_ty(vec);
        let ty = self.module_builder.ctx().types().scalar_of(vec_ty);
        self.insert_value_inst(InstData::new(Opcode::ExtractElement, &[vec, idx], ty))
    }

    pub fn insert_element(&mut self, vec: ValueId, elem: ValueId, idx: ValueId) -> ValueId {
        let ty = self.value_ty(vec);
        self.insert_value_inst(InstData::new(Opcode::InsertElement, &[vec, elem, idx], ty))
    }

    pub fn ret(&mut self, value: Option<ValueId>) -> InstId {
        let args: &[ValueId] = match &value {
            Some(value) => std::slice::from_ref(value),
            None => &[],
        };
        self.insert_inst(InstData::new(Opcode::Ret, args, Type::Void))
    }

    pub fn jump(&mut self, dest: BlockId) -> InstId {
        let dest = self.make_block_value(dest);
        self.insert_inst(InstData::new(Opcode::Br, &[dest], Type::Void))
    }

    pub fn br(&mut self, cond: ValueId, then: BlockId, els: BlockId) -> InstId {
        let then = self.make_block_value(then);
        let els = self.make_block_value(els);
        self.insert_inst(InstData::new(Opcode::Br, &[cond, then, els], Type::Void))
    }

    pub fn switch(&mut self, cond: ValueId, default: BlockId, cases: &[(ValueId, BlockId)]) -> InstId {
        let mut args = vec![cond, self.make_block_value(default)];
        for &(case, dest) in cases {
            args.push(case);
            args.push(self.make_block_value(dest));
        }
        self.insert_inst(InstData::new(Opcode::Switch, &args, Type::Void))
    }

    pub fn unreachable(&mut self) -> InstId {
        self.insert_inst(InstData::new(Opcode::Unreachable, &[], Type::Void))
    }
}
