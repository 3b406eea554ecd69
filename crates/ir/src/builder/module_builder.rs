use super::{BuilderError, FunctionBuilder};
use crate::{
    Function, GlobalVariable, GlobalVariableData, Linkage, Module, Signature, Type,
    metadata::MdKind,
    module::{FuncRef, ModuleCtx},
};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    pub module: Module,
}

impl ModuleBuilder {
    pub fn new(ctx: ModuleCtx) -> Self {
        Self {
            module: Module::new(ctx),
        }
    }

    /// Create a new module builder from a module, so more functions can be
    /// added to it.
    pub fn from_module(module: Module) -> Self {
        Self { module }
    }

    pub fn ctx(&self) -> &ModuleCtx {
        &self.module.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut ModuleCtx {
        &mut self.module.ctx
    }

    /// Declares a function. Declaring a name twice returns the first
    /// declaration.
    pub fn declare_function(&mut self, sig: Signature) -> FuncRef {
        self.module.ctx.declare_function(sig)
    }

    /// Declares an external intrinsic such as `llvm.nacl.atomic.load.i32`.
    pub fn declare_intrinsic(&mut self, name: &str, args: &[Type], ret_ty: Type) -> FuncRef {
        let sig = Signature::new(name, Linkage::External, args, ret_ty);
        self.declare_function(sig)
    }

    pub fn lookup_func(&self, name: &str) -> Option<FuncRef> {
        self.module.ctx.func_by_name(name)
    }

    pub fn make_global(&mut self, global: GlobalVariableData) -> Result<GlobalVariable, BuilderError> {
        let symbol = global.symbol.clone();
        self.module
            .ctx
            .gv_store_mut()
            .make_gv(global)
            .ok_or(BuilderError::DuplicateGlobal(symbol))
    }

    pub fn lookup_global(&self, name: &str) -> Option<GlobalVariable> {
        self.module.ctx.gv_store().gv_by_symbol(name)
    }

    pub fn ptr_type(&mut self, ty: Type) -> Type {
        self.module.ctx.types_mut().make_ptr(ty)
    }

    pub fn ptr_type_in(&mut self, ty: Type, addr_space: u32) -> Type {
        self.module.ctx.types_mut().make_ptr_in(ty, addr_space)
    }

    pub fn vector_type(&mut self, elem: Type, len: u32) -> Type {
        self.module.ctx.types_mut().make_vector(elem, len)
    }

    pub fn declare_array_type(&mut self, elem: Type, len: usize) -> Type {
        self.module.ctx.types_mut().make_array(elem, len)
    }

    pub fn declare_struct_type(&mut self, name: &str, fields: &[Type]) -> Type {
        self.module.ctx.types_mut().make_struct(name, fields)
    }

    pub fn declare_func_type(&mut self, args: &[Type], ret_ty: Type) -> Type {
        self.module.ctx.types_mut().make_func(args, ret_ty)
    }

    pub fn md_kind(&mut self, name: &str) -> MdKind {
        self.module.ctx.md_kinds_mut().get_or_register(name)
    }

    pub fn func_builder(&mut self, func_ref: FuncRef) -> FunctionBuilder<'_> {
        let func = Function::new(self.module.ctx.func_sig(func_ref));
        FunctionBuilder::new(self, func_ref, func)
    }

    pub(super) fn define(&mut self, func_ref: FuncRef, func: Function) -> Result<(), BuilderError> {
        if self.module.funcs.contains_key(&func_ref) {
            let name = self.module.ctx.func_sig(func_ref).name().to_string();
            return Err(BuilderError::AlreadyDefined(name));
        }
        self.module.funcs.insert(func_ref, func);
        Ok(())
    }

    pub fn build(self) -> Module {
        self.module
    }
}
