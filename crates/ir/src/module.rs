use cranelift_entity::{PrimaryMap, entity_impl};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::{
    DataLayout, Function, GlobalVariable, GlobalVariableData, GlobalVariableStore, Linkage,
    Signature, metadata::MetadataKinds, types::TypeStore,
};

/// Module-wide state shared by every function: types, globals, function
/// signatures, metadata kind names and the data layout.
#[derive(Debug, Clone, Default)]
pub struct ModuleCtx {
    pub data_layout: DataLayout,
    type_store: TypeStore,
    gv_store: GlobalVariableStore,
    func_sigs: PrimaryMap<FuncRef, Signature>,
    func_names: FxHashMap<String, FuncRef>,
    md_kinds: MetadataKinds,
}

impl ModuleCtx {
    pub fn new(data_layout: DataLayout) -> Self {
        Self {
            data_layout,
            ..Default::default()
        }
    }

    pub fn types(&self) -> &TypeStore {
        &self.type_store
    }

    pub fn types_mut(&mut self) -> &mut TypeStore {
        &mut self.type_store
    }

    pub fn gv_store(&self) -> &GlobalVariableStore {
        &self.gv_store
    }

    pub fn gv_store_mut(&mut self) -> &mut GlobalVariableStore {
        &mut self.gv_store
    }

    pub fn gv_data(&self, gv: GlobalVariable) -> &GlobalVariableData {
        self.gv_store.gv_data(gv)
    }

    pub fn all_gv_data(&self) -> impl Iterator<Item = &GlobalVariableData> {
        self.gv_store.all_gv_data()
    }

    /// Registers `sig`, or returns the existing reference if a function with
    /// the same name was already declared.
    pub fn declare_function(&mut self, sig: Signature) -> FuncRef {
        if let Some(&func_ref) = self.func_names.get(sig.name()) {
            return func_ref;
        }
        let name = sig.name().to_string();
        let func_ref = self.func_sigs.push(sig);
        self.func_names.insert(name, func_ref);
        func_ref
    }

    pub fn func_sig(&self, func_ref: FuncRef) -> &Signature {
        &self.func_sigs[func_ref]
    }

    pub fn func_by_name(&self, name: &str) -> Option<FuncRef> {
        self.func_names.get(name).copied()
    }

    pub fn iter_func_sigs(&self) -> impl Iterator<Item = (FuncRef, &Signature)> {
        self.func_sigs.iter()
    }

    pub fn md_kinds(&self) -> &MetadataKinds {
        &self.md_kinds
    }

    pub fn md_kinds_mut(&mut self) -> &mut MetadataKinds {
        &mut self.md_kinds
    }
}

impl AsRef<ModuleCtx> for ModuleCtx {
    fn as_ref(&self) -> &ModuleCtx {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub ctx: ModuleCtx,

    /// Function bodies, in definition order. Declarations only live in
    /// `ctx`.
    pub funcs: IndexMap<FuncRef, Function>,
}

impl Module {
    pub fn new(ctx: ModuleCtx) -> Self {
        Self {
            ctx,
            funcs: IndexMap::default(),
        }
    }

    /// Returns `func_ref` of every function with a body.
    pub fn iter_functions(&self) -> impl Iterator<Item = FuncRef> + '_ {
        self.funcs.keys().copied()
    }

    pub fn func(&self, func_ref: FuncRef) -> Option<&Function> {
        self.funcs.get(&func_ref)
    }

    /// Returns `true` if the function has external linkage.
    pub fn is_external(&self, func_ref: FuncRef) -> bool {
        self.ctx.func_sig(func_ref).linkage() == Linkage::External
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncRef(u32);
entity_impl!(FuncRef);
