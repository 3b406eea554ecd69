use std::{collections::hash_map::Entry, io};

use cranelift_entity::PrimaryMap;
use rustc_hash::FxHashMap;

use crate::{Linkage, Type, ir_writer::IrWrite, module::ModuleCtx};

#[derive(Debug, Default, Clone)]
pub struct GlobalVariableStore {
    gv_data: PrimaryMap<GlobalVariable, GlobalVariableData>,
    symbols: FxHashMap<String, GlobalVariable>,
}

impl GlobalVariableStore {
    /// Returns `None` if `symbol` is already taken.
    pub fn make_gv(&mut self, gv_data: GlobalVariableData) -> Option<GlobalVariable> {
        match self.symbols.entry(gv_data.symbol.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => {
                let gv = self.gv_data.push(gv_data);
                v.insert(gv);
                Some(gv)
            }
        }
    }

    pub fn gv_data(&self, gv: GlobalVariable) -> &GlobalVariableData {
        &self.gv_data[gv]
    }

    pub fn gv_by_symbol(&self, symbol: &str) -> Option<GlobalVariable> {
        self.symbols.get(symbol).copied()
    }

    /// Type of the variable's contents. A reference to the variable has type
    /// pointer-to-this.
    pub fn ty(&self, gv: GlobalVariable) -> Type {
        self.gv_data[gv].ty
    }

    pub fn all_gv_data(&self) -> impl Iterator<Item = &GlobalVariableData> {
        self.gv_data.values()
    }
}

/// An opaque reference to [`GlobalVariableData`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct GlobalVariable(pub u32);
cranelift_entity::entity_impl!(GlobalVariable);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalVariableData {
    pub symbol: String,
    pub ty: Type,
    pub linkage: Linkage,
}

impl GlobalVariableData {
    pub fn new(symbol: &str, ty: Type, linkage: Linkage) -> Self {
        Self {
            symbol: symbol.to_string(),
            ty,
            linkage,
        }
    }
}

impl<Ctx> IrWrite<Ctx> for GlobalVariableData
where
    Ctx: AsRef<ModuleCtx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        write!(w, "global {} ", self.linkage)?;
        self.ty.write(w, ctx)?;
        write!(w, " %{};", self.symbol)
    }
}
