use std::io;

use smallvec::SmallVec;

use super::{DataFlowGraph, Layout, Type, ValueId};
use crate::{
    Linkage,
    inst::CallConv,
    intrinsic::{IntrinsicId, is_intrinsic_name},
    ir_writer::IrWrite,
    module::ModuleCtx,
};

#[derive(Debug, Clone)]
pub struct Function {
    pub arg_values: SmallVec<[ValueId; 8]>,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
}

impl Function {
    pub fn new(sig: &Signature) -> Self {
        let mut dfg = DataFlowGraph::new();
        let arg_values = sig
            .args()
            .iter()
            .enumerate()
            .map(|(idx, ty)| dfg.make_value(crate::Value::Arg { ty: *ty, idx }))
            .collect();

        Self {
            arg_values,
            dfg,
            layout: Layout::default(),
        }
    }

    /// A function without blocks is a declaration.
    pub fn is_declaration(&self) -> bool {
        self.layout.entry_block().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Name of the function.
    name: String,

    /// Linkage of the function.
    linkage: Linkage,

    args: SmallVec<[Type; 8]>,
    ret_ty: Type,
    cc: CallConv,
}

impl Signature {
    pub fn new(name: &str, linkage: Linkage, args: &[Type], ret_ty: Type) -> Self {
        Self {
            name: name.to_string(),
            linkage,
            args: args.into(),
            ret_ty,
            cc: CallConv::C,
        }
    }

    pub fn with_call_conv(mut self, cc: CallConv) -> Self {
        self.cc = cc;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn args(&self) -> &[Type] {
        &self.args
    }

    pub fn ret_ty(&self) -> Type {
        self.ret_ty
    }

    pub fn call_conv(&self) -> CallConv {
        self.cc
    }

    pub fn is_intrinsic(&self) -> bool {
        is_intrinsic_name(&self.name)
    }

    /// The intrinsic identity, if the name resolves to a known intrinsic.
    pub fn intrinsic_id(&self) -> Option<IntrinsicId> {
        IntrinsicId::from_name(&self.name)
    }

    pub fn func_ptr_type(&self, ctx: &mut ModuleCtx) -> Type {
        let types = ctx.types_mut();
        let func_ty = types.make_func(&self.args, self.ret_ty);
        types.make_ptr(func_ty)
    }
}

impl<Ctx> IrWrite<Ctx> for Signature
where
    Ctx: AsRef<ModuleCtx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        write!(w, "func {} %{}(", self.linkage, self.name)?;
        self.args.as_slice().write(w, ctx)?;
        write!(w, ")")?;

        if !self.ret_ty.is_void() {
            write!(w, " -> ")?;
            self.ret_ty.write(w, ctx)?;
        }

        Ok(())
    }
}
