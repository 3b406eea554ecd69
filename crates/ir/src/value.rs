//! This module contains the IR value definition.
use std::{fmt, io};

use smallvec::SmallVec;

use super::Type;
use crate::{
    BlockId, GlobalVariable,
    inst::InstId,
    ir_writer::{FuncWriteCtx, IrWrite},
    metadata::MdNode,
    module::FuncRef,
};

/// An opaque reference to [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct ValueId(pub u32);
cranelift_entity::entity_impl!(ValueId);

/// A value data definition.
#[derive(Debug, Clone)]
pub enum Value {
    /// The value is defined by an instruction.
    Inst { inst: InstId, ty: Type },

    /// The value is a function argument.
    Arg { ty: Type, idx: usize },

    /// The value is an integer or floating point constant.
    Immediate { imm: Immediate, ty: Type },

    Undef { ty: Type },

    /// The null pointer constant.
    Null { ty: Type },

    /// A constant vector with explicit lanes.
    ConstVector {
        elems: SmallVec<[Immediate; 16]>,
        ty: Type,
    },

    /// A constant expression folded at compile time.
    ConstExpr { expr: ConstExpr, ty: Type },

    /// The address of a global variable or function.
    Global { gv: GlobalRef, ty: Type },

    /// A basic block used as a branch target.
    Block { block: BlockId },

    /// A metadata node passed to a debug intrinsic.
    Metadata { node: MdNode },

    InlineAsm { asm: String, ty: Type },
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Self::Inst { ty, .. }
            | Self::Arg { ty, .. }
            | Self::Immediate { ty, .. }
            | Self::Undef { ty }
            | Self::Null { ty }
            | Self::ConstVector { ty, .. }
            | Self::ConstExpr { ty, .. }
            | Self::Global { ty, .. }
            | Self::InlineAsm { ty, .. } => *ty,
            Self::Block { .. } => Type::Label,
            Self::Metadata { .. } => Type::Metadata,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::Immediate { .. }
                | Self::Undef { .. }
                | Self::Null { .. }
                | Self::ConstVector { .. }
                | Self::ConstExpr { .. }
                | Self::Global { .. }
        )
    }

    /// Returns the zero-extended integer value of an integer immediate.
    pub fn as_int_imm(&self) -> Option<u64> {
        match self {
            Self::Immediate { imm, .. } => imm.as_u64(),
            _ => None,
        }
    }
}

/// A global symbol whose address is a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalRef {
    Var(GlobalVariable),
    Func(FuncRef),
}

/// Constant expressions that may appear as operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstExpr {
    PtrToInt(GlobalRef),
    IntToPtr(u64),
    BitCast(GlobalRef),
    /// A folded address computation: `global + offset`.
    ElementPtr(GlobalRef, i64),
}

/// Integer and floating point constants. Floats are kept as bit patterns so
/// that immediates can be hashed and interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    I1(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(u32),
    F64(u64),
}

impl Immediate {
    pub fn ty(&self) -> Type {
        match self {
            Self::I1(..) => Type::I1,
            Self::I8(..) => Type::I8,
            Self::I16(..) => Type::I16,
            Self::I32(..) => Type::I32,
            Self::I64(..) => Type::I64,
            Self::F32(..) => Type::F32,
            Self::F64(..) => Type::F64,
        }
    }

    pub fn is_int(&self) -> bool {
        self.as_u64().is_some()
    }

    /// Returns the value zero-extended to 64 bits, or `None` for floats.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::I1(v) => Some(v as u64),
            Self::I8(v) => Some(v as u8 as u64),
            Self::I16(v) => Some(v as u16 as u64),
            Self::I32(v) => Some(v as u32 as u64),
            Self::I64(v) => Some(v as u64),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    pub fn f32(v: f32) -> Self {
        Self::F32(v.to_bits())
    }

    pub fn f64(v: f64) -> Self {
        Self::F64(v.to_bits())
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::I1(v) => write!(f, "{}", v as u8),
            Self::I8(v) => v.fmt(f),
            Self::I16(v) => v.fmt(f),
            Self::I32(v) => v.fmt(f),
            Self::I64(v) => v.fmt(f),
            Self::F32(bits) => write!(f, "{:?}", f32::from_bits(bits)),
            Self::F64(bits) => write!(f, "{:?}", f64::from_bits(bits)),
        }
    }
}

impl From<bool> for Immediate {
    fn from(v: bool) -> Self {
        Self::I1(v)
    }
}

impl From<i8> for Immediate {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<i16> for Immediate {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<i32> for Immediate {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Immediate {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for Immediate {
    fn from(v: f32) -> Self {
        Self::f32(v)
    }
}

impl From<f64> for Immediate {
    fn from(v: f64) -> Self {
        Self::f64(v)
    }
}

impl IrWrite<FuncWriteCtx<'_>> for ValueId {
    fn write<W>(&self, w: &mut W, ctx: &FuncWriteCtx) -> io::Result<()>
    where
        W: io::Write,
    {
        match ctx.func.dfg.value(*self) {
            Value::Inst { .. } | Value::Arg { .. } => write!(w, "v{}", self.0),
            Value::Immediate { imm, ty } => {
                write!(w, "{imm}.")?;
                ty.write(w, ctx)
            }
            Value::Undef { ty } => {
                write!(w, "undef.")?;
                ty.write(w, ctx)
            }
            Value::Null { ty } => {
                write!(w, "null.")?;
                ty.write(w, ctx)
            }
            Value::ConstVector { elems, .. } => {
                write!(w, "<")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{elem}.")?;
                    elem.ty().write(w, ctx)?;
                }
                write!(w, ">")
            }
            Value::ConstExpr { expr, ty } => {
                match expr {
                    ConstExpr::PtrToInt(gv) => {
                        write!(w, "ptrtoint(")?;
                        gv.write(w, ctx)?;
                    }
                    ConstExpr::IntToPtr(addr) => write!(w, "inttoptr({addr}")?,
                    ConstExpr::BitCast(gv) => {
                        write!(w, "bitcast(")?;
                        gv.write(w, ctx)?;
                    }
                    ConstExpr::ElementPtr(gv, offset) => {
                        write!(w, "gep(")?;
                        gv.write(w, ctx)?;
                        write!(w, ", {offset}")?;
                    }
                }
                write!(w, ").")?;
                ty.write(w, ctx)
            }
            Value::Global { gv, .. } => gv.write(w, ctx),
            Value::Block { block } => write!(w, "{block}"),
            Value::Metadata { node } => write!(w, "{node}"),
            Value::InlineAsm { asm, .. } => write!(w, "asm {asm:?}"),
        }
    }
}

impl IrWrite<FuncWriteCtx<'_>> for GlobalRef {
    fn write<W>(&self, w: &mut W, ctx: &FuncWriteCtx) -> io::Result<()>
    where
        W: io::Write,
    {
        match self {
            Self::Var(gv) => write!(w, "%{}", ctx.module.gv_data(*gv).symbol),
            Self::Func(func_ref) => write!(w, "%{}", ctx.module.func_sig(*func_ref).name()),
        }
    }
}
