//! This module contains the IR type definitions.
use std::io;

use cranelift_entity::PrimaryMap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{ir_writer::IrWrite, module::ModuleCtx};

#[derive(Debug, Default, Clone)]
pub struct TypeStore {
    compounds: PrimaryMap<CompoundTypeRef, CompoundType>,
    rev_types: FxHashMap<CompoundType, CompoundTypeRef>,
    struct_types: IndexMap<String, CompoundTypeRef>,
}

impl TypeStore {
    /// Makes a pointer to `ty` in the default address space.
    pub fn make_ptr(&mut self, ty: Type) -> Type {
        self.make_ptr_in(ty, 0)
    }

    pub fn make_ptr_in(&mut self, pointee: Type, addr_space: u32) -> Type {
        let ty = self.make_compound(CompoundType::Ptr {
            pointee,
            addr_space,
        });
        Type::Compound(ty)
    }

    pub fn make_vector(&mut self, elem: Type, len: u32) -> Type {
        let ty = self.make_compound(CompoundType::Vector { elem, len });
        Type::Compound(ty)
    }

    pub fn make_array(&mut self, elem: Type, len: usize) -> Type {
        let ty = self.make_compound(CompoundType::Array { elem, len });
        Type::Compound(ty)
    }

    /// Declares a named struct type.
    ///
    /// Returns the already declared type if a struct with the same name and
    /// fields exists.
    pub fn make_struct(&mut self, name: &str, fields: &[Type]) -> Type {
        let data = CompoundType::Struct(StructData {
            name: name.to_string(),
            fields: fields.to_vec(),
        });
        Type::Compound(self.make_compound(data))
    }

    pub fn make_func(&mut self, args: &[Type], ret_ty: Type) -> Type {
        let cmpd_ref = self.make_compound(CompoundType::Func {
            args: args.into(),
            ret_ty,
        });
        Type::Compound(cmpd_ref)
    }

    pub fn make_compound(&mut self, data: CompoundType) -> CompoundTypeRef {
        if let Some(cmpd_ref) = self.rev_types.get(&data) {
            return *cmpd_ref;
        }

        let cmpd_ref = self.compounds.push(data.clone());
        if let CompoundType::Struct(s) = &data {
            self.struct_types.insert(s.name.clone(), cmpd_ref);
        }
        self.rev_types.insert(data, cmpd_ref);
        cmpd_ref
    }

    pub fn resolve_compound(&self, cmpd_ref: CompoundTypeRef) -> &CompoundType {
        &self.compounds[cmpd_ref]
    }

    /// Returns the compound data of `ty`, or `None` for non-compound types.
    pub fn compound(&self, ty: Type) -> Option<&CompoundType> {
        match ty {
            Type::Compound(cmpd_ref) => self.compounds.get(cmpd_ref),
            _ => None,
        }
    }

    /// Returns the pointee type and address space if `ty` is a pointer.
    pub fn ptr_def(&self, ty: Type) -> Option<(Type, u32)> {
        match self.compound(ty)? {
            CompoundType::Ptr {
                pointee,
                addr_space,
            } => Some((*pointee, *addr_space)),
            _ => None,
        }
    }

    pub fn deref(&self, ptr: Type) -> Option<Type> {
        self.ptr_def(ptr).map(|(pointee, _)| pointee)
    }

    /// Returns the element type and length if `ty` is a vector.
    pub fn vector_def(&self, ty: Type) -> Option<(Type, u32)> {
        match self.compound(ty)? {
            CompoundType::Vector { elem, len } => Some((*elem, *len)),
            _ => None,
        }
    }

    /// Returns the argument types and return type if `ty` is a function type.
    pub fn func_def(&self, ty: Type) -> Option<(&[Type], Type)> {
        match self.compound(ty)? {
            CompoundType::Func { args, ret_ty } => Some((args.as_slice(), *ret_ty)),
            _ => None,
        }
    }

    pub fn lookup_struct(&self, name: &str) -> Option<CompoundTypeRef> {
        self.struct_types.get(name).copied()
    }

    pub fn is_ptr(&self, ty: Type) -> bool {
        self.ptr_def(ty).is_some()
    }

    pub fn is_vector(&self, ty: Type) -> bool {
        self.vector_def(ty).is_some()
    }

    pub fn is_func(&self, ty: Type) -> bool {
        self.func_def(ty).is_some()
    }

    /// Returns the element type of a vector, or `ty` itself otherwise.
    pub fn scalar_of(&self, ty: Type) -> Type {
        self.vector_def(ty).map_or(ty, |(elem, _)| elem)
    }

    pub fn all_compounds(&self) -> impl Iterator<Item = (CompoundTypeRef, &CompoundType)> {
        self.compounds.iter()
    }

    /// Named struct types in declaration order.
    pub fn all_struct_data(&self) -> impl Iterator<Item = &StructData> {
        self.struct_types
            .values()
            .filter_map(|cmpd| match &self.compounds[*cmpd] {
                CompoundType::Struct(data) => Some(data),
                _ => None,
            })
    }
}

/// IR type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    I1,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    /// Type of a basic block used as a branch target.
    Label,
    /// Type of a metadata operand (debug intrinsic arguments).
    Metadata,
    Compound(CompoundTypeRef),
    #[default]
    Void,
}

impl Type {
    pub fn is_integral(self) -> bool {
        self.int_width().is_some()
    }

    /// Returns the bit width of an integer type.
    pub fn int_width(self) -> Option<u32> {
        match self {
            Self::I1 => Some(1),
            Self::I8 => Some(8),
            Self::I16 => Some(16),
            Self::I32 => Some(32),
            Self::I64 => Some(64),
            Self::I128 => Some(128),
            _ => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_void(self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_compound(self) -> bool {
        matches!(self, Self::Compound(_))
    }

    pub fn is_pointer(self, ctx: &ModuleCtx) -> bool {
        ctx.types().is_ptr(self)
    }

    pub fn to_ptr(self, ctx: &mut ModuleCtx) -> Type {
        ctx.types_mut().make_ptr(self)
    }
}

impl<Ctx> IrWrite<Ctx> for Type
where
    Ctx: AsRef<ModuleCtx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        match self {
            Type::I1 => write!(w, "i1"),
            Type::I8 => write!(w, "i8"),
            Type::I16 => write!(w, "i16"),
            Type::I32 => write!(w, "i32"),
            Type::I64 => write!(w, "i64"),
            Type::I128 => write!(w, "i128"),
            Type::F32 => write!(w, "f32"),
            Type::F64 => write!(w, "f64"),
            Type::Label => write!(w, "label"),
            Type::Metadata => write!(w, "metadata"),
            Type::Compound(cmpd_ty) => cmpd_ty.write(w, ctx),
            Type::Void => write!(w, "void"),
        }
    }
}

/// An opaque reference to [`CompoundType`].
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct CompoundTypeRef(u32);
cranelift_entity::entity_impl!(CompoundTypeRef);

impl<Ctx> IrWrite<Ctx> for CompoundTypeRef
where
    Ctx: AsRef<ModuleCtx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        match ctx.as_ref().types().resolve_compound(*self) {
            CompoundType::Ptr {
                pointee,
                addr_space,
            } => {
                write!(w, "*")?;
                if *addr_space != 0 {
                    write!(w, "addrspace({addr_space}) ")?;
                }
                pointee.write(w, ctx)
            }
            CompoundType::Vector { elem, len } => {
                write!(w, "<{len} x ")?;
                elem.write(w, ctx)?;
                write!(w, ">")
            }
            CompoundType::Array { elem, len } => {
                write!(w, "[")?;
                elem.write(w, ctx)?;
                write!(w, "; {len}]")
            }
            CompoundType::Struct(StructData { name, .. }) => write!(w, "@{name}"),
            CompoundType::Func { args, ret_ty } => {
                write!(w, "(")?;
                args.as_slice().write(w, ctx)?;
                write!(w, ") -> ")?;
                ret_ty.write(w, ctx)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompoundType {
    Ptr {
        pointee: Type,
        addr_space: u32,
    },
    Vector {
        elem: Type,
        len: u32,
    },
    Array {
        elem: Type,
        len: usize,
    },
    Struct(StructData),
    Func {
        args: SmallVec<[Type; 8]>,
        ret_ty: Type,
    },
}

impl CompoundType {
    pub fn is_ptr(&self) -> bool {
        matches!(self, Self::Ptr { .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector { .. })
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Array { .. } | Self::Struct(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Self::Func { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructData {
    pub name: String,
    pub fields: Vec<Type>,
}

impl<Ctx> IrWrite<Ctx> for StructData
where
    Ctx: AsRef<ModuleCtx>,
{
    fn write<W>(&self, w: &mut W, ctx: &Ctx) -> io::Result<()>
    where
        W: io::Write,
    {
        write!(w, "type @{} = {{", self.name)?;
        self.fields.as_slice().write(w, ctx)?;
        write!(w, "}};")
    }
}
