//! Target data layout.
use std::fmt;

use crate::{Type, types::CompoundType, types::TypeStore};

/// Sizes the portable target commits to. Portable modules are always
/// little-endian ILP32: pointers and `size_t` are 32 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataLayout {
    pub pointer_bits: u32,
    pub little_endian: bool,
}

impl DataLayout {
    pub const ILP32: Self = Self {
        pointer_bits: 32,
        little_endian: true,
    };

    /// Integer type wide enough to hold an address.
    pub fn int_ptr_type(&self) -> Type {
        match self.pointer_bits {
            64 => Type::I64,
            _ => Type::I32,
        }
    }

    /// Size of `ty` in bits, or `None` for unsized types (`void`, labels,
    /// metadata, functions).
    pub fn size_in_bits(&self, ty: Type, types: &TypeStore) -> Option<u64> {
        let bits = match ty {
            Type::I1 => 1,
            Type::I8 => 8,
            Type::I16 => 16,
            Type::I32 | Type::F32 => 32,
            Type::I64 | Type::F64 => 64,
            Type::I128 => 128,
            Type::Void | Type::Label | Type::Metadata => return None,
            Type::Compound(cmpd) => match types.resolve_compound(cmpd) {
                CompoundType::Ptr { .. } => self.pointer_bits as u64,
                CompoundType::Vector { elem, len } => {
                    self.size_in_bits(*elem, types)? * *len as u64
                }
                CompoundType::Array { elem, len } => {
                    self.store_size(*elem, types)? * 8 * *len as u64
                }
                CompoundType::Struct(data) => {
                    let mut bits = 0;
                    for field in &data.fields {
                        bits += self.store_size(*field, types)? * 8;
                    }
                    bits
                }
                CompoundType::Func { .. } => return None,
            },
        };
        Some(bits)
    }

    /// Number of bytes written when storing `ty`.
    pub fn store_size(&self, ty: Type, types: &TypeStore) -> Option<u64> {
        self.size_in_bits(ty, types).map(|bits| bits.div_ceil(8))
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::ILP32
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let endian = if self.little_endian { "e" } else { "E" };
        write!(f, "\"{endian}-p:{0}:{0}\"", self.pointer_bits)
    }
}
