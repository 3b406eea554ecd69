//! Alignment rules for loads and stores.
use std::fmt;

use pnacl_ir::{DataLayout, Type, module::ModuleCtx};

/// Decides whether a memory access of `ty` may declare alignment `align`.
pub trait AlignmentPolicy: fmt::Debug + Send + Sync {
    fn is_allowed_alignment(&self, ctx: &ModuleCtx, layout: &DataLayout, align: u32, ty: Type)
    -> bool;
}

/// The portable rule: accesses either declare alignment 1 or the type's
/// natural alignment for the types where the translator can honor it.
///
/// - vectors: the element byte size, never for `i1` elements;
/// - `f64`: 1 or 8;
/// - `f32`: 1 or 4;
/// - everything else: exactly 1.
///
/// An alignment of 0 ("use the ABI default") is never accepted since its
/// meaning depends on the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableAlignment;

impl AlignmentPolicy for PortableAlignment {
    fn is_allowed_alignment(
        &self,
        ctx: &ModuleCtx,
        layout: &DataLayout,
        align: u32,
        ty: Type,
    ) -> bool {
        if align == 0 {
            return false;
        }

        let types = ctx.types();
        if let Some((elem, _)) = types.vector_def(ty) {
            if elem == Type::I1 {
                return false;
            }
            return layout
                .size_in_bits(elem, types)
                .is_some_and(|bits| u64::from(align) * 8 == bits);
        }

        align == 1 || (ty == Type::F64 && align == 8) || (ty == Type::F32 && align == 4)
    }
}
