//! Predicates over the portable type set.
use pnacl_ir::{Type, TypeStore, ir_writer::IrWrite, module::ModuleCtx};

use crate::diagnostic::Reason;

/// `void`, `i1`, `i8`, `i16`, `i32`, `i64`, `f32` and `f64`.
pub fn is_valid_scalar_type(ty: Type) -> bool {
    matches!(
        ty,
        Type::Void
            | Type::I1
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::F32
            | Type::F64
    )
}

/// The 128-bit vectors plus the `i1` vectors produced by comparing them.
pub fn is_valid_vector_type(types: &TypeStore, ty: Type) -> bool {
    let Some((elem, len)) = types.vector_def(ty) else {
        return false;
    };

    matches!(
        (elem, len),
        (Type::I1, 4 | 8 | 16)
            | (Type::I8, 16)
            | (Type::I16, 8)
            | (Type::I32, 4)
            | (Type::F32, 4)
    )
}

/// Integer scalars and integer vectors, excluding `i1` in both.
pub fn is_valid_int_arithmetic_type(types: &TypeStore, ty: Type) -> bool {
    if is_valid_vector_type(types, ty) {
        let elem = types.scalar_of(ty);
        return elem.is_integral() && elem != Type::I1;
    }
    is_valid_scalar_type(ty) && ty.is_integral() && ty != Type::I1
}

/// Picks the reason for an operand failing [`is_valid_int_arithmetic_type`]:
/// integers of a banned width are told apart from non-integers.
pub fn int_arithmetic_type_error(types: &TypeStore, ty: Type) -> Reason {
    if types.scalar_of(ty).is_integral() {
        Reason::InvalidIntArithmeticType
    } else {
        Reason::ExpectsIntArithmeticType
    }
}

/// Types that may cross a call boundary: valid scalars and vectors, with
/// integers widened to at least 32 bits.
pub fn is_valid_param_type(types: &TypeStore, ty: Type) -> bool {
    if !(is_valid_scalar_type(ty) || is_valid_vector_type(types, ty)) {
        return false;
    }
    ty.int_width().is_none_or(|width| width >= 32)
}

pub fn is_valid_function_type(types: &TypeStore, ty: Type) -> bool {
    let Some((args, ret_ty)) = types.func_def(ty) else {
        return false;
    };

    (ret_ty.is_void() || is_valid_param_type(types, ret_ty))
        && args.iter().all(|arg| is_valid_param_type(types, *arg))
}

pub fn is_valid_switch_condition_type(ty: Type) -> bool {
    is_valid_scalar_type(ty) && ty.is_integral() && ty != Type::I1
}

/// Reason for a condition failing [`is_valid_switch_condition_type`].
pub fn switch_condition_type_error(ty: Type) -> Reason {
    if ty == Type::I1 {
        Reason::SwitchOnI1
    } else {
        Reason::SwitchNotOnInteger
    }
}

pub fn type_name(ctx: &ModuleCtx, ty: Type) -> String {
    ty.dump_string(ctx)
}
