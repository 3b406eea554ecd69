//! Pointer provenance.
//!
//! A pointer operand is accepted only when it is *normalized*: an inherent
//! pointer (stack slot, global, function address, intrinsic result) or the
//! direct result of an `inttoptr`/`bitcast`. Constant expressions, `null` and
//! pointer-typed `undef` never qualify.
use pnacl_ir::{
    Function, GlobalRef, InstData, Opcode, Signature, Type, TypeStore, Value, ValueId,
    module::ModuleCtx,
};

use super::types::{is_valid_function_type, is_valid_scalar_type, is_valid_vector_type};

pub fn is_valid_pointer_type(types: &TypeStore, ty: Type) -> bool {
    let Some((pointee, addr_space)) = types.ptr_def(ty) else {
        return false;
    };
    if addr_space != 0 {
        return false;
    }

    if is_valid_scalar_type(pointee) {
        return !matches!(pointee, Type::I1 | Type::Void);
    }
    if is_valid_vector_type(types, pointee) {
        return types.scalar_of(pointee) != Type::I1;
    }
    is_valid_function_type(types, pointee)
}

pub fn is_inherent_ptr(ctx: &ModuleCtx, func: &Function, value: ValueId) -> bool {
    match func.dfg.value(value) {
        Value::Inst { inst, .. } => {
            let data = func.dfg.inst(*inst);
            match data.opcode {
                Opcode::Alloca => true,
                Opcode::Call => intrinsic_callee(ctx, func, data).is_some(),
                _ => false,
            }
        }
        Value::Global {
            gv: GlobalRef::Var(_),
            ..
        } => true,
        Value::Global {
            gv: GlobalRef::Func(func_ref),
            ..
        } => !ctx.func_sig(*func_ref).is_intrinsic(),
        _ => false,
    }
}

pub fn is_normalized_ptr(ctx: &ModuleCtx, func: &Function, value: ValueId) -> bool {
    if !is_valid_pointer_type(ctx.types(), func.dfg.value_ty(value)) {
        return false;
    }

    let is_cast = func
        .dfg
        .value_inst_data(value)
        .is_some_and(|data| matches!(data.opcode, Opcode::IntToPtr | Opcode::BitCast));
    is_cast || is_inherent_ptr(ctx, func, value)
}

/// Returns the signature of the callee when `data` is a direct call to an
/// intrinsic declaration.
pub(crate) fn intrinsic_callee<'a>(
    ctx: &'a ModuleCtx,
    func: &Function,
    data: &InstData,
) -> Option<&'a Signature> {
    let callee = data.callee()?;
    match func.dfg.value(callee) {
        Value::Global {
            gv: GlobalRef::Func(func_ref),
            ..
        } => {
            let sig = ctx.func_sig(*func_ref);
            sig.is_intrinsic().then_some(sig)
        }
        _ => None,
    }
}
