use pnacl_ir::{TypeStore, Value};

use super::types::{is_valid_scalar_type, is_valid_vector_type};

/// Instruction results, arguments and branch targets are always accepted;
/// the only constants accepted are scalar immediates and scalar `undef`.
pub fn is_valid_scalar_operand(value: &Value) -> bool {
    match value {
        Value::Inst { .. } | Value::Arg { .. } | Value::Block { .. } => true,
        Value::Immediate { ty, .. } | Value::Undef { ty } => is_valid_scalar_type(*ty),
        Value::Null { .. }
        | Value::ConstVector { .. }
        | Value::ConstExpr { .. }
        | Value::Global { .. }
        | Value::Metadata { .. }
        | Value::InlineAsm { .. } => false,
    }
}

/// Constant vectors are never accepted; vector constants must be built with
/// `insertelement` on top of `undef`.
pub fn is_valid_vector_operand(types: &TypeStore, value: &Value) -> bool {
    match value {
        Value::Inst { .. } | Value::Arg { .. } => true,
        Value::Undef { ty } => is_valid_vector_type(types, *ty),
        Value::Immediate { .. }
        | Value::Null { .. }
        | Value::ConstVector { .. }
        | Value::ConstExpr { .. }
        | Value::Global { .. }
        | Value::Block { .. }
        | Value::Metadata { .. }
        | Value::InlineAsm { .. } => false,
    }
}
