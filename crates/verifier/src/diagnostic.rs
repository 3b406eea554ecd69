use std::fmt;

use pnacl_ir::{BlockId, InstId, module::FuncRef};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Broad category of an ABI violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ViolationKind {
    /// The instruction itself is outside the portable subset or malformed.
    Structural,
    /// A pointer or operand does not come from an accepted origin.
    Provenance,
    /// A type outside the portable type set.
    Type,
    /// Memory access, call, atomic or attribute restrictions.
    Abi,
    Metadata,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Structural => "structural",
            Self::Provenance => "provenance",
            Self::Type => "type",
            Self::Abi => "abi",
            Self::Metadata => "metadata",
        };
        s.fmt(f)
    }
}

/// Why an instruction was rejected.
///
/// The reason strings are stable and meant to be matched exactly by tests and
/// tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Reason {
    BannedOpcode,
    UnknownOpcode,
    MissingOperand,

    InvalidIntArithmeticType,
    ExpectsIntArithmeticType,
    BadResultType,
    SwitchNotOnInteger,
    SwitchOnI1,
    NonI8Alloca,
    AllocaSizeNotI32,
    NonI32IntToPtr,
    NonI32PtrToInt,

    BadOperand,
    BadPointer,
    OperandNotInherentPtr,
    BadFunctionCallee,
    BadIntrinsicOperand,
    BadSwitchCondition,
    BadSwitchCase,

    NonConstantVectorIndex,
    OutOfRangeVectorIndex,
    VectorIndexOnNonVector,
    AtomicLoad,
    VolatileLoad,
    AtomicStore,
    VolatileStore,
    BadAlignment,
    InlineAssembly,
    BadCallAttributes,
    BadCallingConvention,
    DisallowedIntrinsic,
    InvalidAtomicIntrinsic,
    InvalidMemoryOrder,
    InvalidAtomicRmwOperation,
    InvalidLockFreeByteSize,
    HasNuw,
    HasNsw,
    HasExact,

    DisallowedMetadata,
}

impl Reason {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::BannedOpcode => 1,
            Self::UnknownOpcode => 2,
            Self::MissingOperand => 3,
            Self::InvalidIntArithmeticType => 100,
            Self::ExpectsIntArithmeticType => 101,
            Self::BadResultType => 102,
            Self::SwitchNotOnInteger => 103,
            Self::SwitchOnI1 => 104,
            Self::NonI8Alloca => 105,
            Self::AllocaSizeNotI32 => 106,
            Self::NonI32IntToPtr => 107,
            Self::NonI32PtrToInt => 108,
            Self::BadOperand => 200,
            Self::BadPointer => 201,
            Self::OperandNotInherentPtr => 202,
            Self::BadFunctionCallee => 203,
            Self::BadIntrinsicOperand => 204,
            Self::BadSwitchCondition => 205,
            Self::BadSwitchCase => 206,
            Self::NonConstantVectorIndex => 300,
            Self::OutOfRangeVectorIndex => 301,
            Self::VectorIndexOnNonVector => 302,
            Self::AtomicLoad => 303,
            Self::VolatileLoad => 304,
            Self::AtomicStore => 305,
            Self::VolatileStore => 306,
            Self::BadAlignment => 307,
            Self::InlineAssembly => 308,
            Self::BadCallAttributes => 309,
            Self::BadCallingConvention => 310,
            Self::DisallowedIntrinsic => 311,
            Self::InvalidAtomicIntrinsic => 312,
            Self::InvalidMemoryOrder => 313,
            Self::InvalidAtomicRmwOperation => 314,
            Self::InvalidLockFreeByteSize => 315,
            Self::HasNuw => 316,
            Self::HasNsw => 317,
            Self::HasExact => 318,
            Self::DisallowedMetadata => 400,
        }
    }

    pub fn code(self) -> String {
        format!("ABI{:04}", self.as_u16())
    }

    pub const fn kind(self) -> ViolationKind {
        match self.as_u16() {
            0..100 => ViolationKind::Structural,
            100..200 => ViolationKind::Type,
            200..300 => ViolationKind::Provenance,
            300..400 => ViolationKind::Abi,
            _ => ViolationKind::Metadata,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BannedOpcode => "bad instruction opcode",
            Self::UnknownOpcode => "unknown instruction opcode",
            Self::MissingOperand => "missing operand",
            Self::InvalidIntArithmeticType => "Invalid integer arithmetic type",
            Self::ExpectsIntArithmeticType => "Expects integer arithmetic type",
            Self::BadResultType => "bad result type",
            Self::SwitchNotOnInteger => "switch not on integer type",
            Self::SwitchOnI1 => "switch on i1",
            Self::NonI8Alloca => "non-i8 alloca",
            Self::AllocaSizeNotI32 => "alloca array size is not i32",
            Self::NonI32IntToPtr => "non-i32 inttoptr",
            Self::NonI32PtrToInt => "non-i32 ptrtoint",
            Self::BadOperand => "bad operand",
            Self::BadPointer => "bad pointer",
            Self::OperandNotInherentPtr => "operand not InherentPtr",
            Self::BadFunctionCallee => "bad function callee operand",
            Self::BadIntrinsicOperand => "bad intrinsic operand",
            Self::BadSwitchCondition => "bad switch condition",
            Self::BadSwitchCase => "bad switch case",
            Self::NonConstantVectorIndex => "non-constant vector insert/extract index",
            Self::OutOfRangeVectorIndex => "out of range vector insert/extract index",
            Self::VectorIndexOnNonVector => "vector insert/extract on non-vector operand",
            Self::AtomicLoad => "atomic load",
            Self::VolatileLoad => "volatile load",
            Self::AtomicStore => "atomic store",
            Self::VolatileStore => "volatile store",
            Self::BadAlignment => "bad alignment",
            Self::InlineAssembly => "inline assembly",
            Self::BadCallAttributes => "bad call attributes",
            Self::BadCallingConvention => "bad calling convention",
            Self::DisallowedIntrinsic => "disallowed intrinsic",
            Self::InvalidAtomicIntrinsic => "invalid atomic intrinsic",
            Self::InvalidMemoryOrder => "invalid memory order",
            Self::InvalidAtomicRmwOperation => "invalid atomicRMW operation",
            Self::InvalidLockFreeByteSize => "invalid atomic lock-free byte size",
            Self::HasNuw => "has \"nuw\" attribute",
            Self::HasNsw => "has \"nsw\" attribute",
            Self::HasExact => "has \"exact\" attribute",
            Self::DisallowedMetadata => "disallowed instruction metadata",
        }
    }
}

impl Reason {
    /// What the rejected operand or result should have been, for reasons
    /// that constrain a single type.
    pub const fn expected_type(self) -> Option<&'static str> {
        match self {
            Self::InvalidIntArithmeticType | Self::ExpectsIntArithmeticType => {
                Some("i8, i16, i32, i64 or a vector of them")
            }
            Self::NonI32IntToPtr => Some("i32 source operand"),
            Self::NonI32PtrToInt => Some("i32 result"),
            Self::AllocaSizeNotI32 => Some("i32 array size"),
            Self::SwitchOnI1 | Self::SwitchNotOnInteger => Some("i8, i16, i32 or i64 condition"),
            _ => None,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Function(FuncRef),
    Inst {
        func: FuncRef,
        block: Option<BlockId>,
        inst: InstId,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(func) => write!(f, "func{}", func.as_u32()),
            Self::Inst { func, block, inst } => {
                if let Some(block) = block {
                    write!(f, "func{}:{}:inst{}", func.as_u32(), block, inst.as_u32())
                } else {
                    write!(f, "func{}:inst{}", func.as_u32(), inst.as_u32())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticContext {
    pub function_name: String,
    pub inst_text: Option<String>,
    /// Set for `bad result type` only.
    pub type_name: Option<String>,
    /// Resolved `!kind` text, set for metadata violations only.
    pub metadata_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Diagnostic {
    pub reason: Reason,
    /// The rendered single-line message.
    pub message: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub primary: Location,
    pub notes: Vec<Note>,
    pub context: DiagnosticContext,
}

impl Diagnostic {
    /// A rejected instruction:
    /// `Function <name> disallowed: <reason>: [<type> ]<inst>`.
    pub fn disallowed(reason: Reason, context: DiagnosticContext, primary: Location) -> Self {
        let mut message = format!(
            "Function {} disallowed: {}:",
            context.function_name, reason
        );
        if let Some(type_name) = &context.type_name {
            message.push(' ');
            message.push_str(type_name);
        }
        if let Some(inst_text) = &context.inst_text {
            message.push(' ');
            message.push_str(inst_text);
        }

        Self {
            reason,
            message,
            primary,
            notes: Vec::new(),
            context,
        }
    }

    /// A metadata attachment outside the whitelist:
    /// `Function <name> has disallowed instruction metadata: !<kind>`.
    pub fn disallowed_metadata(context: DiagnosticContext, primary: Location) -> Self {
        let kind = context.metadata_kind.as_deref().unwrap_or("!<unknown>");
        let message = format!(
            "Function {} has {}: {kind}",
            context.function_name,
            Reason::DisallowedMetadata
        );

        Self {
            reason: Reason::DisallowedMetadata,
            message,
            primary,
            notes: Vec::new(),
            context,
        }
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            message: message.into(),
        });
        self
    }

    pub fn code(&self) -> String {
        self.reason.code()
    }

    pub fn kind(&self) -> ViolationKind {
        self.reason.kind()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cranelift_entity::EntityRef;

    use super::*;

    fn ctx(inst_text: &str) -> DiagnosticContext {
        DiagnosticContext {
            function_name: "f".to_string(),
            inst_text: Some(inst_text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn codes_are_unique_and_grouped() {
        let reasons = [
            Reason::BannedOpcode,
            Reason::MissingOperand,
            Reason::BadResultType,
            Reason::BadPointer,
            Reason::InvalidMemoryOrder,
            Reason::DisallowedMetadata,
        ];
        assert_eq!(reasons[0].code(), "ABI0001");
        assert_eq!(reasons[0].kind(), ViolationKind::Structural);
        assert_eq!(reasons[2].kind(), ViolationKind::Type);
        assert_eq!(reasons[3].kind(), ViolationKind::Provenance);
        assert_eq!(reasons[4].kind(), ViolationKind::Abi);
        assert_eq!(reasons[5].kind(), ViolationKind::Metadata);
    }

    #[test]
    fn disallowed_message_format() {
        let func = FuncRef::new(0);
        let loc = Location::Function(func);
        let diag = Diagnostic::disallowed(Reason::BadOperand, ctx("ret undef.i128;"), loc.clone());
        assert_eq!(
            diag.to_string(),
            "Function f disallowed: bad operand: ret undef.i128;"
        );

        let mut with_ty = ctx("v1.i128 = add v0 v0;");
        with_ty.type_name = Some("i128".to_string());
        let diag = Diagnostic::disallowed(Reason::BadResultType, with_ty, loc);
        assert_eq!(
            diag.to_string(),
            "Function f disallowed: bad result type: i128 v1.i128 = add v0 v0;"
        );
    }

    #[test]
    fn metadata_message_format() {
        let context = DiagnosticContext {
            function_name: "g".to_string(),
            metadata_kind: Some("!tbaa".to_string()),
            ..Default::default()
        };
        let diag = Diagnostic::disallowed_metadata(context, Location::Function(FuncRef::new(1)))
            .with_note("allowed kinds: dbg");
        assert_eq!(
            diag.to_string(),
            "Function g has disallowed instruction metadata: !tbaa\n  note: allowed kinds: dbg"
        );
    }
}
