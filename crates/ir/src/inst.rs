//! Instruction definitions.
use std::{fmt, io};

use smallvec::SmallVec;

use crate::{
    Type, ValueId,
    ir_writer::{FuncWriteCtx, IrWrite},
    metadata::{MdKind, MdNode},
};

/// An opaque reference to [`InstData`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct InstId(pub u32);
cranelift_entity::entity_impl!(InstId);

/// Every opcode the IR can represent, including the ones the portable ABI
/// rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    // Terminators.
    Ret,
    Br,
    Switch,
    IndirectBr,
    Invoke,
    Resume,
    Unreachable,

    // Binary operations.
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    FRem,

    // Bitwise binary operations.
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,

    // Memory operations.
    Alloca,
    Load,
    Store,
    GetElementPtr,
    Fence,
    AtomicCmpXchg,
    AtomicRmw,

    // Casts.
    Trunc,
    ZExt,
    SExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    FpTrunc,
    FpExt,
    PtrToInt,
    IntToPtr,
    BitCast,
    AddrSpaceCast,

    // Other operations.
    ICmp,
    FCmp,
    Phi,
    Call,
    Select,
    UserOp1,
    UserOp2,
    VaArg,
    ExtractElement,
    InsertElement,
    ShuffleVector,
    ExtractValue,
    InsertValue,
    LandingPad,
}

impl Opcode {
    pub const ALL: [Opcode; 59] = [
        Opcode::Ret,
        Opcode::Br,
        Opcode::Switch,
        Opcode::IndirectBr,
        Opcode::Invoke,
        Opcode::Resume,
        Opcode::Unreachable,
        Opcode::Add,
        Opcode::FAdd,
        Opcode::Sub,
        Opcode::FSub,
        Opcode::Mul,
        Opcode::FMul,
        Opcode::UDiv,
        Opcode::SDiv,
        Opcode::FDiv,
        Opcode::URem,
        Opcode::SRem,
        Opcode::FRem,
        Opcode::Shl,
        Opcode::LShr,
        Opcode::AShr,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Alloca,
        Opcode::Load,
        Opcode::Store,
        Opcode::GetElementPtr,
        Opcode::Fence,
        Opcode::AtomicCmpXchg,
        Opcode::AtomicRmw,
        Opcode::Trunc,
        Opcode::ZExt,
        Opcode::SExt,
        Opcode::FpToUi,
        Opcode::FpToSi,
        Opcode::UiToFp,
        Opcode::SiToFp,
        Opcode::FpTrunc,
        Opcode::FpExt,
        Opcode::PtrToInt,
        Opcode::IntToPtr,
        Opcode::BitCast,
        Opcode::AddrSpaceCast,
        Opcode::ICmp,
        Opcode::FCmp,
        Opcode::Phi,
        Opcode::Call,
        Opcode::Select,
        Opcode::UserOp1,
        Opcode::UserOp2,
        Opcode::VaArg,
        Opcode::ExtractElement,
        Opcode::InsertElement,
        Opcode::ShuffleVector,
        Opcode::ExtractValue,
        Opcode::InsertValue,
        Opcode::LandingPad,
    ];

    pub fn as_text(self) -> &'static str {
        match self {
            Self::Ret => "ret",
            Self::Br => "br",
            Self::Switch => "switch",
            Self::IndirectBr => "indirectbr",
            Self::Invoke => "invoke",
            Self::Resume => "resume",
            Self::Unreachable => "unreachable",
            Self::Add => "add",
            Self::FAdd => "fadd",
            Self::Sub => "sub",
            Self::FSub => "fsub",
            Self::Mul => "mul",
            Self::FMul => "fmul",
            Self::UDiv => "udiv",
            Self::SDiv => "sdiv",
            Self::FDiv => "fdiv",
            Self::URem => "urem",
            Self::SRem => "srem",
            Self::FRem => "frem",
            Self::Shl => "shl",
            Self::LShr => "lshr",
            Self::AShr => "ashr",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Alloca => "alloca",
            Self::Load => "load",
            Self::Store => "store",
            Self::GetElementPtr => "getelementptr",
            Self::Fence => "fence",
            Self::AtomicCmpXchg => "cmpxchg",
            Self::AtomicRmw => "atomicrmw",
            Self::Trunc => "trunc",
            Self::ZExt => "zext",
            Self::SExt => "sext",
            Self::FpToUi => "fptoui",
            Self::FpToSi => "fptosi",
            Self::UiToFp => "uitofp",
            Self::SiToFp => "sitofp",
            Self::FpTrunc => "fptrunc",
            Self::FpExt => "fpext",
            Self::PtrToInt => "ptrtoint",
            Self::IntToPtr => "inttoptr",
            Self::BitCast => "bitcast",
            Self::AddrSpaceCast => "addrspacecast",
            Self::ICmp => "icmp",
            Self::FCmp => "fcmp",
            Self::Phi => "phi",
            Self::Call => "call",
            Self::Select => "select",
            Self::UserOp1 => "userop1",
            Self::UserOp2 => "userop2",
            Self::VaArg => "va_arg",
            Self::ExtractElement => "extractelement",
            Self::InsertElement => "insertelement",
            Self::ShuffleVector => "shufflevector",
            Self::ExtractValue => "extractvalue",
            Self::InsertValue => "insertvalue",
            Self::LandingPad => "landingpad",
        }
    }

    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::Ret
                | Self::Br
                | Self::Switch
                | Self::IndirectBr
                | Self::Invoke
                | Self::Resume
                | Self::Unreachable
        )
    }

    pub fn is_cast(self) -> bool {
        matches!(
            self,
            Self::Trunc
                | Self::ZExt
                | Self::SExt
                | Self::FpToUi
                | Self::FpToSi
                | Self::UiToFp
                | Self::SiToFp
                | Self::FpTrunc
                | Self::FpExt
                | Self::PtrToInt
                | Self::IntToPtr
                | Self::BitCast
                | Self::AddrSpaceCast
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::FAdd
                | Self::Sub
                | Self::FSub
                | Self::Mul
                | Self::FMul
                | Self::UDiv
                | Self::SDiv
                | Self::FDiv
                | Self::URem
                | Self::SRem
                | Self::FRem
                | Self::Shl
                | Self::LShr
                | Self::AShr
                | Self::And
                | Self::Or
                | Self::Xor
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_text().fmt(f)
    }
}

/// Wrap/exactness refinements on arithmetic instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArithFlags {
    pub nuw: bool,
    pub nsw: bool,
    pub exact: bool,
}

impl ArithFlags {
    pub const NUW: Self = Self {
        nuw: true,
        nsw: false,
        exact: false,
    };
    pub const NSW: Self = Self {
        nuw: false,
        nsw: true,
        exact: false,
    };
    pub const EXACT: Self = Self {
        nuw: false,
        nsw: false,
        exact: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.nuw || self.nsw || self.exact)
    }
}

/// Properties of a `load` or `store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemAccess {
    pub align: u32,
    pub volatile: bool,
    pub atomic: bool,
}

impl MemAccess {
    pub fn aligned(align: u32) -> Self {
        Self {
            align,
            volatile: false,
            atomic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallConv {
    #[default]
    C,
    Fast,
    Cold,
    X86StdCall,
    Other(u32),
}

impl fmt::Display for CallConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => "ccc".fmt(f),
            Self::Fast => "fastcc".fmt(f),
            Self::Cold => "coldcc".fmt(f),
            Self::X86StdCall => "x86_stdcallcc".fmt(f),
            Self::Other(n) => write!(f, "cc{n}"),
        }
    }
}

/// Attributes that may decorate a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallAttr {
    NoUnwind,
    NoReturn,
    ReadNone,
    ReadOnly,
    ZeroExt,
    SignExt,
    InReg,
    ByVal,
}

impl fmt::Display for CallAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoUnwind => "nounwind",
            Self::NoReturn => "noreturn",
            Self::ReadNone => "readnone",
            Self::ReadOnly => "readonly",
            Self::ZeroExt => "zeroext",
            Self::SignExt => "signext",
            Self::InReg => "inreg",
            Self::ByVal => "byval",
        };
        text.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CallAttrs {
    pub cc: CallConv,
    pub attrs: SmallVec<[CallAttr; 2]>,
}

/// Opcode specific data that does not fit into the operand list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum InstDetail {
    #[default]
    None,
    Mem(MemAccess),
    Alloca {
        allocated_ty: Type,
        align: u32,
    },
    Call(CallAttrs),
}

/// Instruction data.
///
/// Operands follow a fixed layout per opcode: `store` is `[value, ptr]`,
/// `call` is `[args.., callee]`, `switch` is `[cond, default, (case, dest)*]`,
/// `phi` is `[(value, block)*]` and `insertelement` is `[vec, elem, idx]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstData {
    pub opcode: Opcode,
    pub args: SmallVec<[ValueId; 4]>,
    /// Result type; `Type::Void` when the instruction produces no value.
    pub ty: Type,
    pub flags: ArithFlags,
    pub detail: InstDetail,
    pub metadata: SmallVec<[(MdKind, MdNode); 2]>,
}

impl InstData {
    pub fn new(opcode: Opcode, args: &[ValueId], ty: Type) -> Self {
        Self {
            opcode,
            args: args.into(),
            ty,
            flags: ArithFlags::default(),
            detail: InstDetail::None,
            metadata: SmallVec::new(),
        }
    }

    pub fn with_flags(mut self, flags: ArithFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_detail(mut self, detail: InstDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn arg(&self, idx: usize) -> Option<ValueId> {
        self.args.get(idx).copied()
    }

    pub fn mem_access(&self) -> Option<&MemAccess> {
        match &self.detail {
            InstDetail::Mem(mem) => Some(mem),
            _ => None,
        }
    }

    pub fn call_attrs(&self) -> Option<&CallAttrs> {
        match &self.detail {
            InstDetail::Call(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Index of the pointer operand of `load`/`store`.
    pub fn ptr_operand_index(&self) -> Option<usize> {
        match self.opcode {
            Opcode::Load => Some(0),
            Opcode::Store => Some(1),
            _ => None,
        }
    }

    /// The callee of a `call`, which is always the last operand.
    pub fn callee(&self) -> Option<ValueId> {
        match self.opcode {
            Opcode::Call => self.args.last().copied(),
            _ => None,
        }
    }

    /// The argument operands of a `call`, excluding the callee.
    pub fn call_args(&self) -> &[ValueId] {
        match self.opcode {
            Opcode::Call if !self.args.is_empty() => &self.args[..self.args.len() - 1],
            _ => &[],
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }
}

impl IrWrite<FuncWriteCtx<'_>> for InstId {
    fn write<W>(&self, w: &mut W, ctx: &FuncWriteCtx) -> io::Result<()>
    where
        W: io::Write,
    {
        let dfg = &ctx.func.dfg;
        let inst = dfg.inst(*self);

        if let Some(result) = dfg.inst_result(*self) {
            write!(w, "v{}.", result.as_u32())?;
            inst.ty.write(w, ctx)?;
            write!(w, " = ")?;
        }

        write!(w, "{}", inst.opcode)?;
        if inst.flags.nuw {
            write!(w, " nuw")?;
        }
        if inst.flags.nsw {
            write!(w, " nsw")?;
        }
        if inst.flags.exact {
            write!(w, " exact")?;
        }

        match &inst.detail {
            InstDetail::None => {}
            InstDetail::Mem(mem) => {
                if mem.atomic {
                    write!(w, " atomic")?;
                }
                if mem.volatile {
                    write!(w, " volatile")?;
                }
            }
            InstDetail::Alloca { allocated_ty, .. } => {
                write!(w, " ")?;
                allocated_ty.write(w, ctx)?;
            }
            InstDetail::Call(attrs) => {
                if attrs.cc != CallConv::C {
                    write!(w, " {}", attrs.cc)?;
                }
                for attr in &attrs.attrs {
                    write!(w, " {attr}")?;
                }
            }
        }

        for arg in &inst.args {
            write!(w, " ")?;
            arg.write(w, ctx)?;
        }

        match &inst.detail {
            InstDetail::Mem(mem) => write!(w, ", align {}", mem.align)?,
            InstDetail::Alloca { align, .. } => write!(w, ", align {align}")?,
            _ => {}
        }

        for (kind, node) in &inst.metadata {
            let name = ctx.module.md_kinds().name(*kind).unwrap_or("<unknown>");
            write!(w, ", !{name} {node}")?;
        }

        write!(w, ";")
    }
}
