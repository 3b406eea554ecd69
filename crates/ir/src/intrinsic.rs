//! Identities of the intrinsic functions known to the IR.
//!
//! An intrinsic is a function declaration whose name starts with `llvm.`.
//! Overloaded intrinsics carry a type suffix (`llvm.bswap.i32`,
//! `llvm.nacl.atomic.load.i64`) which is not part of the identity.
use std::fmt;

pub const INTRINSIC_PREFIX: &str = "llvm.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntrinsicId {
    Bswap,
    Ctlz,
    Cttz,
    Ctpop,
    Fabs,
    Sqrt,
    Memcpy,
    Memmove,
    Memset,
    DbgDeclare,
    DbgValue,
    NaclAtomicLoad,
    NaclAtomicStore,
    NaclAtomicRmw,
    NaclAtomicCmpxchg,
    NaclAtomicFence,
    NaclAtomicFenceAll,
    NaclAtomicIsLockFree,
    NaclReadTp,
    NaclSetjmp,
    NaclLongjmp,
    Stacksave,
    Stackrestore,
    Trap,
    Frameaddress,
    Returnaddress,
    Prefetch,
    VaStart,
    VaEnd,
    VaCopy,
}

impl IntrinsicId {
    pub const ALL: [Self; 30] = [
        Self::Bswap,
        Self::Ctlz,
        Self::Cttz,
        Self::Ctpop,
        Self::Fabs,
        Self::Sqrt,
        Self::Memcpy,
        Self::Memmove,
        Self::Memset,
        Self::DbgDeclare,
        Self::DbgValue,
        Self::NaclAtomicLoad,
        Self::NaclAtomicStore,
        Self::NaclAtomicRmw,
        Self::NaclAtomicCmpxchg,
        Self::NaclAtomicFence,
        Self::NaclAtomicFenceAll,
        Self::NaclAtomicIsLockFree,
        Self::NaclReadTp,
        Self::NaclSetjmp,
        Self::NaclLongjmp,
        Self::Stacksave,
        Self::Stackrestore,
        Self::Trap,
        Self::Frameaddress,
        Self::Returnaddress,
        Self::Prefetch,
        Self::VaStart,
        Self::VaEnd,
        Self::VaCopy,
    ];

    /// The intrinsic name without the `llvm.` prefix and overload suffix.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::Bswap => "bswap",
            Self::Ctlz => "ctlz",
            Self::Cttz => "cttz",
            Self::Ctpop => "ctpop",
            Self::Fabs => "fabs",
            Self::Sqrt => "sqrt",
            Self::Memcpy => "memcpy",
            Self::Memmove => "memmove",
            Self::Memset => "memset",
            Self::DbgDeclare => "dbg.declare",
            Self::DbgValue => "dbg.value",
            Self::NaclAtomicLoad => "nacl.atomic.load",
            Self::NaclAtomicStore => "nacl.atomic.store",
            Self::NaclAtomicRmw => "nacl.atomic.rmw",
            Self::NaclAtomicCmpxchg => "nacl.atomic.cmpxchg",
            Self::NaclAtomicFence => "nacl.atomic.fence",
            Self::NaclAtomicFenceAll => "nacl.atomic.fence.all",
            Self::NaclAtomicIsLockFree => "nacl.atomic.is.lock.free",
            Self::NaclReadTp => "nacl.read.tp",
            Self::NaclSetjmp => "nacl.setjmp",
            Self::NaclLongjmp => "nacl.longjmp",
            Self::Stacksave => "stacksave",
            Self::Stackrestore => "stackrestore",
            Self::Trap => "trap",
            Self::Frameaddress => "frameaddress",
            Self::Returnaddress => "returnaddress",
            Self::Prefetch => "prefetch",
            Self::VaStart => "vastart",
            Self::VaEnd => "vaend",
            Self::VaCopy => "vacopy",
        }
    }

    /// Resolves a function name to an intrinsic identity.
    ///
    /// The longest matching base name wins, so `llvm.nacl.atomic.fence.all`
    /// resolves to `NaclAtomicFenceAll` rather than `NaclAtomicFence`.
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(INTRINSIC_PREFIX)?;
        Self::ALL
            .iter()
            .copied()
            .filter(|id| {
                let base = id.base_name();
                rest == base
                    || rest
                        .strip_prefix(base)
                        .is_some_and(|suffix| suffix.starts_with('.'))
            })
            .max_by_key(|id| id.base_name().len())
    }

    /// Memory intrinsics take an alignment as their fourth argument.
    pub fn is_mem_intrinsic(self) -> bool {
        matches!(self, Self::Memcpy | Self::Memmove | Self::Memset)
    }

    pub fn is_atomic(self) -> bool {
        matches!(
            self,
            Self::NaclAtomicLoad
                | Self::NaclAtomicStore
                | Self::NaclAtomicRmw
                | Self::NaclAtomicCmpxchg
                | Self::NaclAtomicFence
                | Self::NaclAtomicFenceAll
        )
    }
}

impl fmt::Display for IntrinsicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{INTRINSIC_PREFIX}{}", self.base_name())
    }
}

pub fn is_intrinsic_name(name: &str) -> bool {
    name.starts_with(INTRINSIC_PREFIX)
}
