//! Intrinsic tables consulted when checking calls.
use pnacl_ir::{IntrinsicId, Type};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// How calls to an allowed intrinsic are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicClass {
    /// Operands are validated like any other intrinsic call.
    Ordinary,
    /// Debug-information intrinsics; calls are accepted without looking at
    /// the operands.
    DebugExempt,
}

/// The set of intrinsics a portable module may call.
#[derive(Debug, Clone)]
pub struct AllowedIntrinsics {
    table: FxHashMap<IntrinsicId, IntrinsicClass>,
}

impl AllowedIntrinsics {
    pub fn empty() -> Self {
        Self {
            table: FxHashMap::default(),
        }
    }

    pub fn with(mut self, id: IntrinsicId, class: IntrinsicClass) -> Self {
        self.table.insert(id, class);
        self
    }

    pub fn class_of(&self, id: IntrinsicId) -> Option<IntrinsicClass> {
        self.table.get(&id).copied()
    }
}

impl Default for AllowedIntrinsics {
    fn default() -> Self {
        use IntrinsicId::*;
        const ORDINARY: [IntrinsicId; 22] = [
            Bswap,
            Ctlz,
            Cttz,
            Ctpop,
            Fabs,
            Sqrt,
            Memcpy,
            Memmove,
            Memset,
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
        ];

        let mut allowed = Self::empty();
        for id in ORDINARY {
            allowed = allowed.with(id, IntrinsicClass::Ordinary);
        }
        allowed
            .with(DbgDeclare, IntrinsicClass::DebugExempt)
            .with(DbgValue, IntrinsicClass::DebugExempt)
    }
}

/// Role of one parameter of an atomic intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRole {
    /// The atomic read-modify-write operation code.
    Rmw,
    /// The address operated on.
    Ptr,
    /// A value operand.
    Val,
    /// A memory order.
    Mem,
}

pub type ParamRoles = SmallVec<[ParamRole; 5]>;

/// Parameter roles of the atomic intrinsics, per overload.
#[derive(Debug, Clone)]
pub struct AtomicIntrinsics {
    table: FxHashMap<(IntrinsicId, Type), ParamRoles>,
}

impl AtomicIntrinsics {
    pub const OVERLOADS: [Type; 4] = [Type::I8, Type::I16, Type::I32, Type::I64];

    pub fn empty() -> Self {
        Self {
            table: FxHashMap::default(),
        }
    }

    pub fn with(mut self, id: IntrinsicId, overload: Type, roles: &[ParamRole]) -> Self {
        self.table.insert((id, overload), roles.into());
        self
    }

    pub fn find(&self, id: IntrinsicId, overload: Type) -> Option<&[ParamRole]> {
        self.table.get(&(id, overload)).map(|roles| roles.as_slice())
    }
}

impl Default for AtomicIntrinsics {
    fn default() -> Self {
        use ParamRole::*;
        let signatures: [(IntrinsicId, &[ParamRole]); 6] = [
            (IntrinsicId::NaclAtomicLoad, &[Ptr, Mem]),
            (IntrinsicId::NaclAtomicStore, &[Val, Ptr, Mem]),
            (IntrinsicId::NaclAtomicRmw, &[Rmw, Ptr, Val, Mem]),
            (IntrinsicId::NaclAtomicCmpxchg, &[Ptr, Val, Val, Mem, Mem]),
            (IntrinsicId::NaclAtomicFence, &[Mem]),
            (IntrinsicId::NaclAtomicFenceAll, &[]),
        ];

        let mut atomics = Self::empty();
        for (id, roles) in signatures {
            for overload in Self::OVERLOADS {
                atomics = atomics.with(id, overload, roles);
            }
        }
        atomics
    }
}
