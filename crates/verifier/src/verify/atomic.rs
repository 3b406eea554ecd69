//! Constant-argument rules for the `llvm.nacl.atomic.*` intrinsics.
use std::fmt;

use pnacl_ir::IntrinsicId;

use crate::intrinsics::ParamRole;

/// Memory orders as encoded in the intrinsic's order arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOrder {
    Relaxed,
    Consume,
    Acquire,
    Release,
    AcqRel,
    SeqCst,
}

impl MemoryOrder {
    pub const ALL: [Self; 6] = [
        Self::Relaxed,
        Self::Consume,
        Self::Acquire,
        Self::Release,
        Self::AcqRel,
        Self::SeqCst,
    ];

    /// 0 and anything past `seq_cst` (6) are invalid encodings.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Relaxed),
            2 => Some(Self::Consume),
            3 => Some(Self::Acquire),
            4 => Some(Self::Release),
            5 => Some(Self::AcqRel),
            6 => Some(Self::SeqCst),
            _ => None,
        }
    }

    pub fn as_u64(self) -> u64 {
        match self {
            Self::Relaxed => 1,
            Self::Consume => 2,
            Self::Acquire => 3,
            Self::Release => 4,
            Self::AcqRel => 5,
            Self::SeqCst => 6,
        }
    }

    /// Partial order on ordering strength:
    /// `relaxed < consume < acquire < acq_rel < seq_cst` and
    /// `relaxed < release < acq_rel`. `release` is incomparable with
    /// `consume` and `acquire`.
    pub fn is_weaker_or_equal(self, other: Self) -> bool {
        use MemoryOrder::*;
        if self == other {
            return true;
        }
        match self {
            Relaxed => true,
            Consume => matches!(other, Acquire | AcqRel | SeqCst),
            Acquire | Release => matches!(other, AcqRel | SeqCst),
            AcqRel => other == SeqCst,
            SeqCst => false,
        }
    }
}

impl fmt::Display for MemoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Relaxed => "relaxed",
            Self::Consume => "consume",
            Self::Acquire => "acquire",
            Self::Release => "release",
            Self::AcqRel => "acq_rel",
            Self::SeqCst => "seq_cst",
        };
        s.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RmwOperation {
    Add,
    Sub,
    Or,
    And,
    Xor,
    Exchange,
}

impl RmwOperation {
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Add),
            2 => Some(Self::Sub),
            3 => Some(Self::Or),
            4 => Some(Self::And),
            5 => Some(Self::Xor),
            6 => Some(Self::Exchange),
            _ => None,
        }
    }
}

/// Checks every memory-order parameter of an atomic intrinsic call.
///
/// `args` holds the integer constant passed at each argument position, or
/// `None` when the argument is missing or not an integer constant.
pub fn check_memory_orders(id: IntrinsicId, roles: &[ParamRole], args: &[Option<u64>]) -> bool {
    // For cmpxchg the first order seen is the success order.
    let mut success: Option<MemoryOrder> = None;

    for (idx, role) in roles.iter().enumerate() {
        if *role != ParamRole::Mem {
            continue;
        }

        let Some(order) = args
            .get(idx)
            .copied()
            .flatten()
            .and_then(MemoryOrder::from_u64)
        else {
            return false;
        };

        if matches!(order, MemoryOrder::Relaxed | MemoryOrder::Consume) {
            return false;
        }

        let allowed = match id {
            IntrinsicId::NaclAtomicLoad => {
                !matches!(order, MemoryOrder::Release | MemoryOrder::AcqRel)
            }
            IntrinsicId::NaclAtomicStore => matches!(order, MemoryOrder::Release | MemoryOrder::SeqCst),
            IntrinsicId::NaclAtomicCmpxchg => match success {
                None => {
                    success = Some(order);
                    true
                }
                Some(success) => {
                    !matches!(order, MemoryOrder::Release | MemoryOrder::AcqRel)
                        && order.is_weaker_or_equal(success)
                }
            },
            _ => true,
        };
        if !allowed {
            return false;
        }
    }

    true
}

/// Every RMW-operation parameter must be a constant within the enumeration.
pub fn check_rmw_operations(roles: &[ParamRole], args: &[Option<u64>]) -> bool {
    roles
        .iter()
        .enumerate()
        .filter(|(_, role)| **role == ParamRole::Rmw)
        .all(|(idx, _)| {
            args.get(idx)
                .copied()
                .flatten()
                .and_then(RmwOperation::from_u64)
                .is_some()
        })
}

/// `nacl.atomic.is.lock.free` must return an integer and query a constant
/// byte size of 1, 2, 4 or 8.
pub fn check_lock_free(returns_integer: bool, byte_size: Option<u64>) -> bool {
    returns_integer && matches!(byte_size, Some(1 | 2 | 4 | 8))
}
