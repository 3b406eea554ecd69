//! The per-opcode rule table.
use pnacl_ir::{CallConv, InstData, InstDetail, IntrinsicId, MemAccess, Opcode, Type, Value, ValueId};

use super::{
    FuncVerifier, atomic,
    operand::{is_valid_scalar_operand, is_valid_vector_operand},
    pointer::{intrinsic_callee, is_inherent_ptr, is_normalized_ptr},
    types::{
        int_arithmetic_type_error, is_valid_int_arithmetic_type, is_valid_switch_condition_type,
        switch_condition_type_error,
    },
};
use crate::{diagnostic::Reason, intrinsics::IntrinsicClass};

/// What the opcode rule decided before the generic operand pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Every operand goes through the generic pass.
    Accept,
    /// The operand at this index was checked as a pointer and is exempt from
    /// the generic pass.
    AcceptWithPointerOperand(usize),
    /// The operand types were checked by the rule itself; the generic pass
    /// is skipped but the arithmetic flag bans still apply.
    AcceptSkipOperandChecks,
    /// All operands were checked by the rule itself; the generic pass and
    /// the arithmetic flag bans are skipped.
    AcceptSkipDefaultChecks,
    Reject(Reason),
}

type RuleResult = Result<RuleOutcome, Reason>;

impl FuncVerifier<'_> {
    /// Runs the opcode rule, the generic operand pass (unless the rule
    /// skipped it) and the arithmetic flag bans, returning the first
    /// violation found.
    pub(super) fn check_instruction(&self, data: &InstData) -> Option<Reason> {
        let operand_pass = match self.check_opcode(data) {
            RuleOutcome::Reject(reason) => return Some(reason),
            RuleOutcome::AcceptSkipDefaultChecks => return None,
            RuleOutcome::AcceptSkipOperandChecks => None,
            RuleOutcome::Accept => Some(None),
            RuleOutcome::AcceptWithPointerOperand(idx) => Some(Some(idx)),
        };

        if let Some(ptr_operand) = operand_pass {
            let bad_operand = data
                .args
                .iter()
                .enumerate()
                .any(|(idx, arg)| Some(idx) != ptr_operand && !self.is_valid_operand(*arg));
            if bad_operand {
                return Some(Reason::BadOperand);
            }
        }

        if data.flags.nuw {
            Some(Reason::HasNuw)
        } else if data.flags.nsw {
            Some(Reason::HasNsw)
        } else if data.flags.exact {
            Some(Reason::HasExact)
        } else {
            None
        }
    }

    pub(super) fn check_opcode(&self, data: &InstData) -> RuleOutcome {
        self.opcode_rule(data).unwrap_or_else(RuleOutcome::Reject)
    }

    fn opcode_rule(&self, data: &InstData) -> RuleResult {
        match data.opcode {
            Opcode::GetElementPtr
            | Opcode::VaArg
            | Opcode::Invoke
            | Opcode::LandingPad
            | Opcode::Resume
            | Opcode::IndirectBr
            | Opcode::ShuffleVector
            | Opcode::ExtractValue
            | Opcode::InsertValue
            | Opcode::AtomicCmpXchg
            | Opcode::AtomicRmw
            | Opcode::Fence => Err(Reason::BannedOpcode),

            Opcode::AddrSpaceCast | Opcode::UserOp1 | Opcode::UserOp2 => {
                Err(Reason::UnknownOpcode)
            }

            Opcode::Ret
            | Opcode::Br
            | Opcode::Unreachable
            | Opcode::FAdd
            | Opcode::FSub
            | Opcode::FMul
            | Opcode::FDiv
            | Opcode::FRem
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Trunc
            | Opcode::ZExt
            | Opcode::SExt
            | Opcode::FpTrunc
            | Opcode::FpExt
            | Opcode::FpToUi
            | Opcode::FpToSi
            | Opcode::UiToFp
            | Opcode::SiToFp
            | Opcode::FCmp
            | Opcode::Phi
            | Opcode::Select => Ok(RuleOutcome::Accept),

            Opcode::ICmp
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::UDiv
            | Opcode::SDiv
            | Opcode::URem
            | Opcode::SRem
            | Opcode::Shl
            | Opcode::LShr
            | Opcode::AShr => self.check_int_arithmetic(data),

            Opcode::ExtractElement => self.check_vector_index(data, 1),
            Opcode::InsertElement => self.check_vector_index(data, 2),

            Opcode::Load => {
                let mem = self.mem_access(data);
                if mem.atomic {
                    return Err(Reason::AtomicLoad);
                }
                if mem.volatile {
                    return Err(Reason::VolatileLoad);
                }
                self.check_memory_access(data, 0, mem, data.ty)
            }
            Opcode::Store => {
                let mem = self.mem_access(data);
                if mem.atomic {
                    return Err(Reason::AtomicStore);
                }
                if mem.volatile {
                    return Err(Reason::VolatileStore);
                }
                let stored_ty = self.value_ty(self.operand(data, 0)?);
                self.check_memory_access(data, 1, mem, stored_ty)
            }

            Opcode::BitCast => {
                if !self.ctx.types().is_ptr(data.ty) {
                    return Ok(RuleOutcome::Accept);
                }
                if !is_inherent_ptr(self.ctx, self.func, self.operand(data, 0)?) {
                    return Err(Reason::OperandNotInherentPtr);
                }
                Ok(RuleOutcome::AcceptWithPointerOperand(0))
            }
            Opcode::IntToPtr => {
                let src_ty = self.value_ty(self.operand(data, 0)?);
                if src_ty != self.ctx.data_layout.int_ptr_type() {
                    return Err(Reason::NonI32IntToPtr);
                }
                Ok(RuleOutcome::Accept)
            }
            Opcode::PtrToInt => {
                if !is_inherent_ptr(self.ctx, self.func, self.operand(data, 0)?) {
                    return Err(Reason::OperandNotInherentPtr);
                }
                if data.ty != self.ctx.data_layout.int_ptr_type() {
                    return Err(Reason::NonI32PtrToInt);
                }
                Ok(RuleOutcome::AcceptWithPointerOperand(0))
            }

            Opcode::Alloca => {
                let allocated_ty = match data.detail {
                    InstDetail::Alloca { allocated_ty, .. } => allocated_ty,
                    _ => Type::Void,
                };
                if allocated_ty != Type::I8 {
                    return Err(Reason::NonI8Alloca);
                }
                if self.value_ty(self.operand(data, 0)?) != Type::I32 {
                    return Err(Reason::AllocaSizeNotI32);
                }
                Ok(RuleOutcome::Accept)
            }

            Opcode::Call => self.check_call(data),
            Opcode::Switch => self.check_switch(data),
        }
    }

    fn check_int_arithmetic(&self, data: &InstData) -> RuleResult {
        let ty = self.value_ty(self.operand(data, 0)?);
        let types = self.ctx.types();
        if !is_valid_int_arithmetic_type(types, ty) {
            return Err(int_arithmetic_type_error(types, ty));
        }
        Ok(RuleOutcome::AcceptSkipOperandChecks)
    }

    fn check_vector_index(&self, data: &InstData, idx_operand: usize) -> RuleResult {
        let vec = self.operand(data, 0)?;
        let idx = self.operand(data, idx_operand)?;

        let Some(idx) = self.func.dfg.value(idx).as_int_imm() else {
            return Err(Reason::NonConstantVectorIndex);
        };
        let Some((_, len)) = self.ctx.types().vector_def(self.value_ty(vec)) else {
            return Err(Reason::VectorIndexOnNonVector);
        };
        if idx >= u64::from(len) {
            return Err(Reason::OutOfRangeVectorIndex);
        }
        Ok(RuleOutcome::Accept)
    }

    fn check_memory_access(
        &self,
        data: &InstData,
        ptr_idx: usize,
        mem: MemAccess,
        accessed_ty: Type,
    ) -> RuleResult {
        let ptr = self.operand(data, ptr_idx)?;
        if !is_normalized_ptr(self.ctx, self.func, ptr) {
            return Err(Reason::BadPointer);
        }

        let allowed = self.cfg.alignment.is_allowed_alignment(
            self.ctx,
            &self.ctx.data_layout,
            mem.align,
            accessed_ty,
        );
        if !allowed {
            return Err(Reason::BadAlignment);
        }
        Ok(RuleOutcome::AcceptWithPointerOperand(ptr_idx))
    }

    fn check_call(&self, data: &InstData) -> RuleResult {
        let callee = data.callee().ok_or(Reason::MissingOperand)?;
        if matches!(self.func.dfg.value(callee), Value::InlineAsm { .. }) {
            return Err(Reason::InlineAssembly);
        }

        let attrs = data.call_attrs().cloned().unwrap_or_default();
        if !attrs.attrs.is_empty() {
            return Err(Reason::BadCallAttributes);
        }
        if attrs.cc != CallConv::C {
            return Err(Reason::BadCallingConvention);
        }

        if let Some(sig) = intrinsic_callee(self.ctx, self.func, data) {
            let class = sig.intrinsic_id().and_then(|id| {
                self.cfg
                    .allowed_intrinsics
                    .class_of(id)
                    .map(|class| (id, class))
            });
            return match class {
                Some((_, IntrinsicClass::DebugExempt)) => Ok(RuleOutcome::AcceptSkipDefaultChecks),
                Some((id, IntrinsicClass::Ordinary)) => self.check_intrinsic_call(id, data),
                None => Err(Reason::DisallowedIntrinsic),
            };
        }

        if !is_normalized_ptr(self.ctx, self.func, callee) {
            return Err(Reason::BadFunctionCallee);
        }
        Ok(RuleOutcome::AcceptWithPointerOperand(data.args.len() - 1))
    }

    fn check_intrinsic_call(&self, id: IntrinsicId, data: &InstData) -> RuleResult {
        let args = data.call_args();
        let types = self.ctx.types();
        for arg in args {
            let value = self.func.dfg.value(*arg);
            let valid = is_valid_scalar_operand(value)
                || is_valid_vector_operand(types, value)
                || is_normalized_ptr(self.ctx, self.func, *arg);
            if !valid {
                return Err(Reason::BadIntrinsicOperand);
            }
        }

        if id.is_mem_intrinsic() {
            let align = args.get(3).ok_or(Reason::MissingOperand)?;
            if self.func.dfg.value(*align).as_int_imm() != Some(1) {
                return Err(Reason::BadAlignment);
            }
        }

        let constants: Vec<Option<u64>> = args
            .iter()
            .map(|arg| self.func.dfg.value(*arg).as_int_imm())
            .collect();

        if id.is_atomic() {
            let roles = self
                .cfg
                .atomic_intrinsics
                .find(id, Type::I32)
                .ok_or(Reason::InvalidAtomicIntrinsic)?;
            if !atomic::check_memory_orders(id, roles, &constants) {
                return Err(Reason::InvalidMemoryOrder);
            }
            if !atomic::check_rmw_operations(roles, &constants) {
                return Err(Reason::InvalidAtomicRmwOperation);
            }
        } else if id == IntrinsicId::NaclAtomicIsLockFree {
            let returns_integer = data.ty.is_integral();
            if !atomic::check_lock_free(returns_integer, constants.first().copied().flatten()) {
                return Err(Reason::InvalidLockFreeByteSize);
            }
        }

        Ok(RuleOutcome::AcceptSkipDefaultChecks)
    }

    fn check_switch(&self, data: &InstData) -> RuleResult {
        let cond = self.operand(data, 0)?;
        self.operand(data, 1)?;

        if !is_valid_scalar_operand(self.func.dfg.value(cond)) {
            return Err(Reason::BadSwitchCondition);
        }
        let cond_ty = self.value_ty(cond);
        if !is_valid_switch_condition_type(cond_ty) {
            return Err(switch_condition_type_error(cond_ty));
        }

        let bad_case = data.args[2..]
            .iter()
            .step_by(2)
            .any(|case| !is_valid_scalar_operand(self.func.dfg.value(*case)));
        if bad_case {
            return Err(Reason::BadSwitchCase);
        }
        Ok(RuleOutcome::AcceptSkipDefaultChecks)
    }

    fn is_valid_operand(&self, value: ValueId) -> bool {
        let value = self.func.dfg.value(value);
        is_valid_scalar_operand(value) || is_valid_vector_operand(self.ctx.types(), value)
    }

    fn operand(&self, data: &InstData, idx: usize) -> Result<ValueId, Reason> {
        data.arg(idx).ok_or(Reason::MissingOperand)
    }

    /// Memory instructions without access data are treated as declaring
    /// alignment 0.
    fn mem_access(&self, data: &InstData) -> MemAccess {
        data.mem_access().copied().unwrap_or(MemAccess::aligned(0))
    }

    fn value_ty(&self, value: ValueId) -> Type {
        self.func.dfg.value_ty(value)
    }
}
