//! Function-level portable ABI verification.
pub mod atomic;
pub mod inst_rules;
pub mod metadata;
pub mod operand;
pub mod pointer;
pub mod types;

use pnacl_ir::{
    BlockId, Function, InstData, InstId, Module, Opcode,
    ir_writer::{FuncWriteCtx, IrWrite},
    module::{FuncRef, ModuleCtx},
};
use rayon::prelude::*;

use crate::{
    config::VerifierConfig,
    diagnostic::{Diagnostic, DiagnosticContext, Location, Reason},
    report::VerificationReport,
    sink::{ErrorReporter, FatalDiagnostics},
};

use self::{
    pointer::is_normalized_ptr,
    types::{is_valid_scalar_type, is_valid_vector_type, type_name},
};

/// Verifies every function body of `module`.
///
/// Functions are verified in parallel and the reports are merged in function
/// reference order, so the result does not depend on scheduling. The merged
/// report holds at most `cfg.max_diagnostics` entries unless that is 0.
pub fn verify_module(module: &Module, cfg: &VerifierConfig) -> VerificationReport {
    let mut report = VerificationReport::default();

    let funcs: Vec<_> = module.funcs.iter().collect();
    let mut func_reports: Vec<_> = funcs
        .into_par_iter()
        .map(|(func_ref, func)| (*func_ref, verify_function(&module.ctx, *func_ref, func, cfg)))
        .collect();

    func_reports.sort_by_key(|(func_ref, _)| func_ref.as_u32());
    for (_, func_report) in func_reports {
        report.extend_with_limit(func_report.diagnostics, cfg.max_diagnostics);
        if cfg.max_diagnostics != 0 && report.len() >= cfg.max_diagnostics {
            break;
        }
    }

    report
}

pub fn verify_function(
    ctx: &ModuleCtx,
    func_ref: FuncRef,
    func: &Function,
    cfg: &VerifierConfig,
) -> VerificationReport {
    let mut verifier = FuncVerifier::new(ctx, func_ref, func, cfg);
    verifier.run();
    verifier.report
}

/// Verifies `func` and feeds the diagnostics to `reporter`.
///
/// Returns `Ok(false)` since the IR is never modified, or the fatal error
/// once the reporter's threshold is reached.
pub fn run_on_function(
    ctx: &ModuleCtx,
    func_ref: FuncRef,
    func: &Function,
    cfg: &VerifierConfig,
    reporter: &mut ErrorReporter,
) -> Result<bool, FatalDiagnostics> {
    reporter.add_report(verify_function(ctx, func_ref, func, cfg));
    reporter.check_for_fatal_errors()?;
    Ok(false)
}

pub fn verify_module_or_panic(module: &Module, cfg: &VerifierConfig) {
    let report = verify_module(module, cfg);
    if report.has_errors() {
        eprintln!("PNACL_ABI_VERIFY_FAILURE: module");
        eprintln!("{report}");
        panic!("PNACL_ABI_VERIFY_FAILURE");
    }
}

pub fn verify_function_or_panic(
    ctx: &ModuleCtx,
    func_ref: FuncRef,
    func: &Function,
    cfg: &VerifierConfig,
) {
    let report = verify_function(ctx, func_ref, func, cfg);
    if report.has_errors() {
        eprintln!(
            "PNACL_ABI_VERIFY_FAILURE: function {}",
            ctx.func_sig(func_ref).name()
        );
        eprintln!("{report}");
        panic!("PNACL_ABI_VERIFY_FAILURE");
    }
}

pub(crate) struct FuncVerifier<'a> {
    ctx: &'a ModuleCtx,
    func_ref: FuncRef,
    func: &'a Function,
    cfg: &'a VerifierConfig,
    report: VerificationReport,
}

impl<'a> FuncVerifier<'a> {
    fn new(
        ctx: &'a ModuleCtx,
        func_ref: FuncRef,
        func: &'a Function,
        cfg: &'a VerifierConfig,
    ) -> Self {
        Self {
            ctx,
            func_ref,
            func,
            cfg,
            report: VerificationReport::default(),
        }
    }

    fn run(&mut self) {
        let func = self.func;
        for block in func.layout.iter_block() {
            for inst in func.layout.iter_inst(block) {
                self.verify_inst(block, inst);
            }
        }

        log::debug!(
            "verified `{}`: {} instruction(s), {} violation(s)",
            self.func_name(),
            func.dfg.num_insts(),
            self.report.len()
        );
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        self.report.push(diagnostic);
    }

    fn verify_inst(&mut self, block: BlockId, inst: InstId) {
        let func = self.func;
        let data = func.dfg.inst(inst);
        log::trace!("checking {} in {block}", data.opcode);

        let violation = match self.check_instruction(data) {
            Some(reason) => Some((reason, None)),
            None if !self.has_valid_result(inst, data) => {
                Some((Reason::BadResultType, Some(type_name(self.ctx, data.ty))))
            }
            None => None,
        };

        if let Some((reason, ty_name)) = violation {
            let context = DiagnosticContext {
                type_name: ty_name,
                ..self.context(inst)
            };
            let mut diagnostic =
                Diagnostic::disallowed(reason, context, self.location(block, inst));
            if let Some(expected) = reason.expected_type() {
                diagnostic = diagnostic.with_note(format!("expected {expected}"));
            }
            self.emit(diagnostic);
        }

        self.check_metadata(block, inst, data);
    }

    /// Results must be valid scalars or vectors, normalized pointers, or the
    /// pointer produced by `alloca`.
    fn has_valid_result(&self, inst: InstId, data: &InstData) -> bool {
        let types = self.ctx.types();
        if is_valid_scalar_type(data.ty)
            || is_valid_vector_type(types, data.ty)
            || data.opcode == Opcode::Alloca
        {
            return true;
        }

        self.func
            .dfg
            .inst_result(inst)
            .is_some_and(|result| is_normalized_ptr(self.ctx, self.func, result))
    }

    fn check_metadata(&mut self, block: BlockId, inst: InstId, data: &InstData) {
        let kinds = self.ctx.md_kinds();
        let rejected: Vec<_> =
            metadata::disallowed_attachments(&self.cfg.metadata_whitelist, kinds, data)
                .map(|kind| metadata::metadata_kind_text(kinds, kind))
                .collect();

        for kind_text in rejected {
            let context = DiagnosticContext {
                metadata_kind: Some(kind_text),
                ..self.context(inst)
            };
            let diagnostic = Diagnostic::disallowed_metadata(context, self.location(block, inst));
            self.emit(diagnostic);
        }
    }

    fn context(&self, inst: InstId) -> DiagnosticContext {
        let inst_text = inst.dump_string(&FuncWriteCtx::new(self.ctx, self.func));
        DiagnosticContext {
            function_name: self.func_name().to_string(),
            inst_text: Some(inst_text),
            type_name: None,
            metadata_kind: None,
        }
    }

    fn location(&self, block: BlockId, inst: InstId) -> Location {
        Location::Inst {
            func: self.func_ref,
            block: Some(block),
            inst,
        }
    }

    fn func_name(&self) -> &str {
        self.ctx.func_sig(self.func_ref).name()
    }
}
