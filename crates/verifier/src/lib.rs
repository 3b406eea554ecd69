pub mod align;
mod config;
mod diagnostic;
pub mod intrinsics;
mod report;
mod sink;
pub mod verify;

pub use align::{AlignmentPolicy, PortableAlignment};
pub use config::{MetadataWhitelist, VerifierConfig};
pub use diagnostic::{Diagnostic, DiagnosticContext, Location, Note, Reason, ViolationKind};
pub use intrinsics::{AllowedIntrinsics, AtomicIntrinsics, IntrinsicClass, ParamRole};
pub use report::VerificationReport;
pub use sink::{ErrorReporter, FatalDiagnostics};
pub use verify::{
    atomic::{MemoryOrder, RmwOperation},
    inst_rules::RuleOutcome,
    run_on_function, verify_function, verify_function_or_panic, verify_module,
    verify_module_or_panic,
};

/// Verifies `$module` with the default configuration in debug builds and
/// panics with the rendered report on any violation.
#[macro_export]
macro_rules! debug_verify_module {
    ($module:expr) => {{
        if cfg!(debug_assertions) {
            let cfg = $crate::VerifierConfig::default();
            $crate::verify_module_or_panic($module, &cfg);
        }
    }};
}
