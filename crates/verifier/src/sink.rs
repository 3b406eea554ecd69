//! Diagnostic sink shared across verification runs.
use std::io;

use crate::{diagnostic::Diagnostic, report::VerificationReport};

/// Raised once the number of recorded errors reaches the reporter's
/// threshold. Whether this stops the process is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("portable ABI verification failed: {count} error(s), threshold is {max_errors}")]
pub struct FatalDiagnostics {
    pub count: usize,
    pub max_errors: usize,
}

/// Accumulates diagnostics in the order they were reported.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    errors: Vec<Diagnostic>,
    max_errors: usize,
}

impl ErrorReporter {
    /// `max_errors == 0` disables the fatal threshold.
    pub fn new(max_errors: usize) -> Self {
        Self {
            errors: Vec::new(),
            max_errors,
        }
    }

    pub fn add_error(&mut self, diagnostic: Diagnostic) {
        log::trace!("recorded {}: {}", diagnostic.code(), diagnostic.message);
        self.errors.push(diagnostic);
    }

    pub fn add_report(&mut self, report: VerificationReport) {
        for diagnostic in report.diagnostics {
            self.add_error(diagnostic);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn check_for_fatal_errors(&self) -> Result<(), FatalDiagnostics> {
        if self.max_errors != 0 && self.errors.len() >= self.max_errors {
            log::warn!(
                "{} ABI error(s) recorded, threshold of {} reached",
                self.errors.len(),
                self.max_errors
            );
            return Err(FatalDiagnostics {
                count: self.errors.len(),
                max_errors: self.max_errors,
            });
        }
        Ok(())
    }

    /// Writes one diagnostic per line.
    pub fn print_errors(&self, mut w: impl io::Write) -> io::Result<()> {
        for diagnostic in &self.errors {
            writeln!(w, "{diagnostic}")?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use cranelift_entity::EntityRef;
    use pnacl_ir::FuncRef;

    use super::*;
    use crate::diagnostic::{DiagnosticContext, Location, Reason};

    fn diag(name: &str) -> Diagnostic {
        let context = DiagnosticContext {
            function_name: name.to_string(),
            inst_text: Some("unreachable;".to_string()),
            ..Default::default()
        };
        Diagnostic::disallowed(
            Reason::BannedOpcode,
            context,
            Location::Function(FuncRef::new(0)),
        )
    }

    #[test]
    fn threshold() {
        let mut reporter = ErrorReporter::new(2);
        reporter.add_error(diag("a"));
        assert!(reporter.check_for_fatal_errors().is_ok());

        reporter.add_error(diag("b"));
        let fatal = reporter.check_for_fatal_errors().unwrap_err();
        assert_eq!(fatal.count, 2);
        assert_eq!(
            fatal.to_string(),
            "portable ABI verification failed: 2 error(s), threshold is 2"
        );

        reporter.reset();
        assert_eq!(reporter.error_count(), 0);
        assert!(reporter.check_for_fatal_errors().is_ok());
    }

    #[test]
    fn zero_disables_threshold() {
        let mut reporter = ErrorReporter::new(0);
        for _ in 0..10 {
            reporter.add_error(diag("f"));
        }
        assert!(reporter.check_for_fatal_errors().is_ok());
    }

    #[test]
    fn print_one_per_line() {
        let mut reporter = ErrorReporter::new(0);
        reporter.add_error(diag("a"));
        reporter.add_error(diag("b"));

        let mut out = Vec::new();
        reporter.print_errors(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Function a disallowed: bad instruction opcode: unreachable;\n\
             Function b disallowed: bad instruction opcode: unreachable;\n"
        );
    }
}
