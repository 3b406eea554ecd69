use std::fmt;

use crate::diagnostic::{Diagnostic, Reason, ViolationKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    /// Every diagnostic is an ABI violation, so any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn reasons(&self) -> impl Iterator<Item = Reason> + '_ {
        self.diagnostics.iter().map(|diag| diag.reason)
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diag| diag.kind() == kind)
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn extend_with_limit(&mut self, mut other: Vec<Diagnostic>, max_diagnostics: usize) {
        if max_diagnostics == 0 {
            self.diagnostics.extend(other);
            return;
        }

        let remaining = max_diagnostics.saturating_sub(self.diagnostics.len());
        if remaining == 0 {
            return;
        }

        if other.len() > remaining {
            other.truncate(remaining);
        }
        self.diagnostics.extend(other);
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return "verification succeeded".fmt(f);
        }

        for (index, diagnostic) in self.diagnostics.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }

        Ok(())
    }
}
