use std::sync::Arc;

use pnacl_ir::{MdKind, metadata::MetadataKinds};
use rustc_hash::FxHashSet;

use crate::{
    align::{AlignmentPolicy, PortableAlignment},
    intrinsics::{AllowedIntrinsics, AtomicIntrinsics},
};

/// Metadata kinds that may stay attached to instructions, by name.
#[derive(Debug, Clone)]
pub struct MetadataWhitelist {
    names: FxHashSet<String>,
}

impl MetadataWhitelist {
    pub fn empty() -> Self {
        Self {
            names: FxHashSet::default(),
        }
    }

    pub fn with(mut self, name: &str) -> Self {
        self.names.insert(name.to_string());
        self
    }

    /// Kinds without a registered name are never allowed.
    pub fn allows(&self, kinds: &MetadataKinds, kind: MdKind) -> bool {
        kinds
            .name(kind)
            .is_some_and(|name| self.names.contains(name))
    }
}

impl Default for MetadataWhitelist {
    fn default() -> Self {
        Self::empty().with("dbg")
    }
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Fatal threshold of the [`crate::ErrorReporter`] and cap of the merged
    /// module report. 0 disables both.
    pub max_diagnostics: usize,
    pub allowed_intrinsics: AllowedIntrinsics,
    pub atomic_intrinsics: AtomicIntrinsics,
    pub alignment: Arc<dyn AlignmentPolicy>,
    pub metadata_whitelist: MetadataWhitelist,
}

impl VerifierConfig {
    pub fn with_max_diagnostics(mut self, max_diagnostics: usize) -> Self {
        self.max_diagnostics = max_diagnostics;
        self
    }

    pub fn with_alignment_policy(mut self, policy: impl AlignmentPolicy + 'static) -> Self {
        self.alignment = Arc::new(policy);
        self
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_diagnostics: 200,
            allowed_intrinsics: AllowedIntrinsics::default(),
            atomic_intrinsics: AtomicIntrinsics::default(),
            alignment: Arc::new(PortableAlignment),
            metadata_whitelist: MetadataWhitelist::default(),
        }
    }
}
