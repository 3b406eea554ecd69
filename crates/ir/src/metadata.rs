//! Instruction metadata attachments.
use std::fmt;

/// Identifies the kind of a metadata attachment (`!dbg`, `!tbaa`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MdKind(pub u32);

impl MdKind {
    pub const DBG: Self = Self(0);
    pub const TBAA: Self = Self(1);
    pub const PROF: Self = Self(2);
    pub const FPMATH: Self = Self(3);
    pub const RANGE: Self = Self(4);
    pub const TBAA_STRUCT: Self = Self(5);
    pub const INVARIANT_LOAD: Self = Self(6);
}

/// An opaque metadata node. The verifier never looks inside nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MdNode(pub u32);

impl fmt::Display for MdNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// Names of the metadata kinds registered in a module. Builtin kinds occupy
/// the first slots in the order of the `MdKind` constants.
#[derive(Debug, Clone)]
pub struct MetadataKinds {
    names: Vec<String>,
}

impl MetadataKinds {
    const BUILTIN: [&'static str; 7] = [
        "dbg",
        "tbaa",
        "prof",
        "fpmath",
        "range",
        "tbaa.struct",
        "invariant.load",
    ];

    /// Returns the kind registered under `name`, registering it if needed.
    pub fn get_or_register(&mut self, name: &str) -> MdKind {
        if let Some(kind) = self.lookup(name) {
            return kind;
        }
        self.names.push(name.to_string());
        MdKind((self.names.len() - 1) as u32)
    }

    pub fn lookup(&self, name: &str) -> Option<MdKind> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| MdKind(idx as u32))
    }

    pub fn name(&self, kind: MdKind) -> Option<&str> {
        self.names.get(kind.0 as usize).map(String::as_str)
    }
}

impl Default for MetadataKinds {
    fn default() -> Self {
        Self {
            names: Self::BUILTIN.iter().map(|s| s.to_string()).collect(),
        }
    }
}
