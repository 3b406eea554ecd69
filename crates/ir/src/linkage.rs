use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Linkage of symbols.
pub enum Linkage {
    /// Defined in the module and visible to other modules.
    Public,

    #[default]
    /// Defined in the module, internal to it.
    Private,

    /// Declared here, defined elsewhere. Intrinsics are always external.
    External,
}

impl Linkage {
    pub fn has_definition(self) -> bool {
        !matches!(self, Self::External)
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::External => "external",
        };
        f.write_str(s)
    }
}

impl FromStr for Linkage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "external" => Ok(Self::External),
            _ => Err(()),
        }
    }
}
