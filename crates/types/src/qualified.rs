//! Qualified package names
//!
//! The same package can be needed in independent roles (a library linked
//! into the targets, a build-script dependency, a build tool). Each role gets
//! its own qualifier, and the solver picks one instance per qualified name.

use crate::package::PackageName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a package is resolved in
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// Shared by the targets and their runtime closure
    Toplevel,
    /// Build-script dependencies of the named package
    Setup(PackageName),
    /// Build tool (second name) of the first package
    Exe(PackageName, PackageName),
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toplevel => Ok(()),
            Self::Setup(pn) => write!(f, "{pn}:setup."),
            Self::Exe(pn, tool) => write!(f, "{pn}:{tool}:exe."),
        }
    }
}

/// A package name in a resolution role
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qpn {
    pub qualifier: Qualifier,
    pub name: PackageName,
}

impl Qpn {
    pub fn new(qualifier: Qualifier, name: impl Into<PackageName>) -> Self {
        Self {
            qualifier,
            name: name.into(),
        }
    }

    /// Name in the top-level role
    pub fn toplevel(name: impl Into<PackageName>) -> Self {
        Self::new(Qualifier::Toplevel, name)
    }
}

impl fmt::Display for Qpn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.qualifier, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Qpn::toplevel("aeson").to_string(), "aeson");
        assert_eq!(
            Qpn::new(Qualifier::Setup("zlib".into()), "cabal").to_string(),
            "zlib:setup.cabal"
        );
        assert_eq!(
            Qpn::new(Qualifier::Exe("lang".into(), "alex".into()), "alex").to_string(),
            "lang:alex:exe.alex"
        );
    }

    #[test]
    fn test_toplevel_sorts_first() {
        let setup = Qpn::new(Qualifier::Setup("a".into()), "z");
        let top = Qpn::toplevel("z");
        assert!(top < setup);
    }
}
