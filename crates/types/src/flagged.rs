//! Conditional dependency trees

use crate::package::{Component, FlagName, Instance, OptionalStanza, PackageName, UnitId};
use crate::VersionSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role a dependency plays for its dependent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
    /// Linked into the dependent
    Runtime,
    /// Needed to run the dependent's build script
    Setup,
    /// Executable tool invoked while building the dependent
    BuildTool,
}

impl Default for DepKind {
    fn default() -> Self {
        Self::Runtime
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Setup => write!(f, "setup"),
            Self::BuildTool => write!(f, "build-tool"),
        }
    }
}

/// What a dependency accepts from its target package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepRequirement {
    /// Any instance whose version is in range
    Range(VersionSpec),
    /// Exactly one installed unit (dependencies of pre-built instances)
    Fixed(UnitId),
}

impl DepRequirement {
    /// Whether an instance satisfies the requirement
    #[must_use]
    pub fn admits(&self, instance: &Instance) -> bool {
        match self {
            Self::Range(spec) => spec.matches(&instance.version),
            Self::Fixed(unit) => instance.unit_id() == Some(unit),
        }
    }
}

impl Default for DepRequirement {
    fn default() -> Self {
        Self::Range(VersionSpec::any())
    }
}

impl fmt::Display for DepRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(spec) => write!(f, "{spec}"),
            Self::Fixed(unit) => write!(f, "=={unit} (installed)"),
        }
    }
}

/// A single declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: PackageName,
    #[serde(default)]
    pub requirement: DepRequirement,
    #[serde(default)]
    pub component: Component,
    #[serde(default)]
    pub kind: DepKind,
}

impl Dependency {
    /// Dependency on any version of a package's library
    pub fn library(name: impl Into<PackageName>) -> Self {
        Self {
            name: name.into(),
            requirement: DepRequirement::default(),
            component: Component::Library,
            kind: DepKind::Runtime,
        }
    }

    /// Dependency on a version range of a package's library
    pub fn range(name: impl Into<PackageName>, spec: VersionSpec) -> Self {
        Self {
            requirement: DepRequirement::Range(spec),
            ..Self::library(name)
        }
    }

    /// Dependency on one installed unit
    pub fn fixed(name: impl Into<PackageName>, unit: UnitId) -> Self {
        Self {
            requirement: DepRequirement::Fixed(unit),
            ..Self::library(name)
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: Component) -> Self {
        self.component = component;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: DepKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.component != Component::Library {
            write!(f, ":{}", self.component)?;
        }
        match &self.requirement {
            DepRequirement::Range(spec) if spec.is_any() => Ok(()),
            requirement => write!(f, " {requirement}"),
        }
    }
}

/// One node of a conditional dependency tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlaggedDep {
    /// Unconditional at this level
    Simple(Dependency),
    /// Guarded by a flag
    Flagged {
        flag: FlagName,
        #[serde(default)]
        if_true: FlaggedDeps,
        #[serde(default)]
        if_false: FlaggedDeps,
    },
    /// Active only when the stanza is enabled
    Stanza {
        stanza: OptionalStanza,
        deps: FlaggedDeps,
    },
}

/// A dependency list conditioned on flags and stanzas
pub type FlaggedDeps = Vec<FlaggedDep>;

/// All dependencies in the tree, ignoring every condition
#[must_use]
pub fn flatten(deps: &[FlaggedDep]) -> Vec<&Dependency> {
    let mut out = Vec::new();
    collect_flat(deps, &mut out);
    out
}

fn collect_flat<'a>(deps: &'a [FlaggedDep], out: &mut Vec<&'a Dependency>) {
    for dep in deps {
        match dep {
            FlaggedDep::Simple(dependency) => out.push(dependency),
            FlaggedDep::Flagged {
                if_true, if_false, ..
            } => {
                collect_flat(if_true, out);
                collect_flat(if_false, out);
            }
            FlaggedDep::Stanza { deps, .. } => collect_flat(deps, out),
        }
    }
}

/// Flags mentioned by any condition in the tree
#[must_use]
pub fn referenced_flags(deps: &[FlaggedDep]) -> BTreeSet<&FlagName> {
    let mut flags = BTreeSet::new();
    let mut stack: Vec<&FlaggedDep> = deps.iter().collect();
    while let Some(dep) = stack.pop() {
        match dep {
            FlaggedDep::Simple(_) => {}
            FlaggedDep::Flagged {
                flag,
                if_true,
                if_false,
            } => {
                flags.insert(flag);
                stack.extend(if_true.iter());
                stack.extend(if_false.iter());
            }
            FlaggedDep::Stanza { deps, .. } => stack.extend(deps.iter()),
        }
    }
    flags
}

/// Whether any stanza guard in the tree names `stanza`
#[must_use]
pub fn mentions_stanza(deps: &[FlaggedDep], stanza: OptionalStanza) -> bool {
    deps.iter().any(|dep| match dep {
        FlaggedDep::Simple(_) => false,
        FlaggedDep::Flagged {
            if_true, if_false, ..
        } => mentions_stanza(if_true, stanza) || mentions_stanza(if_false, stanza),
        FlaggedDep::Stanza { stanza: s, deps } => *s == stanza || mentions_stanza(deps, stanza),
    })
}
