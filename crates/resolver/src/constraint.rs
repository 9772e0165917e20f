//! User constraints on the solution

use serde::Serialize;
use sprout_errors::{Error, ResolverError};
use sprout_types::{FlagName, OptionalStanza, PackageName, PackageSpec, VersionSpec};
use std::fmt;
use std::str::FromStr;

/// What a user constraint demands of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Version must be in range
    Version(VersionSpec),
    /// Must be a pre-built instance
    Installed,
    /// Must be built from source
    Source,
    /// Flag must take this value
    Flag(FlagName, bool),
    /// These stanzas must be enabled
    Stanzas(Vec<OptionalStanza>),
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(spec) => write!(f, "{spec}"),
            Self::Installed => write!(f, "installed"),
            Self::Source => write!(f, "source"),
            Self::Flag(flag, true) => write!(f, "+{flag}"),
            Self::Flag(flag, false) => write!(f, "-{flag}"),
            Self::Stanzas(stanzas) => {
                let names: Vec<String> = stanzas.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(" "))
            }
        }
    }
}

/// A constraint on every qualified copy of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserConstraint {
    pub package: PackageName,
    pub kind: ConstraintKind,
}

impl UserConstraint {
    #[must_use]
    pub fn version(package: impl Into<PackageName>, spec: VersionSpec) -> Self {
        Self {
            package: package.into(),
            kind: ConstraintKind::Version(spec),
        }
    }

    #[must_use]
    pub fn installed(package: impl Into<PackageName>) -> Self {
        Self {
            package: package.into(),
            kind: ConstraintKind::Installed,
        }
    }

    #[must_use]
    pub fn source(package: impl Into<PackageName>) -> Self {
        Self {
            package: package.into(),
            kind: ConstraintKind::Source,
        }
    }

    #[must_use]
    pub fn flag(package: impl Into<PackageName>, flag: impl Into<String>, value: bool) -> Self {
        Self {
            package: package.into(),
            kind: ConstraintKind::Flag(FlagName::new(flag), value),
        }
    }

    #[must_use]
    pub fn stanzas(package: impl Into<PackageName>, stanzas: Vec<OptionalStanza>) -> Self {
        Self {
            package: package.into(),
            kind: ConstraintKind::Stanzas(stanzas),
        }
    }
}

impl fmt::Display for UserConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::Version(spec) => write!(f, "{}{spec}", self.package),
            kind => write!(f, "{} {kind}", self.package),
        }
    }
}

impl FromStr for UserConstraint {
    type Err = Error;

    /// Parse `name>=1.0,<2.0`, `name installed`, `name source`,
    /// `name +flag`, `name -flag`, `name test` or `name bench`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ResolverError::InvalidConstraint {
            input: s.to_string(),
            message: message.to_string(),
        };

        let s = s.trim();
        let Some((name, rest)) = s.split_once(char::is_whitespace) else {
            let spec = PackageSpec::parse(s).map_err(|e| invalid(&e.to_string()))?;
            if spec.version_spec.is_any() {
                return Err(invalid("expected a version range or a qualifier").into());
            }
            return Ok(Self::version(spec.name, spec.version_spec));
        };

        let name = name.trim();
        let rest = rest.trim();
        if name.is_empty() {
            return Err(invalid("missing package name").into());
        }

        let kind = match rest {
            "installed" => ConstraintKind::Installed,
            "source" => ConstraintKind::Source,
            "test" | "tests" => ConstraintKind::Stanzas(vec![OptionalStanza::Tests]),
            "bench" | "benchmarks" => ConstraintKind::Stanzas(vec![OptionalStanza::Benchmarks]),
            _ => {
                if let Some(flag) = rest.strip_prefix('+') {
                    flag_kind(flag, true).ok_or_else(|| invalid("empty flag name"))?
                } else if let Some(flag) = rest.strip_prefix('-') {
                    flag_kind(flag, false).ok_or_else(|| invalid("empty flag name"))?
                } else {
                    let spec: VersionSpec = rest.parse().map_err(|e: sprout_errors::VersionError| {
                        invalid(&e.to_string())
                    })?;
                    ConstraintKind::Version(spec)
                }
            }
        };

        Ok(Self {
            package: PackageName::new(name),
            kind,
        })
    }
}

fn flag_kind(flag: &str, value: bool) -> Option<ConstraintKind> {
    let flag = flag.trim();
    (!flag.is_empty()).then(|| ConstraintKind::Flag(FlagName::new(flag), value))
}
