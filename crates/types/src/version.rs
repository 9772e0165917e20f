//! Version specification and constraint parsing
//!
//! Implements comparison-style version constraints:
//! - `==1.2.3` - Exact version
//! - `>=1.2.0` - Minimum version
//! - `<=2.0.0` - Maximum version
//! - `~=1.2.0` - Compatible release (>=1.2.0,<1.3.0)
//! - `!=1.5.0` - Exclude version
//! - Multiple constraints: `>=1.2,<2.0,!=1.5.0`
//!
//! Versions with fewer than three components (`1`, `2.0`) are accepted and
//! padded with zeros.

use semver::Version;
use serde::{Deserialize, Serialize};
use sprout_errors::VersionError;
use std::fmt;
use std::str::FromStr;

/// Parse a version, padding missing minor/patch components with zeros
///
/// # Errors
///
/// Returns `VersionError::ParseError` if the input is not a version.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let input = input.trim();
    let core_len = input
        .find(|c| c == '-' || c == '+')
        .unwrap_or(input.len());
    let (core, rest) = input.split_at(core_len);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => input.to_string(),
    };
    Version::parse(&padded).map_err(|e| VersionError::ParseError {
        message: format!("{input}: {e}"),
    })
}

/// A single version constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionConstraint {
    Exact(Version),
    GreaterEqual(Version),
    LessEqual(Version),
    Greater(Version),
    Less(Version),
    Compatible(Version),
    NotEqual(Version),
}

impl VersionConstraint {
    /// Check if a version satisfies this constraint
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(v) => version == v,
            Self::GreaterEqual(v) => version >= v,
            Self::LessEqual(v) => version <= v,
            Self::Greater(v) => version > v,
            Self::Less(v) => version < v,
            Self::NotEqual(v) => version != v,
            // ~=1.2.3 means >=1.2.3,<1.3.0
            Self::Compatible(v) => {
                version >= v && version.major == v.major && version.minor == v.minor
            }
        }
    }

    /// Parse a single constraint from a string
    fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();

        // Two-character operators must be tried before their one-character prefixes
        let constructors: [(&str, fn(Version) -> Self); 7] = [
            ("==", Self::Exact),
            (">=", Self::GreaterEqual),
            ("<=", Self::LessEqual),
            ("!=", Self::NotEqual),
            ("~=", Self::Compatible),
            (">", Self::Greater),
            ("<", Self::Less),
        ];

        for (op, make) in constructors {
            if let Some(version_str) = s.strip_prefix(op) {
                return Ok(make(parse_version(version_str)?));
            }
        }

        Err(VersionError::InvalidConstraint {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "=={v}"),
            Self::GreaterEqual(v) => write!(f, ">={v}"),
            Self::LessEqual(v) => write!(f, "<={v}"),
            Self::Greater(v) => write!(f, ">{v}"),
            Self::Less(v) => write!(f, "<{v}"),
            Self::Compatible(v) => write!(f, "~={v}"),
            Self::NotEqual(v) => write!(f, "!={v}"),
        }
    }
}

/// A version specification that can contain multiple constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionSpec {
    constraints: Vec<VersionConstraint>,
}

impl VersionSpec {
    /// A spec that admits every version
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Check if a version satisfies all constraints
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// Check if this spec has any constraints
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl TryFrom<String> for VersionSpec {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionSpec> for String {
    fn from(spec: VersionSpec) -> Self {
        spec.to_string()
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            // No constraints means any version
            return Ok(Self {
                constraints: vec![],
            });
        }

        // Split by comma and parse each constraint
        let constraints: Result<Vec<_>, _> = s
            .split(',')
            .map(|part| VersionConstraint::parse(part.trim()))
            .collect();

        let constraints = constraints?;

        if constraints.is_empty() {
            return Err(VersionError::InvalidConstraint {
                input: s.to_string(),
            });
        }

        Ok(Self { constraints })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            write!(f, "*")
        } else {
            let strs: Vec<_> = self.constraints.iter().map(ToString::to_string).collect();
            write!(f, "{}", strs.join(","))
        }
    }
}
