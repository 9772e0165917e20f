//! Raw metadata records as read from a universe file

use serde::{Deserialize, Serialize};
use sprout_errors::{Error, IndexError};
use sprout_types::{Component, Environment, FlagInfo, FlagName, FlaggedDeps, PackageName, UnitId};
use std::collections::BTreeMap;

/// A complete metadata document: every known package record plus,
/// optionally, the environment it was captured for
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Universe {
    pub packages: Vec<RawPackage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

impl Universe {
    /// Parse a universe from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            IndexError::ParseError {
                message: format!("invalid universe JSON: {e}"),
            }
            .into()
        })
    }

    /// Serialize the universe to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            IndexError::ParseError {
                message: format!("failed to serialize universe: {e}"),
            }
            .into()
        })
    }
}

/// One package record (a source release or an installed unit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPackage {
    pub name: PackageName,
    /// Version text; short forms such as `1` or `2.0` are accepted
    pub version: String,
    /// Unit id when the record describes an installed, pre-built unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<UnitId>,
    #[serde(default)]
    pub flags: BTreeMap<FlagName, FlagInfo>,
    #[serde(default)]
    pub depends: FlaggedDeps,
    #[serde(default)]
    pub components: BTreeMap<Component, RawComponent>,
    /// Why the metadata source excludes this record (deprecated, yanked)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded: Option<String>,
    /// Installed units this installed unit was built against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed_depends: Vec<FixedDepend>,
    /// False for installed units the package database reports as unusable
    #[serde(default = "default_true")]
    pub buildable: bool,
}

fn default_true() -> bool {
    true
}

/// Platform predicates of one component; an empty list admits anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComponent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_os: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_arch: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_compilers: Vec<String>,
}

impl RawComponent {
    /// Whether every predicate admits the environment
    #[must_use]
    pub fn admits(&self, env: &Environment) -> bool {
        fn ok(list: &[String], value: &str) -> bool {
            list.is_empty() || list.iter().any(|item| item == value)
        }
        ok(&self.supported_os, &env.os)
            && ok(&self.supported_arch, &env.arch)
            && ok(&self.supported_compilers, &env.compiler)
    }
}

/// Dependency of an installed unit on another installed unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDepend {
    pub name: PackageName,
    pub unit: UnitId,
}
