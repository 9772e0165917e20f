//! Package-related type definitions

use crate::flagged::FlaggedDeps;
use crate::{Version, VersionSpec};
use serde::{Deserialize, Serialize};
use sprout_errors::IndexError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unique identity of a package in the universe
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty (rejected by the index)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PackageName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identifier of a pre-built unit in an installed package database
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Create a new unit id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provenance of an instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Already built and installed
    Installed(UnitId),
    /// To be built from source
    Source,
}

/// One concrete version of a package
///
/// Ordering is by version first; on equal versions installed instances sort
/// before the source instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Instance {
    pub version: Version,
    pub location: Location,
}

impl Instance {
    /// Source instance of a version
    #[must_use]
    pub fn source(version: Version) -> Self {
        Self {
            version,
            location: Location::Source,
        }
    }

    /// Installed instance of a version
    pub fn installed(version: Version, unit: impl Into<String>) -> Self {
        Self {
            version,
            location: Location::Installed(UnitId::new(unit)),
        }
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self.location, Location::Installed(_))
    }

    /// Unit id for installed instances
    #[must_use]
    pub fn unit_id(&self) -> Option<&UnitId> {
        match &self.location {
            Location::Installed(unit) => Some(unit),
            Location::Source => None,
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::Installed(unit) => write!(f, "{}/installed-{unit}", self.version),
            Location::Source => write!(f, "{}", self.version),
        }
    }
}

/// Name of a package flag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagName(String);

impl FlagName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlagName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Declaration of a flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagInfo {
    /// Value tried first
    pub default: bool,
    /// Manual flags are only changed by an explicit user constraint
    #[serde(default)]
    pub manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FlagInfo {
    /// Automatic flag with the given default
    #[must_use]
    pub fn automatic(default: bool) -> Self {
        Self {
            default,
            manual: false,
            description: None,
        }
    }

    /// Manual flag with the given default
    #[must_use]
    pub fn manual(default: bool) -> Self {
        Self {
            default,
            manual: true,
            description: None,
        }
    }
}

/// Optional component group toggled by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalStanza {
    Tests,
    Benchmarks,
}

impl OptionalStanza {
    /// Whether a component belongs to this stanza
    #[must_use]
    pub fn owns(self, component: &Component) -> bool {
        component.stanza() == Some(self)
    }
}

impl fmt::Display for OptionalStanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tests => write!(f, "test"),
            Self::Benchmarks => write!(f, "bench"),
        }
    }
}

/// A component exposed by a package
///
/// Serialized in its textual form (`lib`, `lib:name`, `exe:name`,
/// `test:name`, `bench:name`, `setup`) so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Component {
    Library,
    SubLibrary(String),
    Executable(String),
    TestSuite(String),
    Benchmark(String),
    Setup,
}

impl Default for Component {
    fn default() -> Self {
        Self::Library
    }
}

impl Component {
    /// Stanza that has to be enabled for this component to be built
    #[must_use]
    pub fn stanza(&self) -> Option<OptionalStanza> {
        match self {
            Self::TestSuite(_) => Some(OptionalStanza::Tests),
            Self::Benchmark(_) => Some(OptionalStanza::Benchmarks),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => write!(f, "lib"),
            Self::SubLibrary(name) => write!(f, "lib:{name}"),
            Self::Executable(name) => write!(f, "exe:{name}"),
            Self::TestSuite(name) => write!(f, "test:{name}"),
            Self::Benchmark(name) => write!(f, "bench:{name}"),
            Self::Setup => write!(f, "setup"),
        }
    }
}

impl FromStr for Component {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || IndexError::InvalidRecord {
            package: String::new(),
            message: format!("unknown component `{s}`"),
        };
        match s.split_once(':') {
            None => match s {
                "lib" | "library" => Ok(Self::Library),
                "setup" => Ok(Self::Setup),
                _ => Err(invalid()),
            },
            Some((_, "")) => Err(invalid()),
            Some(("lib", name)) => Ok(Self::SubLibrary(name.to_string())),
            Some(("exe", name)) => Ok(Self::Executable(name.to_string())),
            Some(("test", name)) => Ok(Self::TestSuite(name.to_string())),
            Some(("bench", name)) => Ok(Self::Benchmark(name.to_string())),
            Some(_) => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Component {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Component> for String {
    fn from(component: Component) -> Self {
        component.to_string()
    }
}

/// Whether a component can be built in the current environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsBuildable(pub bool);

/// Why an instance must never be chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisqualifyReason {
    /// Installed package whose own dependencies are gone
    Broken { missing: Vec<UnitId> },
    /// Excluded by the metadata source (deprecated, yanked, blacklisted)
    Excluded { reason: String },
    /// Hidden behind another definition of the same instance
    Shadowed,
}

impl fmt::Display for DisqualifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broken { missing } if missing.is_empty() => write!(f, "broken installed package"),
            Self::Broken { missing } => {
                let ids: Vec<&str> = missing.iter().map(UnitId::as_str).collect();
                write!(f, "broken installed package (missing {})", ids.join(", "))
            }
            Self::Excluded { reason } => write!(f, "excluded: {reason}"),
            Self::Shadowed => write!(f, "shadowed by another definition"),
        }
    }
}

/// Everything the solver needs to know about one instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PInfo {
    #[serde(default)]
    pub deps: FlaggedDeps,
    #[serde(default)]
    pub components: BTreeMap<Component, IsBuildable>,
    #[serde(default)]
    pub flags: BTreeMap<FlagName, FlagInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disqualified: Option<DisqualifyReason>,
}

impl PInfo {
    /// Instance with a buildable library and the given dependencies
    #[must_use]
    pub fn library(deps: FlaggedDeps) -> Self {
        let mut components = BTreeMap::new();
        components.insert(Component::Library, IsBuildable(true));
        Self {
            deps,
            components,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, info: FlagInfo) -> Self {
        self.flags.insert(FlagName::new(name), info);
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: Component, buildable: bool) -> Self {
        self.components.insert(component, IsBuildable(buildable));
        self
    }

    #[must_use]
    pub fn disqualify(mut self, reason: DisqualifyReason) -> Self {
        self.disqualified = Some(reason);
        self
    }

    /// Whether the component exists and is buildable
    ///
    /// Instances that declare no components at all expose an implicit
    /// buildable library.
    #[must_use]
    pub fn provides(&self, component: &Component) -> bool {
        if self.components.is_empty() {
            return *component == Component::Library;
        }
        self.components
            .get(component)
            .is_some_and(|buildable| buildable.0)
    }

    /// Whether every component of a stanza is buildable
    #[must_use]
    pub fn stanza_buildable(&self, stanza: OptionalStanza) -> bool {
        self.components
            .iter()
            .filter(|(component, _)| stanza.owns(component))
            .all(|(_, buildable)| buildable.0)
    }

    /// Stanzas this instance declares, either through components or
    /// through stanza-guarded dependencies
    #[must_use]
    pub fn stanzas(&self) -> Vec<OptionalStanza> {
        [OptionalStanza::Tests, OptionalStanza::Benchmarks]
            .into_iter()
            .filter(|stanza| {
                self.components.keys().any(|component| stanza.owns(component))
                    || crate::flagged::mentions_stanza(&self.deps, *stanza)
            })
            .collect()
    }
}

/// Package specification with optional version constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: PackageName,
    pub version_spec: VersionSpec,
}

impl PackageSpec {
    /// Parse a package spec from a string (e.g., "jq>=1.6,<2.0")
    ///
    /// # Errors
    ///
    /// Returns `VersionError` if the package specification string is malformed
    /// or contains invalid version constraints.
    pub fn parse(s: &str) -> Result<Self, sprout_errors::VersionError> {
        // Find the first constraint operator
        let operators = ["==", ">=", "<=", "!=", "~=", ">", "<"];
        let split_pos = operators.iter().filter_map(|op| s.find(op)).min();

        let (name, version_str) = if let Some(pos) = split_pos {
            (s[..pos].trim(), s[pos..].trim())
        } else {
            // No version constraint means any version
            (s.trim(), "*")
        };

        if name.is_empty() {
            return Err(sprout_errors::VersionError::InvalidConstraint {
                input: s.to_string(),
            });
        }

        Ok(Self {
            name: PackageName::new(name),
            version_spec: version_str.parse()?,
        })
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_spec.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}", self.name, self.version_spec)
        }
    }
}

/// Environment facts used to evaluate buildability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub os: String,
    pub arch: String,
    pub compiler: String,
}

impl Environment {
    /// Host OS and architecture with the given compiler identity
    pub fn host(compiler: impl Into<String>) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            compiler: compiler.into(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::host("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flagged::{Dependency, FlaggedDep};

    #[test]
    fn test_package_spec_parse() {
        let spec = PackageSpec::parse("jq>=1.6.0").unwrap();
        assert_eq!(spec.name.as_str(), "jq");
        assert_eq!(spec.version_spec.to_string(), ">=1.6.0");

        let spec = PackageSpec::parse("curl").unwrap();
        assert_eq!(spec.name.as_str(), "curl");
        assert!(spec.version_spec.is_any());

        let spec = PackageSpec::parse("openssl>=1.1.0,<2.0.0").unwrap();
        assert_eq!(spec.name.as_str(), "openssl");
        assert_eq!(spec.version_spec.to_string(), ">=1.1.0,<2.0.0");

        assert!(PackageSpec::parse(">=1.0").is_err());
    }

    #[test]
    fn test_instance_order() {
        let installed = Instance::installed(Version::new(1, 0, 0), "a-1.0-abc");
        let source = Instance::source(Version::new(1, 0, 0));
        let newer = Instance::source(Version::new(2, 0, 0));

        assert!(installed < source);
        assert!(source < newer);
        assert_eq!(installed.to_string(), "1.0.0/installed-a-1.0-abc");
        assert_eq!(newer.to_string(), "2.0.0");
    }

    #[test]
    fn test_provides_components() {
        let info = PInfo::library(vec![])
            .with_component(Component::SubLibrary("internal".into()), false)
            .with_component(Component::Executable("tool".into()), true);

        assert!(info.provides(&Component::Library));
        assert!(!info.provides(&Component::SubLibrary("internal".into())));
        assert!(info.provides(&Component::Executable("tool".into())));
        assert!(!info.provides(&Component::Setup));

        // No declared components: an implicit library
        let bare = PInfo::default();
        assert!(bare.provides(&Component::Library));
        assert!(!bare.provides(&Component::Executable("tool".into())));
    }

    #[test]
    fn test_component_text_form() {
        for text in ["lib", "lib:internal", "exe:tool", "test:unit", "bench:speed", "setup"] {
            let component: Component = text.parse().unwrap();
            assert_eq!(component.to_string(), text);
        }
        assert!("exe:".parse::<Component>().is_err());
        assert!("plugin:x".parse::<Component>().is_err());
    }

    #[test]
    fn test_stanzas_detected() {
        let info = PInfo::library(vec![FlaggedDep::Stanza {
            stanza: OptionalStanza::Benchmarks,
            deps: vec![FlaggedDep::Simple(Dependency::library("criterion"))],
        }])
        .with_component(Component::TestSuite("unit".into()), false);

        assert_eq!(
            info.stanzas(),
            vec![OptionalStanza::Tests, OptionalStanza::Benchmarks]
        );
        assert!(!info.stanza_buildable(OptionalStanza::Tests));
        assert!(info.stanza_buildable(OptionalStanza::Benchmarks));
    }

    #[test]
    fn test_disqualify_reason_display() {
        let reason = DisqualifyReason::Broken {
            missing: vec![UnitId::new("zlib-1.2-xyz")],
        };
        assert_eq!(
            reason.to_string(),
            "broken installed package (missing zlib-1.2-xyz)"
        );
    }
}
