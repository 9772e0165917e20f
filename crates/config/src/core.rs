//! Configuration sections shared by the resolver and the driver

use crate::constants::{DEFAULT_BOOTSTRAP_PACKAGE, DEFAULT_MAX_TRACE_ENTRIES};
use serde::{Deserialize, Serialize};
use sprout_types::Environment;
use std::fmt;
use std::str::FromStr;

/// Output format for the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Machine-readable JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

/// Order in which the solver tries the instances of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    /// Highest version first
    #[default]
    Newest,
    /// Installed instances first, then highest version
    Installed,
}

impl fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::Installed => write!(f, "installed"),
        }
    }
}

impl FromStr for PreferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "installed" => Ok(Self::Installed),
            _ => Err(format!("unknown preference: {s}")),
        }
    }
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Plain,
        }
    }
}

/// Solver tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub preference: PreferenceKind,
    /// Package shared across roles when installed packages depend on it
    #[serde(default = "default_bootstrap_package")]
    pub bootstrap_package: String,
    /// Give up after this many backjumps (unbounded when absent)
    #[serde(default)]
    pub max_backjumps: Option<u64>,
    /// Explanations kept in a failure trace
    #[serde(default = "default_max_trace_entries")]
    pub max_trace_entries: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            preference: PreferenceKind::Newest,
            bootstrap_package: default_bootstrap_package(),
            max_backjumps: None,
            max_trace_entries: DEFAULT_MAX_TRACE_ENTRIES,
        }
    }
}

/// Environment facts used to evaluate component buildability
///
/// Unset values fall back to the host.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
}

impl EnvironmentConfig {
    /// Resolve into concrete environment facts
    #[must_use]
    pub fn to_environment(&self) -> Environment {
        let host = Environment::default();
        Environment {
            os: self.os.clone().unwrap_or(host.os),
            arch: self.arch.clone().unwrap_or(host.arch),
            compiler: self.compiler.clone().unwrap_or(host.compiler),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Plain
}

fn default_bootstrap_package() -> String {
    DEFAULT_BOOTSTRAP_PACKAGE.to_string()
}

fn default_max_trace_entries() -> usize {
    DEFAULT_MAX_TRACE_ENTRIES
}
