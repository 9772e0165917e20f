#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for sprout
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/sprout/config.toml)
//! - Environment variables (`SPROUT_*`)
//! - CLI flags (applied by the driver)

pub mod constants;
pub mod core;

pub use self::core::{
    EnvironmentConfig, GeneralConfig, OutputFormat, PreferenceKind, SolverConfig,
};

use constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_PREFIX};
use serde::{Deserialize, Serialize};
use sprout_errors::{ConfigError, Error};
use sprout_types::Environment;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Serialize configuration to TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError {
                error: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Merge overrides from a variable lookup
    ///
    /// Names are the `SPROUT_*` environment variable names.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong shape.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{ENV_PREFIX}{suffix}");
            lookup(&name).map(|value| (name, value))
        };

        if let Some((field, value)) = var("OUTPUT") {
            self.general.default_output = parse_value(field, value)?;
        }

        if let Some((field, value)) = var("PREFERENCE") {
            self.solver.preference = parse_value(field, value)?;
        }

        if let Some((_, value)) = var("BOOTSTRAP_PACKAGE") {
            self.solver.bootstrap_package = value;
        }

        if let Some((field, value)) = var("MAX_BACKJUMPS") {
            self.solver.max_backjumps = if value == "none" {
                None
            } else {
                Some(parse_value(field, value)?)
            };
        }

        if let Some((field, value)) = var("MAX_TRACE_ENTRIES") {
            self.solver.max_trace_entries = parse_value(field, value)?;
        }

        if let Some((_, value)) = var("OS") {
            self.environment.os = Some(value);
        }

        if let Some((_, value)) = var("ARCH") {
            self.environment.arch = Some(value);
        }

        if let Some((_, value)) = var("COMPILER") {
            self.environment.compiler = Some(value);
        }

        Ok(())
    }

    /// Environment facts with host fallbacks
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment.to_environment()
    }
}

fn parse_value<T: FromStr>(field: String, value: String) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { field, value }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.solver.preference, PreferenceKind::Newest);
        assert_eq!(config.solver.bootstrap_package, "base");
        assert_eq!(config.solver.max_backjumps, None);
        assert_eq!(config.general.default_output, OutputFormat::Plain);
    }

    #[test]
    fn test_merge_vars() {
        let mut config = Config::default();
        config
            .merge_vars(vars(&[
                ("SPROUT_PREFERENCE", "installed"),
                ("SPROUT_MAX_BACKJUMPS", "500"),
                ("SPROUT_COMPILER", "ghc-9.8"),
            ]))
            .unwrap();

        assert_eq!(config.solver.preference, PreferenceKind::Installed);
        assert_eq!(config.solver.max_backjumps, Some(500));
        assert_eq!(config.environment().compiler, "ghc-9.8");
    }

    #[test]
    fn test_merge_vars_rejects_bad_values() {
        let mut config = Config::default();
        let err = config
            .merge_vars(vars(&[("SPROUT_MAX_BACKJUMPS", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == "SPROUT_MAX_BACKJUMPS"
        ));
    }
}
