//! Fixed names and defaults

/// Directory under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "sprout";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Prefix of environment variables that override the config file
pub const ENV_PREFIX: &str = "SPROUT_";

pub const DEFAULT_BOOTSTRAP_PACKAGE: &str = "base";
pub const DEFAULT_MAX_TRACE_ENTRIES: usize = 64;
