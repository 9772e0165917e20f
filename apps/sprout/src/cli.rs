//! Command line interface definition

use clap::{Parser, Subcommand};
use sprout_config::{OutputFormat, PreferenceKind};
use std::path::PathBuf;

/// sprout - dependency solver for flagged package universes
#[derive(Parser)]
#[command(name = "sprout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dependency solver for flagged package universes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve targets against a universe file and print the install plan
    #[command(alias = "s")]
    Solve {
        /// Universe file (JSON)
        universe: PathBuf,

        /// Target package names
        #[arg(required = true)]
        targets: Vec<String>,

        /// Constraint such as `zlib>=1.2`, `curl +ssl` or `text test`
        #[arg(short, long = "constraint", value_name = "CONSTRAINT")]
        constraints: Vec<String>,

        /// Instance preference policy (newest or installed)
        #[arg(long)]
        preference: Option<PreferenceKind>,

        /// Give up after this many backjumps
        #[arg(long, value_name = "N")]
        max_backjumps: Option<u64>,
    },

    /// List the packages and instances of a universe file
    #[command(alias = "ls")]
    Index {
        /// Universe file (JSON)
        universe: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

impl GlobalArgs {
    /// Output format requested on the command line, if any
    pub fn output_override(&self) -> Option<OutputFormat> {
        self.json.then_some(OutputFormat::Json)
    }
}
