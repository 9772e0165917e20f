//! sprout - dependency solver for flagged package universes
//!
//! This is the command line driver: it loads a universe file, builds the
//! package index, runs one resolution and prints the install plan or the
//! conflict explanation.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use sprout_config::{Config, OutputFormat};
use sprout_index::{Index, Universe};
use sprout_resolver::{Resolution, ResolveRequest, Resolver, UserConstraint};
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

/// Main application logic; `Ok(false)` means the request is unsatisfiable
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting sprout v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file (or defaults), environment, CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let format = cli
        .global
        .output_override()
        .unwrap_or(config.general.default_output);
    let renderer = OutputRenderer::new(format);

    match cli.command {
        Commands::Solve {
            universe,
            targets,
            constraints,
            ..
        } => {
            let index = load_index(&universe, &config).await?;
            let request = build_request(targets, &constraints)?;
            let handler = EventHandler::new(format == OutputFormat::Plain, cli.global.debug);
            let resolution = solve_with_events(index, config, request, &handler).await?;

            match resolution {
                Resolution::Success(plan) => {
                    renderer.render_plan(&plan)?;
                    Ok(true)
                }
                Resolution::Failure(failure) => {
                    renderer.render_failure(&failure)?;
                    Ok(false)
                }
            }
        }
        Commands::Index { universe } => {
            let index = load_index(&universe, &config).await?;
            renderer.render_index(&index)?;
            Ok(true)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(true)
        }
    }
}

/// Apply CLI overrides to the loaded configuration
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(format) = global.output_override() {
        config.general.default_output = format;
    }
    if let Commands::Solve {
        preference,
        max_backjumps,
        ..
    } = command
    {
        if let Some(preference) = preference {
            config.solver.preference = *preference;
        }
        if max_backjumps.is_some() {
            config.solver.max_backjumps = *max_backjumps;
        }
    }
}

async fn load_index(path: &Path, config: &Config) -> Result<Index, CliError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let universe = Universe::from_json(&contents)?;
    let index = Index::from_universe(&universe, &config.environment())?;
    info!(
        path = %path.display(),
        packages = index.len(),
        instances = index.instance_count(),
        "loaded universe"
    );
    Ok(index)
}

fn build_request(targets: Vec<String>, constraints: &[String]) -> Result<ResolveRequest, CliError> {
    let mut request = ResolveRequest::new();
    for target in targets {
        if target.trim().is_empty() {
            return Err(CliError::InvalidArguments("empty target name".to_string()));
        }
        request = request.target(target.trim());
    }
    for text in constraints {
        let constraint: UserConstraint = text.parse()?;
        request = request.constraint(constraint);
    }
    Ok(request)
}

/// Run the search on a blocking thread while handling its events
async fn solve_with_events(
    index: Index,
    config: Config,
    request: ResolveRequest,
    handler: &EventHandler,
) -> Result<Resolution, CliError> {
    let (event_sender, mut event_receiver) = sprout_events::channel();

    let mut task = tokio::task::spawn_blocking(move || {
        Resolver::new(&index, config.solver)
            .with_event_sender(event_sender)
            .solve(&request)
    });

    loop {
        select! {
            joined = &mut task => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    handler.handle_event(event);
                }
                let outcome = joined
                    .map_err(|e| sprout_errors::Error::internal(format!("solver task failed: {e}")))?;
                return outcome.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    handler.handle_event(event);
                }
            }
        }
    }
}

fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    // RUST_LOG takes precedence over the --debug default
    let default_filter = if debug_enabled_flag {
        "info,sprout=debug,sprout_resolver=debug,sprout_index=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // Logs stay on stderr so stdout carries only the JSON result
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug_enabled_flag)
            .with_env_filter(filter)
            .init();
    }
}
