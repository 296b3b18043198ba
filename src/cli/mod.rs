//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod convert;
mod entries;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::artifact::Platform;
use crate::config::{self, CliOverrides, ConfigError};
use crate::context::ResolveContext;
use crate::error::MappingError;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Mapchain - resolve, compose and convert symbol mapping tables
#[derive(Parser)]
#[command(name = "mapchain")]
#[command(about = "Mapchain - resolve, compose and convert symbol mapping tables")]
#[command(version)]
pub struct Cli {
    /// Path to mappings.toml (default: search upward from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the table converting names of one entry into another
    Convert {
        /// Entry whose names are the input
        #[arg(long)]
        from: String,

        /// Entry whose names are the output
        #[arg(long)]
        to: String,

        /// Write the table as Tiny v2 instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured platform (client, server, joined)
        #[arg(long)]
        platform: Option<Platform>,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Print the state key of a conversion
    Key {
        /// Entry whose names are the input
        #[arg(long)]
        from: String,

        /// Entry whose names are the output
        #[arg(long)]
        to: String,
    },
    /// List configured entries
    Entries {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate mappings.toml and the entry graph
    Validate,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // A logger may already be installed when embedded.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Load the configuration and build a resolution context from it.
pub(crate) fn load_context(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<ResolveContext, ConfigError> {
    let (mut config, root) = config::load_config(config_path)?;
    config::merge_cli_overrides(&mut config, overrides);
    config::build_context(&config, &root)
}

/// Report a configuration failure.
pub(crate) fn config_failure(error: &ConfigError) -> ExitCode {
    eprintln!("Error: {}", error);
    ExitCode::from(EXIT_ERROR)
}

/// Exit code for a mapping failure; unknown entry names are argument errors.
fn mapping_exit_code(error: &MappingError) -> u8 {
    match error {
        MappingError::UnknownEntry(_) => EXIT_INVALID_ARGS,
        MappingError::Conversion { source, .. } => mapping_exit_code(source),
        _ => EXIT_ERROR,
    }
}

/// Report a mapping failure.
pub(crate) fn mapping_failure(error: &MappingError) -> ExitCode {
    eprintln!("Error: {}", error);
    ExitCode::from(mapping_exit_code(error))
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Convert { from, to, output, platform, jobs } => {
            let overrides = CliOverrides { platform, jobs, ..Default::default() };
            convert::run_convert(config_path, &overrides, &from, &to, output.as_deref())
        }
        Commands::Key { from, to } => convert::run_key(config_path, &from, &to),
        Commands::Entries { json } => entries::run_entries(config_path, json),
        Commands::Validate => entries::run_validate(config_path),
    }
}
