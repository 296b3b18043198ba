//! Mapchain - command-line tool for resolving and converting symbol mapping tables

use std::process::ExitCode;

use mapchain::cli;

fn main() -> ExitCode {
    cli::run()
}
