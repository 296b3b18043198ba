//! Conversion command implementations (convert, key)

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::format::tiny;
use crate::remap::RemapRequest;
use crate::table::MappingTable;

use super::{config_failure, load_context, mapping_failure, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the convert command
pub fn run_convert(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    from: &str,
    to: &str,
    output: Option<&Path>,
) -> ExitCode {
    let ctx = match load_context(config_path, overrides) {
        Ok(ctx) => ctx,
        Err(e) => return config_failure(&e),
    };

    let request = RemapRequest::new(from, to);
    let renamer = match request.provide_renamer(&ctx) {
        Ok(renamer) => renamer,
        Err(e) => return mapping_failure(&e),
    };

    let empty = MappingTable::new();
    let table = renamer.as_ref().map_or(&empty, |r| r.table());

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, tiny::write(table, from, to)) {
                eprintln!("Error: Failed to write {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            println!("Wrote {} ({})", path.display(), table.stats());
        }
        None if renamer.is_none() => println!("'{from}' -> '{to}' is a no-op"),
        None => println!("'{from}' -> '{to}': {}", table.stats()),
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the key command
pub fn run_key(config_path: Option<&Path>, from: &str, to: &str) -> ExitCode {
    let ctx = match load_context(config_path, &CliOverrides::default()) {
        Ok(ctx) => ctx,
        Err(e) => return config_failure(&e),
    };

    match RemapRequest::new(from, to).state_key(&ctx) {
        Ok(key) => {
            println!("{key}");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => mapping_failure(&e),
    }
}
