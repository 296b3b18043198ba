//! Inspection command implementations (entries, validate)

use std::path::Path;
use std::process::ExitCode;

use crate::config::{self, CliOverrides, ConfigError};
use crate::entry::MappingEntry;

use super::{config_failure, load_context, EXIT_ERROR, EXIT_SUCCESS};

fn describe(entry: &MappingEntry) -> serde_json::Value {
    serde_json::json!({
        "name": entry.name(),
        "kind": entry.kind().name(),
        "format": entry.format_name(),
        "parent": entry.parent(),
        "dependency": entry.dependency().map(|d| d.to_string()),
        "inverse": entry.is_inverse(),
        "namespaces": entry.namespaces().map(|(from, to)| [from, to]),
    })
}

/// Execute the entries command
pub fn run_entries(config_path: Option<&Path>, json: bool) -> ExitCode {
    let ctx = match load_context(config_path, &CliOverrides::default()) {
        Ok(ctx) => ctx,
        Err(e) => return config_failure(&e),
    };
    let entries = ctx.registry().entries();

    if json {
        let list: Vec<serde_json::Value> = entries.map(describe).collect();
        match serde_json::to_string_pretty(&list) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        for entry in entries {
            let mut line = format!("{:<16} {:<10} {:<10}", entry.name(), entry.kind().name(), entry.format_name());
            if let Some(parent) = entry.parent() {
                line.push_str(&format!(" parent={parent}"));
            }
            if let Some((from, to)) = entry.namespaces() {
                line.push_str(&format!(" {from}->{to}"));
            }
            if entry.is_inverse() {
                line.push_str(" inverse");
            }
            println!("{}", line.trim_end());
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the validate command
pub fn run_validate(config_path: Option<&Path>) -> ExitCode {
    let result = config::load_config(config_path)
        .and_then(|(config, _)| config::build_registry(&config).map(|registry| (config, registry)));

    match result {
        Ok((config, registry)) => {
            println!(
                "OK: {} configured entries ({} including built-ins)",
                config.entries.len(),
                registry.entries().count()
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(ConfigError::Validation(problems)) => {
            for problem in &problems {
                eprintln!("  - {}", problem);
            }
            eprintln!("Error: {} problem(s) found", problems.len());
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => config_failure(&e),
    }
}
