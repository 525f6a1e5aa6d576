//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::store::{MigrationOutcome, TestStore};

/// Layered configuration plus the open store
pub struct Session {
    pub config: Config,
    pub store: TestStore,
}

/// Load configuration and open (creating if needed) the store
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let config = Config::load(global.data_dir.as_deref());
    let db_path = config.db_path();
    tracing::debug!(db = %db_path.display(), "opening store");

    let store = TestStore::open(&db_path).into_diagnostic()?;
    if !global.quiet {
        for status in store.migration_report() {
            if let MigrationOutcome::Failed(reason) = &status.outcome {
                eprintln!(
                    "{} migration '{}' could not be applied: {}",
                    style("warning:").yellow().bold(),
                    status.step,
                    reason
                );
            }
        }
    }

    Ok(Session { config, store })
}

/// Resolve `auto` to the given default
pub fn effective_format(global: &GlobalOpts, auto: OutputFormat) -> OutputFormat {
    match global.format {
        OutputFormat::Auto => auto,
        f => f,
    }
}

/// Print a value as JSON or YAML. Returns false for other formats.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
            Ok(true)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Ask for confirmation unless `yes` or quiet mode is set
pub fn confirm(prompt: &str, yes: bool, global: &GlobalOpts) -> Result<bool> {
    if yes || global.quiet {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}
