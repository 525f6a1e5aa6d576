//! `qtl import` command - Import test cases from a CSV export
//!
//! Recognized headers (Chinese or English):
//! - `用例ID` / `case_id` (required)
//! - `测试场景` / `scenario` (required)
//! - `预期结果` / `expected_result` (required)
//! - `测试步骤` / `test_steps`, `前置条件` / `precondition`
//! - `优先级` / `priority`, `案例集名称` / `collection_name`

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::path::PathBuf;

use crate::cli::commands::utils::{open_session, Session};
use crate::cli::GlobalOpts;
use crate::core::rows::{read_csv, template_headers, ImportRow};
use crate::core::settings::Settings;
use crate::core::store::ImportOutcome;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Collection name for rows that don't carry one
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    /// Never prompt for a collection name
    #[arg(long)]
    pub no_input: bool,

    /// Print a CSV template header and exit
    #[arg(long)]
    pub template: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        println!("{}", template_headers().join(","));
        return Ok(());
    }

    let Some(path) = args.file else {
        return Err(miette::miette!("No input file given"));
    };
    let file = File::open(&path)
        .map_err(|e| miette::miette!("Cannot open {}: {}", path.display(), e))?;
    let rows = read_csv(file).map_err(|e| miette::miette!("{}", e))?;

    if rows.is_empty() {
        if !global.quiet {
            println!("{} No rows found in {}", style("!").yellow(), path.display());
        }
        return Ok(());
    }

    let mut session = open_session(global)?;
    import_rows(&mut session, &rows, args.collection, args.no_input, global)
}

/// Reconcile rows into the store, prompting for a collection name when none
/// can be resolved
pub(crate) fn import_rows(
    session: &mut Session,
    rows: &[ImportRow],
    collection: Option<String>,
    no_input: bool,
    global: &GlobalOpts,
) -> Result<()> {
    let settings_path = session.config.settings_path();
    let mut prompted = false;

    let explicit = match collection.filter(|c| !c.trim().is_empty()) {
        Some(name) => Some(name),
        None if needs_prompt(session, rows, no_input)? => {
            prompted = true;
            prompt_collection(&Settings::load(&settings_path))?
        }
        None => None,
    };

    let outcome = session
        .store
        .import_cases(rows, explicit.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    if prompted && outcome.succeeded > 0 {
        let mut settings = Settings::load(&settings_path);
        settings.set_last_collection_name(explicit.as_deref());
        if let Err(e) = settings.save(&settings_path) {
            tracing::warn!(error = %e, "could not save settings");
        }
    }

    print_outcome(&outcome, global);
    if outcome.succeeded == 0 {
        return Err(miette::miette!("No cases were imported"));
    }
    Ok(())
}

fn needs_prompt(session: &Session, rows: &[ImportRow], no_input: bool) -> Result<bool> {
    if no_input || !console::Term::stderr().is_term() {
        return Ok(false);
    }
    if rows.iter().any(|r| r.own_collection().is_some()) {
        return Ok(false);
    }
    let inferred = session
        .store
        .inferred_collection(rows)
        .map_err(|e| miette::miette!("{}", e))?;
    Ok(inferred.is_none())
}

fn prompt_collection(settings: &Settings) -> Result<Option<String>> {
    let mut input = dialoguer::Input::<String>::new()
        .with_prompt("Collection name for these cases")
        .allow_empty(true);
    if let Some(last) = &settings.last_collection_name {
        input = input.default(last.clone());
    }
    let answer = input.interact_text().into_diagnostic()?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

fn print_outcome(outcome: &ImportOutcome, global: &GlobalOpts) {
    for failure in &outcome.failures {
        eprintln!(
            "{} {}: {}",
            style("✗").red(),
            style(&failure.case_id).cyan(),
            failure.message
        );
    }

    if global.quiet {
        return;
    }

    let mark = if outcome.is_complete() {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    print!(
        "{} Imported {}/{} case(s)",
        mark,
        style(outcome.succeeded).cyan(),
        outcome.total
    );
    match &outcome.fallback_collection {
        Some(name) => println!(" into collection {}", style(name).cyan()),
        None => println!(),
    }
}
