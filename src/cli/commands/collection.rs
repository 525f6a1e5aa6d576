//! `qtl collection` command - Case collection management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::utils::{confirm, effective_format, open_session, print_structured};
use crate::cli::helpers::{escape_csv, pad};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// List collection names with case counts
    List,

    /// Delete every case in a collection
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Collection name
    pub name: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct CollectionEntry {
    name: String,
    cases: usize,
}

pub fn run(cmd: CollectionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CollectionCommands::List => run_list(global),
        CollectionCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let store = &session.store;

    let mut entries = Vec::new();
    for name in store.list_collection_names().into_diagnostic()? {
        let cases = store.list_cases_by_collection(&name).into_diagnostic()?.len();
        entries.push(CollectionEntry { name, cases });
    }

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&entries, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Csv => {
            println!("name,cases");
            for e in &entries {
                println!("{},{}", escape_csv(&e.name), e.cases);
            }
        }
        OutputFormat::Id => {
            for e in &entries {
                println!("{}", e.name);
            }
        }
        _ => {
            if entries.is_empty() {
                if !global.quiet {
                    println!("No collections found.");
                }
                return Ok(());
            }
            println!("{} {}", style(pad("COLLECTION", 32)).bold(), style("CASES").bold());
            for e in &entries {
                println!("{} {}", pad(&e.name, 32), e.cases);
            }
        }
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let count = session
        .store
        .list_cases_by_collection(&args.name)
        .into_diagnostic()?
        .len();
    if count == 0 {
        return Err(miette::miette!("Collection not found or empty: {}", args.name));
    }

    let prompt = format!(
        "Delete collection {} ({} case(s)) and all of their records?",
        args.name, count
    );
    if !confirm(&prompt, args.yes, global)? {
        println!("Cancelled.");
        return Ok(());
    }

    let outcome = session
        .store
        .delete_collection(&args.name)
        .map_err(|e| miette::miette!("{}", e))?;

    for failure in &outcome.failed {
        eprintln!(
            "{} {}: {}",
            style("✗").red(),
            style(&failure.case_id).cyan(),
            failure.message
        );
    }
    if !global.quiet {
        println!(
            "{} Deleted {} case(s) from {}",
            style("✓").green(),
            style(outcome.deleted.len()).cyan(),
            style(&args.name).cyan()
        );
    }
    if !outcome.failed.is_empty() {
        return Err(miette::miette!(
            "{} case(s) could not be deleted",
            outcome.failed.len()
        ));
    }
    Ok(())
}
