//! `qtl case` command - Test case listing, display and deletion

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::utils::{confirm, effective_format, open_session, print_structured};
use crate::cli::helpers::{escape_csv, escape_tsv, pad, single_line, styled_status, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::search::SearchText;
use crate::core::store::RecordFilter;
use crate::entities::case::TestCase;
use crate::entities::record::Status;

#[derive(Subcommand, Debug)]
pub enum CaseCommands {
    /// List test cases with their latest status
    List(ListArgs),

    /// Show a test case's details
    Show(ShowArgs),

    /// Delete a test case with all of its records and images
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only cases in this collection
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    /// Search text (CJK text matches scenarios, anything else matches IDs)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only cases whose latest record has this status
    #[arg(long)]
    pub status: Option<Status>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Case ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Case ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// A case with the status of its latest record
#[derive(Debug, Serialize)]
struct CaseEntry {
    #[serde(flatten)]
    case: TestCase,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_status: Option<Status>,
}

pub fn run(cmd: CaseCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CaseCommands::List(args) => run_list(args, global),
        CaseCommands::Show(args) => run_show(args, global),
        CaseCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let store = &session.store;

    let cases = match args.collection.as_deref() {
        Some(name) => store.list_cases_by_collection(name),
        None => store.list_cases(),
    }
    .into_diagnostic()?;
    let latest = store.latest_per_case().into_diagnostic()?;
    let search = args.search.as_deref().and_then(SearchText::new);

    let entries: Vec<CaseEntry> = cases
        .into_iter()
        .filter(|c| {
            search
                .as_ref()
                .map_or(true, |s| s.matches(&c.case_id, Some(c.scenario.as_str())))
        })
        .map(|case| {
            let latest_status = latest.get(&case.case_id).map(|r| r.record.status);
            CaseEntry {
                case,
                latest_status,
            }
        })
        .filter(|e| args.status.map_or(true, |s| e.latest_status == Some(s)))
        .collect();

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&entries, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Csv => {
            println!("case_id,scenario,priority,collection,latest_status");
            for e in &entries {
                println!(
                    "{},{},{},{},{}",
                    escape_csv(&e.case.case_id),
                    escape_csv(&e.case.scenario),
                    escape_csv(e.case.priority.as_deref().unwrap_or("")),
                    escape_csv(e.case.collection_name.as_deref().unwrap_or("")),
                    e.latest_status.map(|s| s.to_string()).unwrap_or_default()
                );
            }
        }
        OutputFormat::Id => {
            for e in &entries {
                println!("{}", e.case.case_id);
            }
        }
        _ => {
            if entries.is_empty() {
                if !global.quiet {
                    println!("No test cases found.");
                }
                return Ok(());
            }

            println!(
                "{} {} {} {} {}",
                style(pad("ID", 16)).bold(),
                style(pad("SCENARIO", 32)).bold(),
                style(pad("PRIORITY", 8)).bold(),
                style(pad("COLLECTION", 16)).bold(),
                style("LATEST").bold()
            );
            println!("{}", "-".repeat(84));
            for e in &entries {
                println!(
                    "{} {} {} {} {}",
                    pad(&escape_tsv(&truncate_str(&e.case.case_id, 16)), 16),
                    pad(&escape_tsv(&truncate_str(&single_line(&e.case.scenario), 16)), 32),
                    pad(e.case.priority.as_deref().unwrap_or("-"), 8),
                    pad(&truncate_str(e.case.collection_name.as_deref().unwrap_or("-"), 16), 16),
                    e.latest_status
                        .map(styled_status)
                        .unwrap_or_else(|| style("not run").dim().to_string())
                );
            }

            if !global.quiet {
                println!();
                println!("{} case(s) found.", style(entries.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let case = session
        .store
        .get_case(&args.id)
        .into_diagnostic()?
        .ok_or_else(|| miette::miette!("Test case not found: {}", args.id))?;

    let format = effective_format(global, OutputFormat::Yaml);
    if print_structured(&case, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Id => println!("{}", case.case_id),
        _ => {
            println!("{}: {}", style("ID").bold(), case.case_id);
            println!("{}: {}", style("Scenario").bold(), case.scenario);
            println!(
                "{}: {}",
                style("Steps").bold(),
                case.test_steps.as_deref().unwrap_or("-")
            );
            println!("{}: {}", style("Expected").bold(), case.expected_result);
            println!(
                "{}: {}",
                style("Priority").bold(),
                case.priority.as_deref().unwrap_or("-")
            );
            println!(
                "{}: {}",
                style("Collection").bold(),
                case.collection_name.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    if session.store.get_case(&args.id).into_diagnostic()?.is_none() {
        let filter = RecordFilter {
            case_id: Some(args.id.clone()),
            ..Default::default()
        };
        if session.store.query_records(&filter).into_diagnostic()?.is_empty() {
            return Err(miette::miette!("Test case not found: {}", args.id));
        }
    }

    let prompt = format!(
        "Delete case {} and all of its execution records?",
        args.id
    );
    if !confirm(&prompt, args.yes, global)? {
        println!("Cancelled.");
        return Ok(());
    }

    let removed = session
        .store
        .delete_case(&args.id)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Deleted case {} ({} record(s))",
            style("✓").green(),
            style(&args.id).cyan(),
            removed
        );
    }
    Ok(())
}
