//! `qtl latest` command - Most recent execution of every case

use console::style;
use miette::Result;
use std::collections::BTreeMap;

use crate::cli::commands::utils::{effective_format, open_session, print_structured};
use crate::cli::helpers::{escape_csv, pad, single_line, styled_status, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dates::format_timestamp;
use crate::core::error::StoreResult;
use crate::core::store::TestStore;
use crate::entities::record::{RecordWithImages, Status};

#[derive(clap::Args, Debug)]
pub struct LatestArgs {
    /// Only cases whose latest record has this status
    #[arg(long, short = 's')]
    pub status: Option<Status>,
}

pub fn run(args: LatestArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let mut latest =
        latest_for_existing_cases(&session.store).map_err(|e| miette::miette!("{}", e))?;
    if let Some(status) = args.status {
        latest.retain(|_, r| r.record.status == status);
    }

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&latest, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Csv => {
            println!("case_id,record_id,status,timestamp,actual_result");
            for (case_id, r) in &latest {
                println!(
                    "{},{},{},{},{}",
                    escape_csv(case_id),
                    r.record.record_id,
                    r.record.status,
                    format_timestamp(r.record.timestamp),
                    escape_csv(&r.record.actual_result)
                );
            }
        }
        OutputFormat::Id => {
            for r in latest.values() {
                println!("{}", r.record.record_id);
            }
        }
        _ => {
            if latest.is_empty() {
                if !global.quiet {
                    println!("No execution records found.");
                }
                return Ok(());
            }

            println!(
                "{} {} {} {} {}",
                style(pad("CASE", 16)).bold(),
                style(pad("RECORD", 7)).bold(),
                style(pad("STATUS", 8)).bold(),
                style(pad("TIME", 20)).bold(),
                style("ACTUAL").bold()
            );
            println!("{}", "-".repeat(80));
            for (case_id, r) in &latest {
                println!(
                    "{} {} {} {} {}",
                    pad(&truncate_str(case_id, 16), 16),
                    pad(&r.record.record_id.to_string(), 7),
                    pad(&styled_status(r.record.status), 8),
                    pad(&format_timestamp(r.record.timestamp), 20),
                    truncate_str(&single_line(&r.record.actual_result), 40)
                );
            }
        }
    }
    Ok(())
}

/// Latest record per case, leaving out records whose case is gone
fn latest_for_existing_cases(
    store: &TestStore,
) -> StoreResult<BTreeMap<String, RecordWithImages>> {
    let mut latest = store.latest_per_case()?;
    let mut dangling = Vec::new();
    for case_id in latest.keys() {
        if store.get_case(case_id)?.is_none() {
            dangling.push(case_id.clone());
        }
    }
    for case_id in dangling {
        tracing::debug!(case_id = %case_id, "skipping latest record of missing case");
        latest.remove(&case_id);
    }
    Ok(latest)
}
