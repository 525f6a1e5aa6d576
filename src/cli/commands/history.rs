//! `qtl history` command - Filtered execution history

use console::style;
use miette::Result;

use crate::cli::commands::utils::{effective_format, open_session, print_structured};
use crate::cli::helpers::{escape_csv, escape_tsv, pad, single_line, styled_status, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dates::{format_timestamp, parse_range};
use crate::core::search::SearchText;
use crate::core::store::RecordFilter;
use crate::entities::record::Status;

/// Record filters shared by `history` and `report`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only records of this case
    #[arg(long = "case")]
    pub case_id: Option<String>,

    /// Only records with this status
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Earliest day (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest day (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Search text (CJK text matches scenarios, anything else matches IDs)
    #[arg(long)]
    pub search: Option<String>,

    /// Only cases in this collection
    #[arg(long, short = 'c')]
    pub collection: Option<String>,
}

impl FilterArgs {
    /// Store filter for these arguments; fails on malformed dates
    pub fn record_filter(&self) -> Result<RecordFilter> {
        let (start, end) = parse_range(self.from.as_deref(), self.to.as_deref())
            .map_err(|e| miette::miette!("{}", e))?;
        Ok(RecordFilter {
            case_id: self.case_id.clone().filter(|id| !id.trim().is_empty()),
            status: self.status,
            start,
            end,
        })
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Show at most this many records
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn run(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let filter = args.filter.record_filter()?;
    let search = args.filter.search.as_deref().and_then(SearchText::new);

    let session = open_session(global)?;
    let mut rows = session
        .store
        .project_records(&filter, search.as_ref(), args.filter.collection())
        .map_err(|e| miette::miette!("{}", e))?;
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&rows, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Csv => {
            println!("record_id,case_id,scenario,status,actual_result,notes,executor,timestamp,images");
            for row in &rows {
                println!(
                    "{},{},{},{},{},{},{},{},{}",
                    row.record_id,
                    escape_csv(&row.case_id),
                    escape_csv(&row.scenario),
                    row.status,
                    escape_csv(&row.actual_result),
                    escape_csv(&row.notes),
                    escape_csv(row.executor.as_deref().unwrap_or("")),
                    format_timestamp(row.timestamp),
                    escape_csv(&row.images.join(", "))
                );
            }
        }
        OutputFormat::Id => {
            for row in &rows {
                println!("{}", row.record_id);
            }
        }
        _ => {
            if rows.is_empty() {
                if !global.quiet {
                    println!("No execution records found.");
                }
                return Ok(());
            }

            println!(
                "{} {} {} {} {} {}",
                style(pad("RECORD", 7)).bold(),
                style(pad("CASE", 16)).bold(),
                style(pad("SCENARIO", 28)).bold(),
                style(pad("STATUS", 8)).bold(),
                style(pad("TIME", 20)).bold(),
                style("ACTUAL").bold()
            );
            println!("{}", "-".repeat(96));
            for row in &rows {
                println!(
                    "{} {} {} {} {} {}",
                    pad(&row.record_id.to_string(), 7),
                    pad(&escape_tsv(&truncate_str(&row.case_id, 16)), 16),
                    pad(&escape_tsv(&truncate_str(&single_line(&row.scenario), 14)), 28),
                    pad(&styled_status(row.status), 8),
                    pad(&format_timestamp(row.timestamp), 20),
                    truncate_str(&single_line(&row.actual_result), 40)
                );
            }

            if !global.quiet {
                println!();
                println!("{} record(s) found.", style(rows.len()).cyan());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_build_record_filter() {
        let args = FilterArgs {
            case_id: Some("TC-1".into()),
            status: Some(Status::Failed),
            from: Some("2024-03-01".into()),
            to: Some("2024-03-02".into()),
            ..Default::default()
        };
        let filter = args.record_filter().unwrap();
        assert_eq!(filter.case_id.as_deref(), Some("TC-1"));
        assert_eq!(filter.status, Some(Status::Failed));
        let (start, end) = (filter.start.unwrap(), filter.end.unwrap());
        assert!(end - start >= 2 * 23 * 3600);
    }

    #[test]
    fn test_filter_args_reject_bad_date() {
        let args = FilterArgs {
            from: Some("03/01/2024".into()),
            ..Default::default()
        };
        assert!(args.record_filter().is_err());
    }

    #[test]
    fn test_blank_collection_is_no_filter() {
        let args = FilterArgs {
            collection: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(args.collection(), None);
    }
}
