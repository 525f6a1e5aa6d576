//! `qtl stats` command - Execution counts and pass rate

use console::style;
use miette::Result;

use crate::cli::commands::utils::{effective_format, open_session, print_structured};
use crate::cli::helpers::{pad, styled_status};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::dates::parse_range;
use crate::entities::record::Status;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Earliest day (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest day (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let (start, end) = parse_range(args.from.as_deref(), args.to.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    let session = open_session(global)?;
    let stats = session
        .store
        .statistics(start, end)
        .map_err(|e| miette::miette!("{}", e))?;

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&stats, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Csv => {
            println!("total,passed,failed,blocked,skipped,pass_rate");
            println!(
                "{},{},{},{},{},{:.1}",
                stats.total, stats.passed, stats.failed, stats.blocked, stats.skipped, stats.pass_rate
            );
        }
        OutputFormat::Id => println!("{}", stats.total),
        _ => {
            println!("{}", style("Execution Statistics").bold());
            println!("{}", style("─".repeat(30)).dim());
            println!("{} {}", pad("Total", 12), style(stats.total).cyan());
            for status in Status::ALL {
                println!("{} {}", pad(&styled_status(status), 12), stats.count(status));
            }
            println!("{} {:.1}%", pad("Pass rate", 12), stats.pass_rate);
        }
    }
    Ok(())
}
