//! `qtl report` command - Export filtered records as a spreadsheet or document

use console::{style, Term};
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::history::FilterArgs;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::report::{self, ReportFormat, ReportOutcome, ReportRequest};

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Output file
    pub output: PathBuf,

    /// Report kind (defaults to the output extension, then csv)
    #[arg(long, value_enum)]
    pub kind: Option<ReportFormat>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

pub fn run(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let format = args
        .kind
        .or_else(|| ReportFormat::from_path(&args.output))
        .unwrap_or(ReportFormat::Csv);

    let request = ReportRequest {
        format,
        output: args.output.clone(),
        filter: args.filter.record_filter()?,
        search: args.filter.search.clone(),
        collection: args.filter.collection().map(str::to_string),
    };

    let config = Config::load(global.data_dir.as_deref());
    let handle = report::spawn(config.db_path(), request);

    let term = Term::stderr();
    let show_progress = !global.quiet && term.is_term();
    let outcome = handle.wait(|stage, percent| {
        tracing::debug!(%stage, percent, "report progress");
        if show_progress {
            let _ = term.clear_line();
            let _ = term.write_str(&format!("{:>3}% {}", percent, stage));
        }
    });
    if show_progress {
        let _ = term.clear_line();
    }

    match outcome {
        ReportOutcome::Completed(path) => {
            if !global.quiet {
                println!(
                    "{} Report written to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
            Ok(())
        }
        ReportOutcome::Failed(reason) => Err(miette::miette!("Report failed: {}", reason)),
    }
}
