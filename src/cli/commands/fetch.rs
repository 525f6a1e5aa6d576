//! `qtl fetch` command - Retrieve test cases from the remote case service

use console::style;
use miette::Result;

use crate::cli::commands::import::import_rows;
use crate::cli::commands::utils::open_session;
use crate::cli::GlobalOpts;
use crate::core::remote::{FetchRequest, RemoteClient, RemoteError};

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Project ID on the case service
    #[arg(long)]
    pub project: String,

    /// Subtask name
    #[arg(long)]
    pub subtask: String,

    /// Test round
    #[arg(long)]
    pub round: String,

    /// Service base URL (overrides config `remote_url`)
    #[arg(long)]
    pub url: Option<String>,

    /// Collection name for fetched cases
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    /// Never prompt for a collection name
    #[arg(long)]
    pub no_input: bool,
}

pub fn run(args: FetchArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let base_url = args
        .url
        .or_else(|| session.config.remote_url.clone())
        .ok_or_else(|| {
            miette::miette!("No case service URL. Pass --url or set remote_url in config.yaml")
        })?;

    let client = RemoteClient::new(&base_url, session.config.remote_timeout())
        .map_err(|e| miette::miette!("{}", e))?;
    let request = FetchRequest {
        project_id: args.project,
        subtask_name: args.subtask,
        round: args.round,
    };

    let rows = match client.fetch_cases(&request) {
        Ok(rows) => rows,
        Err(RemoteError::Empty) => {
            if !global.quiet {
                println!("{} The case service returned no cases", style("!").yellow());
            }
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    if !global.quiet {
        println!(
            "{} Fetched {} case(s) from {}",
            style("✓").green(),
            style(rows.len()).cyan(),
            base_url
        );
    }

    import_rows(&mut session, &rows, args.collection, args.no_input, global)
}
