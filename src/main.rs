use clap::Parser;
use miette::Result;
use qtl::cli::{Cli, Commands};
use qtl::cli::commands;

fn main() -> Result<()> {
    // Terminate quietly on a closed pipe (`qtl history | head`)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    qtl::core::logging::init(global.verbose);

    match cli.command {
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::Fetch(args) => commands::fetch::run(args, &global),
        Commands::Case(cmd) => commands::case::run(cmd, &global),
        Commands::Collection(cmd) => commands::collection::run(cmd, &global),
        Commands::Record(cmd) => commands::record::run(cmd, &global),
        Commands::History(args) => commands::history::run(args, &global),
        Commands::Stats(args) => commands::stats::run(args, &global),
        Commands::Latest(args) => commands::latest::run(args, &global),
        Commands::Report(args) => commands::report::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
