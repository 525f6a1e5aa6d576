//! `qtl record` command - Execution record management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::utils::{effective_format, open_session, print_structured};
use crate::cli::GlobalOpts;
use crate::cli::OutputFormat;
use crate::core::dates::format_timestamp;
use crate::entities::record::{NewRecord, RecordUpdate, Status};

#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Record an execution of a test case
    New(NewArgs),

    /// Change fields of an existing record
    Update(UpdateArgs),

    /// Show a record with its images
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Case ID the execution belongs to
    pub case_id: String,

    /// Outcome (passed/failed/blocked/skipped or 通过/失败/阻塞/跳过)
    #[arg(long, short = 's')]
    pub status: Status,

    /// Observed result
    #[arg(long, short = 'a', default_value = "")]
    pub actual: String,

    /// Free-form notes
    #[arg(long, short = 'n', default_value = "")]
    pub notes: String,

    /// Screenshot to attach (repeatable, kept in order)
    #[arg(long = "image", short = 'i')]
    pub images: Vec<PathBuf>,

    /// Executor name (defaults to config `executor`, then the login name)
    #[arg(long, short = 'e')]
    pub executor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Record ID
    pub record_id: i64,

    /// New outcome
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// New observed result
    #[arg(long, short = 'a')]
    pub actual: Option<String>,

    /// New notes
    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// New executor name
    #[arg(long, short = 'e')]
    pub executor: Option<String>,

    /// Replace the attached screenshots (repeatable)
    #[arg(long = "image", short = 'i', conflicts_with = "clear_images")]
    pub images: Vec<PathBuf>,

    /// Remove every attached screenshot
    #[arg(long)]
    pub clear_images: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Record ID
    pub record_id: i64,
}

pub fn run(cmd: RecordCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RecordCommands::New(args) => run_new(args, global),
        RecordCommands::Update(args) => run_update(args, global),
        RecordCommands::Show(args) => run_show(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    if session.store.get_case(&args.case_id).into_diagnostic()?.is_none() {
        return Err(miette::miette!("Test case not found: {}", args.case_id));
    }

    let images = store_images(&session.config.images_dir(), &args.case_id, &args.images)?;
    let mut new = NewRecord::new(&args.case_id, args.status);
    new.actual_result = args.actual;
    new.notes = args.notes;
    new.images = images;
    new.executor = args.executor.or_else(|| session.config.executor());

    let record_id = session
        .store
        .create_record(&new)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        OutputFormat::Id => println!("{}", record_id),
        _ if global.quiet => {}
        _ => println!(
            "{} Recorded {} for {} as record {}",
            style("✓").green(),
            args.status,
            style(&args.case_id).cyan(),
            style(record_id).cyan()
        ),
    }
    Ok(())
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let Some(existing) = session.store.get_record(args.record_id).into_diagnostic()? else {
        return Err(miette::miette!("Execution record not found: {}", args.record_id));
    };

    let images = if args.clear_images {
        Some(Vec::new())
    } else if args.images.is_empty() {
        None
    } else {
        Some(store_images(
            &session.config.images_dir(),
            &existing.record.case_id,
            &args.images,
        )?)
    };

    let update = RecordUpdate {
        status: args.status,
        actual_result: args.actual,
        notes: args.notes,
        executor: args.executor,
        images,
    };

    let updated = session
        .store
        .update_record(args.record_id, &update)
        .map_err(|e| miette::miette!("{}", e))?;
    if !updated {
        return Err(miette::miette!("Execution record not found: {}", args.record_id));
    }

    if !global.quiet {
        println!(
            "{} Updated record {}",
            style("✓").green(),
            style(args.record_id).cyan()
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let record = session
        .store
        .get_record(args.record_id)
        .into_diagnostic()?
        .ok_or_else(|| miette::miette!("Execution record not found: {}", args.record_id))?;

    let format = effective_format(global, OutputFormat::Yaml);
    if print_structured(&record, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Id => println!("{}", record.record.record_id),
        _ => {
            let r = &record.record;
            println!("{}: {}", style("Record").bold(), r.record_id);
            println!("{}: {}", style("Case").bold(), r.case_id);
            println!("{}: {}", style("Status").bold(), r.status.stored_label());
            println!("{}: {}", style("Actual").bold(), r.actual_result);
            println!("{}: {}", style("Notes").bold(), r.notes);
            println!(
                "{}: {}",
                style("Executor").bold(),
                r.executor.as_deref().unwrap_or("-")
            );
            println!("{}: {}", style("Time").bold(), format_timestamp(r.timestamp));
            for (i, path) in record.images.iter().enumerate() {
                println!("{} {}: {}", style("Image").bold(), i + 1, path);
            }
        }
    }
    Ok(())
}

/// Copy screenshots into the managed images directory.
///
/// Files are named `<case_id>_<unix time>_<n>.<ext>`; the stored paths are
/// absolute so records stay valid whatever the working directory.
fn store_images(images_dir: &Path, case_id: &str, sources: &[PathBuf]) -> Result<Vec<String>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let images_dir = if images_dir.is_absolute() {
        images_dir.to_path_buf()
    } else {
        std::env::current_dir().into_diagnostic()?.join(images_dir)
    };
    fs::create_dir_all(&images_dir)
        .map_err(|e| miette::miette!("Cannot create {}: {}", images_dir.display(), e))?;

    let stamp = chrono::Local::now().timestamp();
    let mut stored = Vec::with_capacity(sources.len());
    for (n, source) in sources.iter().enumerate() {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let target = images_dir.join(format!("{}_{}_{}.{}", case_id, stamp, n, ext));
        fs::copy(source, &target)
            .map_err(|e| miette::miette!("Cannot copy image {}: {}", source.display(), e))?;
        tracing::debug!(from = %source.display(), to = %target.display(), "stored image");
        stored.push(target.to_string_lossy().into_owned());
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_images_copies_in_order() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let a = src.path().join("a.png");
        let b = src.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let stored = store_images(dest.path(), "TC-1", &[a, b]).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].ends_with("_0.png"));
        assert!(stored[1].ends_with("_1.jpg"));
        assert_eq!(fs::read(&stored[1]).unwrap(), b"b");
        assert!(Path::new(&stored[0]).is_absolute());
    }

    #[test]
    fn test_store_images_missing_source_fails() {
        let dest = tempdir().unwrap();
        let missing = dest.path().join("nope.png");
        assert!(store_images(dest.path(), "TC-1", &[missing]).is_err());
    }
}
