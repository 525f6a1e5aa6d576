//! Report generation as a background task
//!
//! A report runs on its own thread with its own store connection. It takes a
//! snapshot of the request, streams `ReportEvent::Progress` updates over a
//! channel and ends with exactly one terminal event: `Completed` with the
//! output path, or `Failed` with a reason.
//!
//! Cancellation is cooperative. The flag is checked before images are
//! copied, before rendering and before the final write. A cancelled run
//! removes everything it created.

mod document;
mod images;
mod spreadsheet;

pub use spreadsheet::CSV_HEADERS;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::core::error::StoreError;
use crate::core::search::SearchText;
use crate::core::store::{FlatRow, RecordFilter, TestStore};
use document::render_markdown;
use images::{Artifacts, ImageCopier};
use spreadsheet::write_csv;

/// Failure inside a report run. Never touches the store.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("no records match")]
    NoRecords,
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Spreadsheet, one row per record
    Csv,
    /// Document with statistics and embedded screenshots
    #[value(alias = "markdown")]
    Md,
}

impl ReportFormat {
    /// Guess from the output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ReportFormat::Csv),
            "md" | "markdown" => Some(ReportFormat::Md),
            _ => None,
        }
    }
}

/// Everything a report run needs, captured by value at launch
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub format: ReportFormat,
    pub output: PathBuf,
    pub filter: RecordFilter,
    pub search: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Querying,
    CopyingImages,
    Rendering,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Querying => "querying records",
            Stage::CopyingImages => "copying images",
            Stage::Rendering => "rendering",
            Stage::Writing => "writing output",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Progress { stage: Stage, percent: u8 },
    Completed(PathBuf),
    Failed(String),
}

/// Terminal result of a report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Completed(PathBuf),
    Failed(String),
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn checkpoint(&self) -> Result<(), ReportError> {
        if self.is_cancelled() {
            Err(ReportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Caller side of a running report
pub struct ReportHandle {
    events: Receiver<ReportEvent>,
    cancel: CancelFlag,
    worker: Option<JoinHandle<()>>,
}

impl ReportHandle {
    /// Ask the task to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Block until the task ends, forwarding progress to `on_progress`.
    ///
    /// A task that dies without a terminal event is reported as failed.
    pub fn wait(mut self, mut on_progress: impl FnMut(Stage, u8)) -> ReportOutcome {
        let mut outcome = None;
        for event in self.events.iter() {
            match event {
                ReportEvent::Progress { stage, percent } => on_progress(stage, percent),
                ReportEvent::Completed(path) => {
                    outcome = Some(ReportOutcome::Completed(path));
                    break;
                }
                ReportEvent::Failed(reason) => {
                    outcome = Some(ReportOutcome::Failed(reason));
                    break;
                }
            }
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() && outcome.is_none() {
                outcome = Some(ReportOutcome::Failed("report task panicked".to_string()));
            }
        }
        outcome.unwrap_or_else(|| ReportOutcome::Failed("report task ended without a result".to_string()))
    }
}

/// Start a report on a background thread reading `db_path`
pub fn spawn(db_path: PathBuf, request: ReportRequest) -> ReportHandle {
    let (tx, rx) = mpsc::channel();
    let cancel = CancelFlag::default();
    let flag = cancel.clone();

    let worker = std::thread::spawn(move || {
        let progress_tx = tx.clone();
        let progress = move |stage: Stage, percent: u8| {
            let _ = progress_tx.send(ReportEvent::Progress { stage, percent });
        };

        let result = TestStore::open_existing(&db_path)
            .map_err(ReportError::from)
            .and_then(|store| generate(&store, &request, &flag, progress));

        send_terminal(&tx, result);
    });

    ReportHandle {
        events: rx,
        cancel,
        worker: Some(worker),
    }
}

fn send_terminal(tx: &Sender<ReportEvent>, result: Result<PathBuf, ReportError>) {
    let event = match result {
        Ok(path) => {
            tracing::info!(path = %path.display(), "report written");
            ReportEvent::Completed(path)
        }
        Err(e) => {
            tracing::warn!(error = %e, "report failed");
            ReportEvent::Failed(e.to_string())
        }
    };
    let _ = tx.send(event);
}

/// Run a report synchronously against an open store.
///
/// On any failure, including cancellation, files created by this run are
/// removed before the error is returned.
pub fn generate(
    store: &TestStore,
    request: &ReportRequest,
    cancel: &CancelFlag,
    mut progress: impl FnMut(Stage, u8),
) -> Result<PathBuf, ReportError> {
    let mut artifacts = Artifacts::default();
    let result = run_stages(store, request, cancel, &mut progress, &mut artifacts);

    match result {
        Ok(path) if !cancel.is_cancelled() => Ok(path),
        Ok(_) => {
            artifacts.remove_all();
            Err(ReportError::Cancelled)
        }
        Err(e) => {
            artifacts.remove_all();
            Err(e)
        }
    }
}

fn run_stages(
    store: &TestStore,
    request: &ReportRequest,
    cancel: &CancelFlag,
    progress: &mut impl FnMut(Stage, u8),
    artifacts: &mut Artifacts,
) -> Result<PathBuf, ReportError> {
    tracing::debug!(stage = %Stage::Querying, output = %request.output.display(), "report stage");
    let search = request.search.as_deref().and_then(SearchText::new);
    let collection = request.collection.as_deref().filter(|c| !c.is_empty());
    let rows = store.project_records(&request.filter, search.as_ref(), collection)?;
    progress(Stage::Querying, 10);

    if rows.is_empty() {
        return Err(ReportError::NoRecords);
    }

    let output_dir = request
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !output_dir.exists() {
        artifacts.track_dir(&output_dir);
    }
    fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;

    cancel.checkpoint()?;
    tracing::debug!(stage = %Stage::CopyingImages, "report stage");
    progress(Stage::CopyingImages, 30);
    let folder = image_folder_name(request);
    let mut copier = ImageCopier::new(output_dir.join(&folder), folder);
    for path in rows.iter().flat_map(|r| r.images.iter()) {
        copier.copy(path, artifacts)?;
    }
    progress(Stage::CopyingImages, 50);

    cancel.checkpoint()?;
    tracing::debug!(stage = %Stage::Rendering, rows = rows.len(), "report stage");
    let content = render(store, request, &rows, &copier, &mut *progress)?;

    cancel.checkpoint()?;
    tracing::debug!(stage = %Stage::Writing, "report stage");
    artifacts.track_file(&request.output);
    fs::write(&request.output, content).map_err(io_error(&request.output))?;
    progress(Stage::Writing, 100);

    Ok(request.output.clone())
}

/// Spreadsheets share one `images/` folder; documents get `<stem>_images/`
fn image_folder_name(request: &ReportRequest) -> String {
    match request.format {
        ReportFormat::Csv => "images".to_string(),
        ReportFormat::Md => {
            let stem = request
                .output
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("report");
            format!("{}_images", stem)
        }
    }
}

fn render(
    store: &TestStore,
    request: &ReportRequest,
    rows: &[FlatRow],
    copier: &ImageCopier,
    progress: &mut impl FnMut(Stage, u8),
) -> Result<Vec<u8>, ReportError> {
    progress(Stage::Rendering, 50);
    let content = match request.format {
        ReportFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(rows, copier, &mut buf)?;
            buf
        }
        ReportFormat::Md => {
            let stats = store.statistics(request.filter.start, request.filter.end)?;
            let mut on_row = |done: usize| {
                let percent = 50 + (done * 40 / rows.len().max(1)) as u8;
                progress(Stage::Rendering, percent);
            };
            render_markdown(rows, &stats, copier, &mut on_row).into_bytes()
        }
    };
    progress(Stage::Rendering, 90);
    Ok(content)
}
