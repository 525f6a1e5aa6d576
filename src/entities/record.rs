//! Execution record entity (one run of a test case)

use serde::{Deserialize, Serialize};

/// Outcome of a single execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Blocked,
    Skipped,
}

impl Status {
    /// All statuses in report order
    pub const ALL: [Status; 4] = [
        Status::Passed,
        Status::Failed,
        Status::Blocked,
        Status::Skipped,
    ];

    /// Label persisted in the `test_records.status` column.
    ///
    /// Stores written by earlier releases use these labels, so they are kept
    /// as the on-disk representation.
    pub fn stored_label(&self) -> &'static str {
        match self {
            Status::Passed => "通过",
            Status::Failed => "失败",
            Status::Blocked => "阻塞",
            Status::Skipped => "跳过",
        }
    }

    /// Parse either a stored label or an English name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "通过" => return Some(Status::Passed),
            "失败" => return Some(Status::Failed),
            "阻塞" => return Some(Status::Blocked),
            "跳过" => return Some(Status::Skipped),
            _ => {}
        }
        match s.trim().to_lowercase().as_str() {
            "passed" | "pass" => Some(Status::Passed),
            "failed" | "fail" => Some(Status::Failed),
            "blocked" | "block" => Some(Status::Blocked),
            "skipped" | "skip" => Some(Status::Skipped),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Passed => write!(f, "passed"),
            Status::Failed => write!(f, "failed"),
            Status::Blocked => write!(f, "blocked"),
            Status::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s).ok_or_else(|| {
            format!(
                "Unknown status: '{}'. Expected one of: passed, failed, blocked, skipped",
                s
            )
        })
    }
}

/// A stored execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub record_id: i64,
    /// Owning case. Not enforced by the store; may dangle after a case is removed
    /// out from under a reader.
    pub case_id: String,
    pub status: Status,
    #[serde(default)]
    pub actual_result: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
    /// Seconds since the Unix epoch, refreshed on every write
    pub timestamp: i64,
}

/// An execution record together with its ordered image paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWithImages {
    #[serde(flatten)]
    pub record: ExecutionRecord,
    pub images: Vec<String>,
}

/// Fields for a new execution record
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub case_id: String,
    pub status: Status,
    pub actual_result: String,
    pub notes: String,
    pub images: Vec<String>,
    pub executor: Option<String>,
}

impl NewRecord {
    pub fn new(case_id: impl Into<String>, status: Status) -> Self {
        Self {
            case_id: case_id.into(),
            status,
            actual_result: String::new(),
            notes: String::new(),
            images: Vec::new(),
            executor: None,
        }
    }
}

/// Partial update of an execution record.
///
/// `None` leaves a field untouched. For `images`, `Some(vec![])` clears the
/// image set while `None` keeps it.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub status: Option<Status>,
    pub actual_result: Option<String>,
    pub notes: Option<String>,
    pub executor: Option<String>,
    pub images: Option<Vec<String>>,
}
