//! Store type definitions
//!
//! Query filters, aggregate results and operation outcomes.

use rusqlite::Connection;
use serde::Serialize;

use crate::entities::record::Status;

use super::table_columns;

// =========================================================================
// Schema State
// =========================================================================

/// Optional columns of `test_cases`.
///
/// Tables created before a migration, or where a migration could not apply,
/// may lack some of these; reads and writes adapt to what exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseColumns {
    pub test_steps: bool,
    pub precondition: bool,
    pub collection_name: bool,
}

impl Default for CaseColumns {
    fn default() -> Self {
        Self {
            test_steps: true,
            precondition: false,
            collection_name: true,
        }
    }
}

impl CaseColumns {
    pub(crate) fn detect(conn: &Connection) -> rusqlite::Result<Self> {
        let columns = table_columns(conn, "test_cases")?;
        let has = |name: &str| columns.iter().any(|c| c == name);
        Ok(Self {
            test_steps: has("test_steps"),
            precondition: has("precondition"),
            collection_name: has("case_collection_name"),
        })
    }
}

/// Result of one migration step during open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub step: &'static str,
    pub outcome: MigrationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The step changed the schema
    Applied,
    /// The schema was already in the target state
    AlreadyCurrent,
    /// The step failed and was skipped (message from the engine)
    Failed(String),
}

// =========================================================================
// Query Types
// =========================================================================

/// Filter for listing execution records. Absent fields are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub case_id: Option<String>,
    pub status: Option<Status>,
    /// Inclusive lower bound (epoch seconds)
    pub start: Option<i64>,
    /// Inclusive upper bound (epoch seconds)
    pub end: Option<i64>,
}

/// Aggregate execution counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub skipped: usize,
    /// passed / total * 100, or 0 when there are no records
    pub pass_rate: f64,
}

impl Statistics {
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Passed => self.passed,
            Status::Failed => self.failed,
            Status::Blocked => self.blocked,
            Status::Skipped => self.skipped,
        }
    }
}

/// Denormalized case + record + images row consumed by report renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub record_id: i64,
    pub case_id: String,
    pub scenario: String,
    pub test_steps: Option<String>,
    pub expected_result: String,
    pub priority: Option<String>,
    pub collection_name: Option<String>,
    pub status: Status,
    pub actual_result: String,
    pub notes: String,
    pub executor: Option<String>,
    pub timestamp: i64,
    pub images: Vec<String>,
}

// =========================================================================
// Operation Result Types
// =========================================================================

/// A row that could not be written during import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub case_id: String,
    pub message: String,
}

/// Outcome of a bulk import. Row failures do not abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub succeeded: usize,
    pub total: usize,
    /// Collection name used for rows that did not carry their own
    pub fallback_collection: Option<String>,
    pub failures: Vec<RowFailure>,
}

impl ImportOutcome {
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Outcome of deleting a whole collection; each case is deleted in its own
/// transaction so one failure doesn't hide the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteCollectionOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<RowFailure>,
}
