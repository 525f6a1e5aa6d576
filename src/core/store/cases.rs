//! Case operations: upsert, lookup, listing and cascading delete

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{CaseColumns, DeleteCollectionOutcome, RowFailure, TestStore};
use crate::core::error::{StoreError, StoreResult};
use crate::core::rows::ImportRow;
use crate::entities::case::{normalize, RawCaseRow, TestCase};

impl TestStore {
    /// Insert or fully replace a case keyed by `case_id`.
    ///
    /// Collection resolution: the row's own value, then `explicit`, then the
    /// value already stored for this ID, else none.
    pub fn upsert_case(&mut self, row: &ImportRow, explicit: Option<&str>) -> StoreResult<()> {
        let columns = self.columns;
        self.in_transaction(|tx| write_case(tx, columns, row, explicit))
    }

    /// Get a case by exact ID
    pub fn get_case(&self, case_id: &str) -> StoreResult<Option<TestCase>> {
        let sql = format!("{} WHERE case_id = ?1", select_cases(self.columns));
        let raw = self
            .conn
            .query_row(&sql, params![case_id], raw_case_from_row)
            .optional()?;
        Ok(raw.map(normalize))
    }

    /// All cases in insertion order
    pub fn list_cases(&self) -> StoreResult<Vec<TestCase>> {
        let sql = format!("{} ORDER BY rowid", select_cases(self.columns));
        self.collect_cases(&sql, params![])
    }

    /// Cases whose collection name equals `name`
    pub fn list_cases_by_collection(&self, name: &str) -> StoreResult<Vec<TestCase>> {
        if !self.columns.collection_name {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{} WHERE case_collection_name = ?1 ORDER BY rowid",
            select_cases(self.columns)
        );
        self.collect_cases(&sql, params![name])
    }

    pub fn count_cases(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM test_cases", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Distinct, non-empty collection names in lexicographic order
    pub fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        if !self.columns.collection_name {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT case_collection_name FROM test_cases
             WHERE case_collection_name IS NOT NULL AND case_collection_name != ''
             ORDER BY case_collection_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Delete a case with all of its records and their images, as one unit.
    ///
    /// Records left behind by an already removed case are swept too. Returns
    /// the number of records removed; `CaseNotFound` only when neither a case
    /// row nor any record existed.
    pub fn delete_case(&mut self, case_id: &str) -> StoreResult<usize> {
        let removed = self.in_transaction(|tx| {
            let record_ids: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT record_id FROM test_records WHERE case_id = ?1")?;
                let ids = stmt
                    .query_map(params![case_id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                ids
            };

            {
                let mut delete_images = tx.prepare("DELETE FROM record_images WHERE record_id = ?1")?;
                for id in &record_ids {
                    delete_images.execute(params![id])?;
                }
            }

            tx.execute("DELETE FROM test_records WHERE case_id = ?1", params![case_id])?;
            let deleted = tx.execute("DELETE FROM test_cases WHERE case_id = ?1", params![case_id])?;
            if deleted == 0 && record_ids.is_empty() {
                return Err(StoreError::CaseNotFound(case_id.to_string()));
            }
            Ok(record_ids.len())
        })?;

        tracing::debug!(case_id, records = removed, "deleted case");
        Ok(removed)
    }

    /// Delete every case in a collection. Each case is its own transaction;
    /// failures are collected rather than stopping the sweep.
    pub fn delete_collection(&mut self, name: &str) -> StoreResult<DeleteCollectionOutcome> {
        let case_ids: Vec<String> = self
            .list_cases_by_collection(name)?
            .into_iter()
            .map(|c| c.case_id)
            .collect();

        let mut outcome = DeleteCollectionOutcome::default();
        for case_id in case_ids {
            match self.delete_case(&case_id) {
                Ok(_) => outcome.deleted.push(case_id),
                Err(e) => {
                    tracing::warn!(case_id = %case_id, error = %e, "failed to delete case");
                    outcome.failed.push(RowFailure {
                        case_id,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn collect_cases(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> StoreResult<Vec<TestCase>> {
        let mut stmt = self.conn.prepare(sql)?;
        let cases = stmt
            .query_map(params, raw_case_from_row)?
            .map(|r| r.map(normalize))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cases)
    }
}

/// SELECT over `test_cases` with NULL standing in for absent optional columns
fn select_cases(columns: CaseColumns) -> String {
    let pick = |present: bool, name: &'static str| if present { name } else { "NULL" };
    format!(
        "SELECT case_id, scenario, {}, {}, expected_result, priority, {} FROM test_cases",
        pick(columns.test_steps, "test_steps"),
        pick(columns.precondition, "precondition"),
        pick(columns.collection_name, "case_collection_name"),
    )
}

fn raw_case_from_row(row: &Row<'_>) -> rusqlite::Result<RawCaseRow> {
    Ok(RawCaseRow {
        case_id: row.get(0)?,
        scenario: row.get(1)?,
        test_steps: row.get(2)?,
        precondition: row.get(3)?,
        expected_result: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        priority: row.get(5)?,
        collection_name: row.get(6)?,
    })
}

/// Stored collection name for a case, if the case exists and has one
pub(super) fn stored_collection(
    conn: &Connection,
    columns: CaseColumns,
    case_id: &str,
) -> rusqlite::Result<Option<String>> {
    if !columns.collection_name {
        return Ok(None);
    }
    let name: Option<Option<String>> = conn
        .query_row(
            "SELECT case_collection_name FROM test_cases WHERE case_id = ?1",
            params![case_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name.flatten().filter(|s| !s.is_empty()))
}

/// Write one case row on an open connection or transaction
pub(super) fn write_case(
    conn: &Connection,
    columns: CaseColumns,
    row: &ImportRow,
    explicit: Option<&str>,
) -> StoreResult<()> {
    let collection = match row.own_collection().or(explicit.filter(|s| !s.is_empty())) {
        Some(name) => Some(name.to_string()),
        None => stored_collection(conn, columns, &row.case_id)?,
    };
    let steps = row.resolved_steps();

    // Legacy tables without test_steps keep the steps in precondition
    let steps_column = if columns.test_steps {
        "test_steps"
    } else {
        "precondition"
    };

    if columns.collection_name {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO test_cases
                 (case_id, scenario, {steps_column}, expected_result, priority, case_collection_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                row.case_id,
                row.scenario,
                steps,
                row.expected_result,
                row.priority,
                collection
            ],
        )?;
    } else {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO test_cases
                 (case_id, scenario, {steps_column}, expected_result, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![row.case_id, row.scenario, steps, row.expected_result, row.priority],
        )?;
    }
    Ok(())
}
