//! Bulk import reconciliation

use super::cases::{stored_collection, write_case};
use super::{ImportOutcome, RowFailure, TestStore};
use crate::core::error::StoreResult;
use crate::core::rows::{check_batch, ImportRow};

impl TestStore {
    /// Merge a batch of case rows into the store.
    ///
    /// The batch is validated first (empty or duplicate IDs fail with no
    /// writes). Rows are then scanned in input order; the first one whose ID
    /// already has a stored collection name supplies the fallback for rows
    /// that carry none. `explicit` takes precedence over that fallback.
    ///
    /// Each row is written in its own transaction. A failing row is logged
    /// and reported in the outcome without stopping the batch.
    pub fn import_cases(
        &mut self,
        rows: &[ImportRow],
        explicit: Option<&str>,
    ) -> StoreResult<ImportOutcome> {
        check_batch(rows)?;

        let inferred = self.inferred_collection(rows)?;
        let fallback = explicit
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or(inferred);

        let mut outcome = ImportOutcome {
            succeeded: 0,
            total: rows.len(),
            fallback_collection: fallback.clone(),
            failures: Vec::new(),
        };

        let columns = self.columns;
        for row in rows {
            let result = self.in_transaction(|tx| write_case(tx, columns, row, fallback.as_deref()));
            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(case_id = %row.case_id, error = %e, "failed to import case");
                    outcome.failures.push(RowFailure {
                        case_id: row.case_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded,
            total = outcome.total,
            collection = ?outcome.fallback_collection,
            "import finished"
        );
        Ok(outcome)
    }

    /// First stored collection name among `rows`, scanning in input order
    pub fn inferred_collection(&self, rows: &[ImportRow]) -> StoreResult<Option<String>> {
        for row in rows {
            if let Some(name) = stored_collection(&self.conn, self.columns, &row.case_id)? {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }
}
