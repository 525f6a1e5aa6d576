//! Flat report rows: case joined with each matching record and its images

use std::collections::HashMap;

use super::{FlatRow, RecordFilter, TestStore};
use crate::core::error::StoreResult;
use crate::core::search::SearchText;
use crate::entities::case::TestCase;

impl TestStore {
    /// Project records matching `filter` into flat rows, newest first.
    ///
    /// Records whose case no longer exists are skipped. `collection` compares
    /// for equality against the case's collection name; `search` applies the
    /// shared CJK/ID rule.
    pub fn project_records(
        &self,
        filter: &RecordFilter,
        search: Option<&SearchText>,
        collection: Option<&str>,
    ) -> StoreResult<Vec<FlatRow>> {
        let records = self.query_records(filter)?;
        let mut cases: HashMap<String, Option<TestCase>> = HashMap::new();
        let mut rows = Vec::with_capacity(records.len());

        for entry in records {
            let case_id = entry.record.case_id.clone();
            let case = match cases.get(&case_id) {
                Some(cached) => cached.clone(),
                None => {
                    let loaded = self.get_case(&case_id)?;
                    cases.insert(case_id.clone(), loaded.clone());
                    loaded
                }
            };

            let Some(case) = case else {
                tracing::debug!(record_id = entry.record.record_id, case_id = %case_id, "skipping record with missing case");
                continue;
            };

            if let Some(name) = collection {
                if case.collection_name.as_deref().unwrap_or("") != name {
                    continue;
                }
            }
            if let Some(search) = search {
                if !search.matches(&case.case_id, Some(&case.scenario)) {
                    continue;
                }
            }

            let record = entry.record;
            rows.push(FlatRow {
                record_id: record.record_id,
                case_id: case.case_id,
                scenario: case.scenario,
                test_steps: case.test_steps,
                expected_result: case.expected_result,
                priority: case.priority,
                collection_name: case.collection_name,
                status: record.status,
                actual_result: record.actual_result,
                notes: record.notes,
                executor: record.executor,
                timestamp: record.timestamp,
                images: entry.images,
            });
        }

        Ok(rows)
    }
}
