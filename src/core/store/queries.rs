//! Record queries and aggregate statistics

use std::collections::BTreeMap;

use rusqlite::ToSql;

use super::records::{images_for, record_from_row, RECORD_COLUMNS};
use super::{RecordFilter, Statistics, TestStore};
use crate::core::error::StoreResult;
use crate::entities::record::{ExecutionRecord, RecordWithImages, Status};

impl TestStore {
    /// Records matching `filter`, newest first. Ties on timestamp put the
    /// higher record ID first.
    pub fn query_records(&self, filter: &RecordFilter) -> StoreResult<Vec<RecordWithImages>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM test_records WHERE 1=1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref case_id) = filter.case_id {
            sql.push_str(&format!(" AND case_id = ?{}", params.len() + 1));
            params.push(Box::new(case_id.clone()));
        }
        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", params.len() + 1));
            params.push(Box::new(status));
        }
        push_range(&mut sql, &mut params, filter.start, filter.end);

        sql.push_str(" ORDER BY timestamp DESC, record_id DESC");

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(param_refs.as_slice(), record_from_row)?
            .collect::<rusqlite::Result<Vec<ExecutionRecord>>>()?;

        self.attach_images(records)
    }

    /// The latest record of every case that has one, keyed by case ID.
    ///
    /// Latest means maximum timestamp; ties go to the highest record ID.
    pub fn latest_per_case(&self) -> StoreResult<BTreeMap<String, RecordWithImages>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM (
                SELECT *, ROW_NUMBER() OVER (
                    PARTITION BY case_id ORDER BY timestamp DESC, record_id DESC
                ) AS rn
                FROM test_records
             ) WHERE rn = 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<rusqlite::Result<Vec<ExecutionRecord>>>()?;

        Ok(self
            .attach_images(records)?
            .into_iter()
            .map(|r| (r.record.case_id.clone(), r))
            .collect())
    }

    /// Status counts and pass rate over an optional inclusive time range
    pub fn statistics(&self, start: Option<i64>, end: Option<i64>) -> StoreResult<Statistics> {
        let mut sql = String::from(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?3 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?4 THEN 1 ELSE 0 END), 0)
             FROM test_records WHERE 1=1",
        );
        let mut params: Vec<Box<dyn ToSql>> = Status::ALL
            .iter()
            .map(|s| Box::new(*s) as Box<dyn ToSql>)
            .collect();
        push_range(&mut sql, &mut params, start, end);

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let (total, passed, failed, blocked, skipped): (i64, i64, i64, i64, i64) =
            self.conn.query_row(&sql, param_refs.as_slice(), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?;

        let pass_rate = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(Statistics {
            total: total as usize,
            passed: passed as usize,
            failed: failed as usize,
            blocked: blocked as usize,
            skipped: skipped as usize,
            pass_rate,
        })
    }

    fn attach_images(&self, records: Vec<ExecutionRecord>) -> StoreResult<Vec<RecordWithImages>> {
        records
            .into_iter()
            .map(|record| -> StoreResult<RecordWithImages> {
                let images = images_for(&self.conn, record.record_id)?;
                Ok(RecordWithImages { record, images })
            })
            .collect()
    }
}

fn push_range(
    sql: &mut String,
    params: &mut Vec<Box<dyn ToSql>>,
    start: Option<i64>,
    end: Option<i64>,
) {
    if let Some(start) = start {
        sql.push_str(&format!(" AND timestamp >= ?{}", params.len() + 1));
        params.push(Box::new(start));
    }
    if let Some(end) = end {
        sql.push_str(&format!(" AND timestamp <= ?{}", params.len() + 1));
        params.push(Box::new(end));
    }
}
