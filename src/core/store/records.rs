//! Execution record and image operations

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::TestStore;
use crate::core::error::StoreResult;
use crate::entities::record::{ExecutionRecord, NewRecord, RecordUpdate, RecordWithImages, Status};

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.stored_label()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Status::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("unknown status label '{}'", text).into())
        })
    }
}

pub(super) const RECORD_COLUMNS: &str =
    "record_id, case_id, status, actual_result, notes, executor, timestamp";

pub(super) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ExecutionRecord> {
    Ok(ExecutionRecord {
        record_id: row.get(0)?,
        case_id: row.get(1)?,
        status: row.get(2)?,
        actual_result: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        notes: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        executor: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

/// Ordered image paths for a record
pub(super) fn images_for(conn: &Connection, record_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT image_path FROM record_images WHERE record_id = ?1
         ORDER BY order_index, image_id",
    )?;
    let paths = stmt
        .query_map(params![record_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(paths)
}

/// Append images in traversal order. Empty paths are skipped but still
/// consume their positional index.
fn insert_images(conn: &Connection, record_id: i64, images: &[String]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO record_images (record_id, image_path, order_index) VALUES (?1, ?2, ?3)",
    )?;
    for (index, path) in images.iter().enumerate() {
        if path.trim().is_empty() {
            continue;
        }
        stmt.execute(params![record_id, path, index as i64])?;
    }
    Ok(())
}

impl TestStore {
    /// Create a record stamped with the current time. Returns its ID.
    pub fn create_record(&mut self, new: &NewRecord) -> StoreResult<i64> {
        let now = self.now();
        let record_id = self.in_transaction(|tx| {
            tx.execute(
                "INSERT INTO test_records (case_id, status, actual_result, notes, executor, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.case_id,
                    new.status,
                    new.actual_result,
                    new.notes,
                    new.executor,
                    now
                ],
            )?;
            let record_id = tx.last_insert_rowid();
            insert_images(tx, record_id, &new.images)?;
            Ok(record_id)
        })?;

        tracing::debug!(record_id, case_id = %new.case_id, status = %new.status, "created record");
        Ok(record_id)
    }

    /// Apply a partial update. The timestamp is always refreshed.
    ///
    /// Returns `false` if no record has this ID.
    pub fn update_record(&mut self, record_id: i64, update: &RecordUpdate) -> StoreResult<bool> {
        let now = self.now();
        self.in_transaction(|tx| {
            let touched = tx.execute(
                "UPDATE test_records SET
                    status = COALESCE(?2, status),
                    actual_result = COALESCE(?3, actual_result),
                    notes = COALESCE(?4, notes),
                    executor = COALESCE(?5, executor),
                    timestamp = ?6
                 WHERE record_id = ?1",
                params![
                    record_id,
                    update.status,
                    update.actual_result,
                    update.notes,
                    update.executor,
                    now
                ],
            )?;
            if touched == 0 {
                return Ok(false);
            }

            if let Some(images) = &update.images {
                tx.execute(
                    "DELETE FROM record_images WHERE record_id = ?1",
                    params![record_id],
                )?;
                insert_images(tx, record_id, images)?;
            }
            Ok(true)
        })
    }

    /// Get one record with its images
    pub fn get_record(&self, record_id: i64) -> StoreResult<Option<RecordWithImages>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM test_records WHERE record_id = ?1"),
                params![record_id],
                record_from_row,
            )
            .optional()?;

        match record {
            Some(record) => {
                let images = images_for(&self.conn, record.record_id)?;
                Ok(Some(RecordWithImages { record, images }))
            }
            None => Ok(None),
        }
    }

    /// Image paths for a record, ascending by order index
    pub fn get_record_images(&self, record_id: i64) -> StoreResult<Vec<String>> {
        Ok(images_for(&self.conn, record_id)?)
    }

    /// Overwrite a record's timestamp
    #[cfg(test)]
    pub(crate) fn set_record_timestamp(&mut self, record_id: i64, timestamp: i64) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE test_records SET timestamp = ?2 WHERE record_id = ?1",
            params![record_id, timestamp],
        )?;
        Ok(())
    }
}
