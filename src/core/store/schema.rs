//! Database schema initialization and additive migrations

use rusqlite::{params, Connection};

use super::{table_columns, MigrationOutcome, MigrationStatus, TestStore};
use crate::core::error::{MigrationError, StoreResult};

/// One additive migration. `apply` returns `Ok(false)` when the schema is
/// already in the target state.
struct Migration {
    step: &'static str,
    apply: fn(&mut Connection) -> rusqlite::Result<bool>,
}

/// Applied in order on every open
const MIGRATIONS: &[Migration] = &[
    Migration {
        step: "move_legacy_image_path",
        apply: move_legacy_image_path,
    },
    Migration {
        step: "precondition_to_test_steps",
        apply: precondition_to_test_steps,
    },
    Migration {
        step: "add_case_collection_name",
        apply: add_case_collection_name,
    },
];

impl TestStore {
    /// Create the three tables if missing
    pub(super) fn init_schema(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(
            r#"
            -- Test case definitions, keyed by external ID
            CREATE TABLE IF NOT EXISTS test_cases (
                case_id TEXT PRIMARY KEY,
                scenario TEXT NOT NULL,
                test_steps TEXT,
                expected_result TEXT NOT NULL,
                priority TEXT,
                case_collection_name TEXT
            );

            -- Execution records (case_id is not enforced)
            CREATE TABLE IF NOT EXISTS test_records (
                record_id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id TEXT NOT NULL,
                status TEXT NOT NULL,
                actual_result TEXT,
                notes TEXT,
                executor TEXT,
                timestamp INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_records_case ON test_records(case_id);
            CREATE INDEX IF NOT EXISTS idx_test_records_timestamp ON test_records(timestamp);

            -- Ordered screenshots per record
            CREATE TABLE IF NOT EXISTS record_images (
                image_id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL,
                image_path TEXT NOT NULL,
                order_index INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_record_images_record ON record_images(record_id);
            "#,
        )?;

        Ok(())
    }

    /// Run every migration step, logging and skipping failures
    pub(super) fn run_migrations(&mut self) -> Vec<MigrationStatus> {
        MIGRATIONS
            .iter()
            .map(|migration| {
                let outcome = match (migration.apply)(&mut self.conn) {
                    Ok(true) => {
                        tracing::info!(step = migration.step, "migration applied");
                        MigrationOutcome::Applied
                    }
                    Ok(false) => {
                        tracing::debug!(step = migration.step, "migration already current");
                        MigrationOutcome::AlreadyCurrent
                    }
                    Err(source) => {
                        let err = MigrationError {
                            step: migration.step,
                            source,
                        };
                        tracing::warn!(error = %err, "migration skipped; store continues in its previous shape");
                        MigrationOutcome::Failed(err.source.to_string())
                    }
                };
                MigrationStatus {
                    step: migration.step,
                    outcome,
                }
            })
            .collect()
    }
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    Ok(table_columns(conn, table)?.iter().any(|c| c == column))
}

/// Move a legacy single `image_path` column on records into `record_images`
fn move_legacy_image_path(conn: &mut Connection) -> rusqlite::Result<bool> {
    if !has_column(conn, "test_records", "image_path")? {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    let moved = {
        let mut select = tx.prepare(
            "SELECT record_id, image_path FROM test_records
             WHERE image_path IS NOT NULL AND image_path != ''",
        )?;
        let legacy: Vec<(i64, String)> = select
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut insert = tx.prepare(
            "INSERT INTO record_images (record_id, image_path, order_index) VALUES (?1, ?2, 0)",
        )?;
        for (record_id, image_path) in &legacy {
            insert.execute(params![record_id, image_path])?;
        }
        legacy.len()
    };
    tx.execute("ALTER TABLE test_records DROP COLUMN image_path", [])?;
    tx.commit()?;

    tracing::info!(images = moved, "moved legacy record images");
    Ok(true)
}

/// Add `test_steps` and copy the legacy `precondition` values across
fn precondition_to_test_steps(conn: &mut Connection) -> rusqlite::Result<bool> {
    let has_precondition = has_column(conn, "test_cases", "precondition")?;
    let has_steps = has_column(conn, "test_cases", "test_steps")?;
    if has_steps || !has_precondition {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    tx.execute("ALTER TABLE test_cases ADD COLUMN test_steps TEXT", [])?;
    tx.execute(
        "UPDATE test_cases SET test_steps = precondition WHERE test_steps IS NULL",
        [],
    )?;
    tx.commit()?;
    Ok(true)
}

/// Add the nullable `case_collection_name` column
fn add_case_collection_name(conn: &mut Connection) -> rusqlite::Result<bool> {
    if has_column(conn, "test_cases", "case_collection_name")? {
        return Ok(false);
    }

    conn.execute(
        "ALTER TABLE test_cases ADD COLUMN case_collection_name TEXT",
        [],
    )?;
    Ok(true)
}
