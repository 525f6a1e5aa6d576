//! SQLite-backed store for test cases, execution records and screenshots
//!
//! This module provides the single persistence layer that:
//! - Creates the three tables and applies additive migrations on open
//! - Upserts and deletes cases (cascading to records and images)
//! - Creates and updates execution records with ordered image sets
//! - Answers filtered record queries and aggregate statistics
//! - Reconciles bulk imports and projects flat rows for reports
//!
//! There are no engine-level foreign keys. A record may reference a case that
//! no longer exists; readers skip such records instead of failing.

mod cases;
mod import;
mod projection;
mod queries;
mod records;
mod schema;
mod types;

// Re-export all types
pub use types::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OpenFlags, Transaction};

use crate::core::error::{StoreError, StoreResult};

/// Database file name inside the data directory
pub const DB_FILE: &str = "qa_test_logger.db";

type Clock = Box<dyn Fn() -> i64 + Send>;

/// The test record store backed by SQLite
pub struct TestStore {
    conn: Connection,
    db_path: Option<PathBuf>,
    columns: CaseColumns,
    migrations: Vec<MigrationStatus>,
    clock: Clock,
}

impl std::fmt::Debug for TestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStore")
            .field("db_path", &self.db_path)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl TestStore {
    /// Open or create the store at `db_path`.
    ///
    /// Creates missing tables, then runs every migration step. A failing
    /// migration is logged and skipped; the store still opens.
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(db_path)?;

        // Enable WAL mode so a report reader doesn't block the session
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::initialize(conn, Some(db_path.to_path_buf()))
    }

    /// Open a store that was already created, without touching its schema.
    ///
    /// Used by background readers. Fails if the file does not exist.
    pub fn open_existing(db_path: &Path) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let columns = CaseColumns::detect(&conn)?;

        Ok(Self {
            conn,
            db_path: Some(db_path.to_path_buf()),
            columns,
            migrations: Vec::new(),
            clock: Box::new(unix_now),
        })
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, db_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut store = Self {
            conn,
            db_path,
            columns: CaseColumns::default(),
            migrations: Vec::new(),
            clock: Box::new(unix_now),
        };

        store.init_schema()?;
        store.migrations = store.run_migrations();
        store.columns = CaseColumns::detect(&store.conn)?;

        Ok(store)
    }

    /// Path of the database file (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Outcome of each migration step from the last open
    pub fn migration_report(&self) -> &[MigrationStatus] {
        &self.migrations
    }

    /// Which optional case columns the table currently has
    pub fn case_columns(&self) -> CaseColumns {
        self.columns
    }

    /// Current time in seconds since the epoch
    pub(crate) fn now(&self) -> i64 {
        (self.clock)()
    }

    #[cfg(test)]
    pub(crate) fn set_clock(&mut self, clock: impl Fn() -> i64 + Send + 'static) {
        self.clock = Box::new(clock);
    }

    /// Run `f` inside one transaction. Any error rolls everything back.
    pub(crate) fn in_transaction<T>(
        &mut self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Column names of `table`, in declaration order
pub(crate) fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let rows = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    rows.collect()
}
