//! qtl: QA Test Logger
//!
//! Local record keeping for manual test execution. Test cases, execution
//! records and screenshots live in one embedded SQLite store; filtered
//! history, statistics and reports are derived from it.

pub mod cli;
pub mod core;
pub mod entities;
pub mod report;
