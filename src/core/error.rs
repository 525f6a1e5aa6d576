//! Error taxonomy for the store and its collaborators

use std::path::PathBuf;
use thiserror::Error;

/// Input rejected before any store interaction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required columns: {}", keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    #[error("Duplicate case IDs in import: {}", ids.join(", "))]
    DuplicateIds { ids: Vec<String> },

    #[error("Row {row} has an empty case ID")]
    EmptyCaseId { row: usize },

    #[error("Malformed date '{0}' (expected YYYY-MM-DD)")]
    MalformedDate(String),

    #[error("Unknown status: '{0}'")]
    UnknownStatus(String),
}

/// Errors surfaced by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Test case not found: {0}")]
    CaseNotFound(String),

    #[error("Execution record not found: {0}")]
    RecordNotFound(i64),

    #[error("Failed to prepare store directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A migration step that could not be applied.
///
/// Never returned from `TestStore::open`; the runner logs it and moves on.
#[derive(Debug, Error)]
#[error("Migration '{step}' failed: {source}")]
pub struct MigrationError {
    pub step: &'static str,
    #[source]
    pub source: rusqlite::Error,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_message_lists_all() {
        let err = ValidationError::MissingKeys {
            keys: vec!["用例ID".to_string(), "预期结果".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required columns: 用例ID, 预期结果");
    }

    #[test]
    fn test_validation_wraps_transparently() {
        let err: StoreError = ValidationError::MalformedDate("2024-13-01".to_string()).into();
        assert!(err.to_string().contains("2024-13-01"));
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
