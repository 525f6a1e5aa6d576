//! Import rows: the shape shared by spreadsheet and remote case sources
//!
//! Rows are validated here, before any store interaction:
//! - required keys are checked against the header, all missing keys reported at once
//! - case IDs must be non-empty and unique within the batch

use std::collections::{HashMap, HashSet};
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use thiserror::Error;

use crate::core::error::ValidationError;
use crate::entities::case::TestCase;

/// One case definition as delivered by an import source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    pub case_id: String,
    pub scenario: String,
    pub test_steps: Option<String>,
    /// Legacy name for the steps column, used when `test_steps` is absent
    pub precondition: Option<String>,
    pub expected_result: String,
    pub priority: Option<String>,
    pub collection_name: Option<String>,
}

impl ImportRow {
    /// Steps with the legacy precondition as fallback
    pub fn resolved_steps(&self) -> Option<&str> {
        self.test_steps
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.precondition.as_deref().filter(|s| !s.is_empty()))
    }

    /// Collection carried by the row itself, if non-empty
    pub fn own_collection(&self) -> Option<&str> {
        self.collection_name.as_deref().filter(|s| !s.is_empty())
    }
}

impl From<TestCase> for ImportRow {
    fn from(case: TestCase) -> Self {
        Self {
            case_id: case.case_id,
            scenario: case.scenario,
            test_steps: case.test_steps,
            precondition: None,
            expected_result: case.expected_result,
            priority: case.priority,
            collection_name: case.collection_name,
        }
    }
}

/// Recognized row keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    CaseId,
    Scenario,
    TestSteps,
    Precondition,
    ExpectedResult,
    Priority,
    CollectionName,
}

impl RowKey {
    pub const REQUIRED: [RowKey; 3] = [RowKey::CaseId, RowKey::Scenario, RowKey::ExpectedResult];

    pub const TEMPLATE: [RowKey; 6] = [
        RowKey::CaseId,
        RowKey::Scenario,
        RowKey::TestSteps,
        RowKey::ExpectedResult,
        RowKey::Priority,
        RowKey::CollectionName,
    ];

    /// Canonical spreadsheet header
    pub fn header(&self) -> &'static str {
        match self {
            RowKey::CaseId => "用例ID",
            RowKey::Scenario => "测试场景",
            RowKey::TestSteps => "测试步骤",
            RowKey::Precondition => "前置条件",
            RowKey::ExpectedResult => "预期结果",
            RowKey::Priority => "优先级",
            RowKey::CollectionName => "案例集名称",
        }
    }

    /// Map a header cell to a key (canonical or English alias)
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().trim_start_matches('\u{feff}');
        match header {
            "用例ID" => return Some(RowKey::CaseId),
            "测试场景" => return Some(RowKey::Scenario),
            "测试步骤" => return Some(RowKey::TestSteps),
            "前置条件" => return Some(RowKey::Precondition),
            "预期结果" => return Some(RowKey::ExpectedResult),
            "优先级" => return Some(RowKey::Priority),
            "案例集名称" => return Some(RowKey::CollectionName),
            _ => {}
        }
        match header.to_lowercase().as_str() {
            "case_id" | "id" => Some(RowKey::CaseId),
            "scenario" | "casename" => Some(RowKey::Scenario),
            "test_steps" | "steps" => Some(RowKey::TestSteps),
            "precondition" => Some(RowKey::Precondition),
            "expected_result" => Some(RowKey::ExpectedResult),
            "priority" => Some(RowKey::Priority),
            "collection_name" | "collection" => Some(RowKey::CollectionName),
            _ => None,
        }
    }
}

/// Failure reading an import source
#[derive(Debug, Error)]
pub enum RowsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Build a map from recognized key to column index. The first matching
/// column wins.
pub fn build_header_map(headers: &StringRecord) -> HashMap<RowKey, usize> {
    let mut map = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(key) = RowKey::from_header(header) {
            map.entry(key).or_insert(idx);
        }
    }
    map
}

/// Check that every required key is present, reporting all missing ones
pub fn check_required_keys(present: &HashSet<RowKey>) -> Result<(), ValidationError> {
    let missing: Vec<String> = RowKey::REQUIRED
        .iter()
        .filter(|key| !present.contains(key))
        .map(|key| key.header().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingKeys { keys: missing })
    }
}

/// Reject empty case IDs and IDs repeated within the batch
pub fn check_batch(rows: &[ImportRow]) -> Result<(), ValidationError> {
    if let Some(pos) = rows.iter().position(|r| r.case_id.trim().is_empty()) {
        return Err(ValidationError::EmptyCaseId { row: pos + 1 });
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for row in rows {
        if !seen.insert(row.case_id.as_str()) && !duplicates.contains(&row.case_id) {
            duplicates.push(row.case_id.clone());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DuplicateIds { ids: duplicates })
    }
}

/// Read import rows from CSV data with a header line
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>, RowsError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header_map = build_header_map(rdr.headers()?);
    check_required_keys(&header_map.keys().copied().collect())?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(row_from_record(&record, &header_map));
    }

    check_batch(&rows)?;
    Ok(rows)
}

fn row_from_record(record: &StringRecord, header_map: &HashMap<RowKey, usize>) -> ImportRow {
    let text = |key: RowKey| -> String { get_field(record, header_map, key).unwrap_or_default() };

    ImportRow {
        case_id: text(RowKey::CaseId),
        scenario: text(RowKey::Scenario),
        test_steps: get_field(record, header_map, RowKey::TestSteps),
        precondition: get_field(record, header_map, RowKey::Precondition),
        expected_result: text(RowKey::ExpectedResult),
        priority: get_field(record, header_map, RowKey::Priority),
        collection_name: get_field(record, header_map, RowKey::CollectionName),
    }
}

/// Get a non-empty, trimmed field value from a CSV record
pub fn get_field(
    record: &StringRecord,
    header_map: &HashMap<RowKey, usize>,
    key: RowKey,
) -> Option<String> {
    header_map
        .get(&key)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Canonical header line for a CSV template
pub fn template_headers() -> Vec<&'static str> {
    RowKey::TEMPLATE.iter().map(|k| k.header()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_canonical_headers() {
        let data = "用例ID,测试场景,测试步骤,预期结果,优先级\nA1,登录,1. open,ok,高\nA2,Login,,ok,\n";
        let rows = read_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].case_id, "A1");
        assert_eq!(rows[0].scenario, "登录");
        assert_eq!(rows[0].test_steps.as_deref(), Some("1. open"));
        assert_eq!(rows[0].priority.as_deref(), Some("高"));
        assert_eq!(rows[1].test_steps, None);
        assert_eq!(rows[1].priority, None);
    }

    #[test]
    fn test_read_csv_english_aliases_and_precondition() {
        let data = "case_id,scenario,precondition,expected_result,collection_name\nB1,Logout,signed in,ok,Smoke\n";
        let rows = read_csv(data.as_bytes()).unwrap();

        assert_eq!(rows[0].resolved_steps(), Some("signed in"));
        assert_eq!(rows[0].own_collection(), Some("Smoke"));
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let data = "测试步骤,优先级\nx,y\n";
        let err = read_csv(data.as_bytes()).unwrap_err();
        match err {
            RowsError::Validation(ValidationError::MissingKeys { keys }) => {
                assert_eq!(keys, vec!["用例ID", "测试场景", "预期结果"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let data = "用例ID,测试场景,预期结果\nA1,a,x\nA2,b,y\nA1,c,z\nA1,d,w\n";
        let err = read_csv(data.as_bytes()).unwrap_err();
        match err {
            RowsError::Validation(ValidationError::DuplicateIds { ids }) => {
                assert_eq!(ids, vec!["A1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_case_id_rejected_with_row_number() {
        let rows = vec![
            ImportRow {
                case_id: "A1".into(),
                ..Default::default()
            },
            ImportRow::default(),
        ];
        assert_eq!(
            check_batch(&rows),
            Err(ValidationError::EmptyCaseId { row: 2 })
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let data = "用例ID,测试场景,预期结果\nA1,a,x\n,,\n";
        let rows = read_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_resolved_steps_prefers_steps() {
        let row = ImportRow {
            test_steps: Some("steps".into()),
            precondition: Some("pre".into()),
            ..Default::default()
        };
        assert_eq!(row.resolved_steps(), Some("steps"));
    }
}
