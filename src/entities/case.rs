//! Test case entity

use serde::{Deserialize, Serialize};

/// A test case definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Externally assigned identifier
    pub case_id: String,

    /// What is being tested
    pub scenario: String,

    /// Steps to execute (superset of the legacy precondition field)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_steps: Option<String>,

    /// What a passing run looks like
    pub expected_result: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Group of cases imported together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl TestCase {
    pub fn new(
        case_id: impl Into<String>,
        scenario: impl Into<String>,
        expected_result: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            scenario: scenario.into(),
            test_steps: None,
            expected_result: expected_result.into(),
            priority: None,
            collection_name: None,
        }
    }
}

/// A `test_cases` row exactly as stored, including the legacy
/// `precondition` column when the table still has one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCaseRow {
    pub case_id: String,
    pub scenario: String,
    pub test_steps: Option<String>,
    pub precondition: Option<String>,
    pub expected_result: String,
    pub priority: Option<String>,
    pub collection_name: Option<String>,
}

/// Map a stored row to its canonical shape.
///
/// `test_steps` wins when non-empty, then the legacy `precondition`, else
/// `None`. Empty priority/collection strings read back as `None`.
pub fn normalize(raw: RawCaseRow) -> TestCase {
    let test_steps = non_empty(raw.test_steps).or_else(|| non_empty(raw.precondition));

    TestCase {
        case_id: raw.case_id,
        scenario: raw.scenario,
        test_steps,
        expected_result: raw.expected_result,
        priority: non_empty(raw.priority),
        collection_name: non_empty(raw.collection_name),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(steps: Option<&str>, pre: Option<&str>) -> RawCaseRow {
        RawCaseRow {
            case_id: "TC-1".to_string(),
            scenario: "Login".to_string(),
            test_steps: steps.map(String::from),
            precondition: pre.map(String::from),
            expected_result: "ok".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_prefers_test_steps() {
        let case = normalize(raw(Some("1. open"), Some("logged out")));
        assert_eq!(case.test_steps.as_deref(), Some("1. open"));
    }

    #[test]
    fn test_normalize_falls_back_to_precondition() {
        let case = normalize(raw(None, Some("logged out")));
        assert_eq!(case.test_steps.as_deref(), Some("logged out"));

        let case = normalize(raw(Some(""), Some("logged out")));
        assert_eq!(case.test_steps.as_deref(), Some("logged out"));
    }

    #[test]
    fn test_normalize_empty_everything_is_none() {
        let mut row = raw(Some(""), Some(""));
        row.priority = Some(String::new());
        row.collection_name = Some(String::new());

        let case = normalize(row);
        assert_eq!(case.test_steps, None);
        assert_eq!(case.priority, None);
        assert_eq!(case.collection_name, None);
    }
}
