//! Remote case service client
//!
//! `GET {base}/testarGetCase?projectId=..&subtaskName=..&round=..` returns
//! `{"status": 200, "data": [...]}`. Elements map onto import rows.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::rows::ImportRow;

const ENDPOINT: &str = "testarGetCase";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request to case service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not decode case service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Case service rejected the request (status: {status})")]
    Rejected { status: String },

    #[error("Case service returned no cases")]
    Empty,
}

/// Parameters identifying one batch of cases on the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub project_id: String,
    pub subtask_name: String,
    pub round: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    data: Option<Vec<RemoteCase>>,
}

#[derive(Debug, Deserialize)]
struct RemoteCase {
    #[serde(default, deserialize_with = "text")]
    case_id: String,
    #[serde(default, rename = "caseName", alias = "scenario", deserialize_with = "text")]
    case_name: String,
    #[serde(default, deserialize_with = "opt_text")]
    test_steps: Option<String>,
    #[serde(default, deserialize_with = "text")]
    expected_result: String,
    #[serde(default, deserialize_with = "opt_text")]
    priority: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    collection_name: Option<String>,
}

impl From<RemoteCase> for ImportRow {
    fn from(case: RemoteCase) -> Self {
        ImportRow {
            case_id: case.case_id,
            scenario: case.case_name,
            test_steps: case.test_steps,
            precondition: None,
            expected_result: case.expected_result,
            priority: case.priority,
            collection_name: case.collection_name,
        }
    }
}

/// Accept strings and numbers alike; the service is loose about IDs
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn text<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_text(Value::deserialize(d)?).unwrap_or_default())
}

fn opt_text<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_text(Value::deserialize(d)?).filter(|s| !s.is_empty()))
}

fn status_accepted(status: &Value) -> bool {
    match status {
        Value::Number(n) => n.as_i64() == Some(200),
        Value::String(s) => s.eq_ignore_ascii_case("success") || s == "200",
        _ => false,
    }
}

/// Decode a service response body into import rows
pub fn parse_response(body: &str) -> Result<Vec<ImportRow>, RemoteError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    let data = match envelope.data {
        Some(data) if status_accepted(&envelope.status) => data,
        _ => {
            return Err(RemoteError::Rejected {
                status: envelope.status.to_string(),
            })
        }
    };

    if data.is_empty() {
        return Err(RemoteError::Empty);
    }
    Ok(data.into_iter().map(ImportRow::from).collect())
}

/// Blocking client for the case service
pub struct RemoteClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one batch of cases
    pub fn fetch_cases(&self, request: &FetchRequest) -> Result<Vec<ImportRow>, RemoteError> {
        let url = format!("{}/{}", self.base_url, ENDPOINT);
        tracing::debug!(%url, project = %request.project_id, subtask = %request.subtask_name, round = %request.round, "fetching cases");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("projectId", request.project_id.as_str()),
                ("subtaskName", request.subtask_name.as_str()),
                ("round", request.round.as_str()),
            ])
            .send()?
            .error_for_status()?;

        let body = response.text()?;
        let rows = parse_response(&body)?;
        tracing::info!(count = rows.len(), "fetched cases");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_maps_fields() {
        let body = r#"{
            "status": 200,
            "data": [
                {"case_id": "P1_TC001", "caseName": "S_登录功能测试",
                 "test_steps": "1. 打开登录页面", "expected_result": "登录成功", "priority": "高"},
                {"case_id": 42, "caseName": "numeric id", "expected_result": "ok", "priority": ""}
            ]
        }"#;
        let rows = parse_response(body).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].case_id, "P1_TC001");
        assert_eq!(rows[0].scenario, "S_登录功能测试");
        assert_eq!(rows[0].test_steps.as_deref(), Some("1. 打开登录页面"));
        assert_eq!(rows[0].priority.as_deref(), Some("高"));
        assert_eq!(rows[1].case_id, "42");
        assert_eq!(rows[1].priority, None);
    }

    #[test]
    fn test_string_success_status_accepted() {
        let body = r#"{"status": "success", "data": [{"case_id": "A", "scenario": "s", "expected_result": "e"}]}"#;
        let rows = parse_response(body).unwrap();
        assert_eq!(rows[0].scenario, "s");
    }

    #[test]
    fn test_empty_data_is_distinct() {
        let err = parse_response(r#"{"status": 200, "data": []}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Empty));
    }

    #[test]
    fn test_rejected_status_or_missing_data() {
        let err = parse_response(r#"{"status": 500, "data": []}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { ref status } if status == "500"));

        let err = parse_response(r#"{"status": 200}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { .. }));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = RemoteClient::new("http://cases.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://cases.local");
    }
}
