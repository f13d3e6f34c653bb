//! Wire types for the backend's JSON bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /upload-article`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestRequest {
    pub url: String,
}

/// Successful ingest response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestResponse {
    pub doc_id: String,
    /// Human-readable status line some backends include
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

/// Successful query response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// Failure body, `{"detail": ...}`
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

impl ErrorBody {
    /// String details come through as-is; structured ones (e.g. a list of
    /// validation errors) as compact JSON.
    pub(super) fn into_detail(self) -> Option<String> {
        match self.detail? {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }
}
