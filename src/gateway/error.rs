//! Gateway error types

use crate::error::{Operation, RemoteError};
use thiserror::Error;

/// Backend call failure with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    /// `detail` field from the backend's error body, if it sent one
    pub detail: Option<String>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Timeout, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Status(code), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Decode, message)
    }

    /// Collapse into the single user-facing shape for `operation`
    pub fn into_remote(self, operation: Operation) -> RemoteError {
        RemoteError::from_detail(operation, self.detail)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            GatewayError::network(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            GatewayError::decode(format!("Failed to decode response: {e}"))
        } else {
            GatewayError::network(format!("Request failed: {e}"))
        }
    }
}

/// Failure classification, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Connection refused, reset, DNS failure
    Network,
    /// Configured request timeout elapsed
    Timeout,
    /// Non-2xx HTTP status
    Status(u16),
    /// 2xx response whose body is not what the operation returns
    Decode,
}
