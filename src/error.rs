//! User-facing error types
//!
//! Two kinds only: local validation failures and remote failures of a
//! backend call. Both end up as a message next to the relevant input.

use thiserror::Error;

/// The backend operation a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ingest,
    Query,
}

impl Operation {
    /// Message shown when the backend gives no usable detail
    pub fn fallback_message(self) -> &'static str {
        match self {
            Operation::Ingest => "Unknown error loading the article.",
            Operation::Query => "Unknown error querying the chatbot.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Ingest => "ingest",
            Operation::Query => "query",
        }
    }
}

/// Input rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("You must enter the Wikipedia article URL.")]
    EmptyUrl,
    #[error("Please type your question before sending.")]
    EmptyQuestion,
}

/// A failed backend call, normalised to a single message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub operation: Operation,
    pub message: String,
}

impl RemoteError {
    /// Surface the backend detail verbatim, or the operation fallback when
    /// there is none (an empty detail counts as none).
    pub fn from_detail(operation: Operation, detail: Option<String>) -> Self {
        let message = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| operation.fallback_message().to_string());
        Self { operation, message }
    }

    pub fn fallback(operation: Operation) -> Self {
        Self::from_detail(operation, None)
    }
}

/// Error held in `Session::last_error` and `Transcript::error`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ClientError {
    #[cfg(test)]
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}
