//! Request/response gateway to the retrieval backend
//!
//! Translates local requests into the two backend operations and normalises
//! every failure (transport, status, malformed body) into a [`RemoteError`].
//! No retries: a failed call is terminal for that user action.

mod error;
mod http;
mod types;

pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpBackend;
pub use types::{IngestRequest, IngestResponse, QueryRequest, QueryResponse};

use crate::error::{Operation, RemoteError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// The two operations the retrieval backend exposes
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ingest an article, returning the document handle the backend assigned
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, GatewayError>;

    /// Ask a question about an ingested article
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, GatewayError>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, GatewayError> {
        (**self).ingest(request).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, GatewayError> {
        (**self).query(request).await
    }
}

/// Ingest `url` and map any failure to the user-facing shape
pub async fn ingest_article<B: Backend + ?Sized>(
    backend: &B,
    url: &str,
) -> Result<IngestResponse, RemoteError> {
    let request = IngestRequest {
        url: url.to_string(),
    };
    backend
        .ingest(&request)
        .await
        .map_err(|e| e.into_remote(Operation::Ingest))
}

/// Ask `question` about `doc_id` and map any failure to the user-facing shape
pub async fn ask_question<B: Backend + ?Sized>(
    backend: &B,
    question: &str,
    doc_id: &str,
) -> Result<String, RemoteError> {
    let request = QueryRequest {
        question: question.to_string(),
        doc_id: Some(doc_id.to_string()),
    };
    backend
        .query(&request)
        .await
        .map(|response| response.answer)
        .map_err(|e| e.into_remote(Operation::Query))
}

/// Logging wrapper for backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: Backend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: Operation, started: Instant, result: &Result<T, GatewayError>) {
    let duration = started.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                operation = operation.as_str(),
                duration_ms = %duration.as_millis(),
                "Backend request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                operation = operation.as_str(),
                duration_ms = %duration.as_millis(),
                kind = ?e.kind,
                error = %e.message,
                detail = e.detail.as_deref().unwrap_or(""),
                "Backend request failed"
            );
        }
    }
}

#[async_trait]
impl<B: Backend> Backend for LoggingBackend<B> {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.ingest(request).await;
        log_outcome(Operation::Ingest, started, &result);
        if let Ok(response) = &result {
            tracing::info!(
                url = %request.url,
                doc_id = %response.doc_id,
                status = response.status.as_deref().unwrap_or(""),
                "Article ingested"
            );
        }
        result
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, GatewayError> {
        let started = Instant::now();
        let result = self.inner.query(request).await;
        log_outcome(Operation::Query, started, &result);
        result
    }
}
