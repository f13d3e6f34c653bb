//! HTTP backend over reqwest

use super::types::{ErrorBody, IngestRequest, IngestResponse, QueryRequest, QueryResponse};
use super::{Backend, GatewayError};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

const INGEST_PATH: &str = "/upload-article";
const QUERY_PATH: &str = "/query";

/// Backend reached over HTTP with JSON bodies
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, GatewayError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_detail);
            return Err(GatewayError::status(status.as_u16(), format!("HTTP {status}"))
                .with_detail(detail));
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::decode(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, GatewayError> {
        let response: IngestResponse = self.post_json(INGEST_PATH, request).await?;
        if response.doc_id.trim().is_empty() {
            return Err(GatewayError::decode("Backend returned an empty doc_id"));
        }
        Ok(response)
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, GatewayError> {
        self.post_json(QUERY_PATH, request).await
    }
}
