//! Oracle port and its HTTP implementation

use crate::error::{OracleError, Result};
use crate::wire::NetPayload;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// The external service that computes firings
///
/// `process` fires the page as submitted; `resolve` fires the transition
/// named by `selected_transition_id` after a conflict.
pub trait Oracle {
    fn process(&self, request: &NetPayload) -> impl Future<Output = Result<NetPayload>> + Send;

    fn resolve(&self, request: &NetPayload) -> impl Future<Output = Result<NetPayload>> + Send;
}

/// Where the oracle lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL for `process` requests
    pub process_endpoint: String,
    /// Base URL for `resolve` requests
    pub resolve_endpoint: String,
    /// Page of the document being simulated
    pub page_id: String,
    /// Request timeout (ms)
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            process_endpoint: "http://localhost:8080/api".to_string(),
            resolve_endpoint: "http://localhost:8080/api".to_string(),
            page_id: "page-1".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl OracleConfig {
    /// Use one base URL for both operations
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.resolve_endpoint = endpoint.clone();
        self.process_endpoint = endpoint;
        self
    }

    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = page_id.into();
        self
    }

    /// `{process_endpoint}/page/{page_id}/process`
    pub fn process_url(&self) -> String {
        page_url(&self.process_endpoint, &self.page_id, "process")
    }

    /// `{resolve_endpoint}/page/{page_id}/resolve`
    pub fn resolve_url(&self) -> String {
        page_url(&self.resolve_endpoint, &self.page_id, "resolve")
    }
}

fn page_url(endpoint: &str, page_id: &str, operation: &str) -> String {
    format!(
        "{}/page/{}/{}",
        endpoint.trim_end_matches('/'),
        page_id,
        operation
    )
}

/// Oracle reached over HTTP with JSON bodies
#[derive(Clone, Debug)]
pub struct HttpOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        for endpoint in [&config.process_endpoint, &config.resolve_endpoint] {
            reqwest::Url::parse(endpoint)
                .map_err(|e| OracleError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    async fn post(&self, url: String, body: &NetPayload) -> Result<NetPayload> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<NetPayload>()
            .await
            .map_err(|e| OracleError::Decode(e.to_string()))
    }
}

impl Oracle for HttpOracle {
    async fn process(&self, request: &NetPayload) -> Result<NetPayload> {
        self.post(self.config.process_url(), request).await
    }

    async fn resolve(&self, request: &NetPayload) -> Result<NetPayload> {
        self.post(self.config.resolve_url(), request).await
    }
}
