//! HTTP seam for the analysis client.
//!
//! The client only needs "POST this JSON, give me status + body". Keeping
//! that behind a trait lets tests script the endpoint without a network.

use crate::error::AnalysisError;
use async_trait::async_trait;

/// Status and raw body of an HTTP response. The body is not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one JSON POST. A response with any status is `Ok`; only a
    /// request that never got a status is an error (`Unreachable`).
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, AnalysisError>;
}

/// Production transport backed by `reqwest`, with the client's default
/// timeouts.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, AnalysisError> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::error!("[LLM] HTTP request failed: {}", e);
                AnalysisError::Unreachable(e.to_string())
            })?;

        let status = response.status().as_u16();
        // An unreadable body is classified downstream like an empty one.
        let body = response.text().await.unwrap_or_else(|e| {
            log::warn!("[LLM] Failed to read response body: {}", e);
            String::new()
        });

        Ok(RawResponse { status, body })
    }
}
