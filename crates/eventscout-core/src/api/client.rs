//! HTTP client for the serverless generation proxy.
//!
//! `ProxyClient` POSTs a `GenerateRequest` as JSON and decodes the
//! candidates envelope. Rate-limited replies can be retried with
//! exponential backoff; everything else is mapped to an `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use super::types::{GenerateRequest, GenerateResponse};
use super::ApiError;
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound for a single backoff delay in milliseconds.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Anything that can answer a generation request.
///
/// The feed controller and the query builders only see this trait, so
/// tests can script replies without a network.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        (**self).generate(request).await
    }
}

/// Client for the generation proxy.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
    max_rate_limit_retries: u32,
}

impl ProxyClient {
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_rate_limit_retries: 0,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_timeout(
            config.proxy_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_rate_limit_retries(config.rate_limit_retries))
    }

    /// Retry 429 replies this many times before giving up.
    /// Zero surfaces rate limits immediately so the caller can fall back to cache.
    pub fn with_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check if response is successful.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (may retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn post(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .header(header::CONTENT_TYPE, "application/json")
                .json(request)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse proxy response: {}", e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > self.max_rate_limit_retries {
                        return Err(ApiError::RateLimited(format!(
                            "gave up after {} attempt(s)",
                            retries
                        )));
                    }
                    warn!(model = %request.model, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = next_backoff(backoff_ms);
                }
            }
        }
    }
}

/// Exponential backoff step, capped at `MAX_BACKOFF_MS`
fn next_backoff(backoff_ms: u64) -> u64 {
    backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS)
}

#[async_trait]
impl Backend for ProxyClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        debug!(model = %request.model, endpoint = %self.endpoint, "Calling generation proxy");
        self.post(request).await
    }
}
