//! Client for the data.gov.in AGMARKNET resource
//!
//! The upstream key lives only here: it is added to the outgoing query string
//! and stripped from every error before the error can be logged or returned.

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::market::PriceQuery;

/// Daily commodity prices resource on data.gov.in
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from talking to the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("DATA_GOV_API_KEY is not configured")]
    MissingCredential,

    /// The request never got a response (URL removed)
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("API Error: {status} - {body}")]
    Status { status: u16, body: String },

    /// A 2xx reply that is not JSON; never retried
    #[error("Invalid JSON from upstream: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Every attempt failed; displays as the last failure
    #[error("{last}")]
    Exhausted {
        attempts: u32,
        last: Box<UpstreamError>,
    },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Http(e.without_url())
    }
}

/// How many times to try the upstream and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The wait after attempt `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// Wait before the attempt following `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// One successful upstream reply
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPage {
    /// The JSON body exactly as the upstream sent it
    pub body: String,
    pub record_count: usize,
    pub total: Option<Value>,
}

impl UpstreamPage {
    /// The upstream `total`, or "unknown" when it was not sent
    pub fn total_label(&self) -> String {
        self.total
            .as_ref()
            .map_or_else(|| "unknown".to_string(), |v| v.to_string())
    }
}

/// Fetches price pages from the upstream resource with bounded retry
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, retry: RetryPolicy) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retry,
        }
    }

    /// Upstream query string; filters are omitted when empty
    fn params(api_key: &str, query: &PriceQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api-key", api_key.to_string()),
            ("format", "json".to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(state) = query.state.as_deref().filter(|s| !s.is_empty()) {
            params.push(("filters[state]", state.to_string()));
        }
        if let Some(district) = query.district.as_deref().filter(|d| !d.is_empty()) {
            params.push(("filters[district]", district.to_string()));
        }
        params
    }

    /// Fetches one page, retrying network errors and non-2xx replies
    ///
    /// # Arguments
    /// * `query` - Page window and optional state/district filters
    ///
    /// # Returns
    /// * `Ok(UpstreamPage)` - The upstream JSON body, untouched
    /// * `Err(UpstreamError)` - Missing key, a non-JSON 2xx body, or every
    ///   attempt failed
    pub async fn fetch(&self, query: &PriceQuery) -> Result<UpstreamPage, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingCredential)?;
        let max_attempts = self.retry.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.attempt(api_key, query).await {
                Ok(body) => {
                    debug!(attempt, "upstream attempt succeeded");
                    return Self::inspect(body);
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(attempt, max_attempts, error = %e, "upstream attempt failed, giving up");
                    return Err(UpstreamError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "upstream attempt failed"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, api_key: &str, query: &PriceQuery) -> Result<String, UpstreamError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .query(&Self::params(api_key, query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn inspect(body: String) -> Result<UpstreamPage, UpstreamError> {
        let parsed: Value = serde_json::from_str(&body)?;
        let record_count = parsed
            .get("records")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let total = parsed.get("total").cloned();

        Ok(UpstreamPage {
            body,
            record_count,
            total,
        })
    }
}
