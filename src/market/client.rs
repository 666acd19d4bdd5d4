//! Dashboard-side client for the price proxy
//!
//! The dashboard never talks to the upstream API directly; it calls the proxy
//! with its own access token. [`PriceSource`] is the seam the orchestrator
//! depends on, so tests can substitute a scripted source.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::{PriceQuery, UpstreamResponse};

/// Request timeout for proxy calls; the proxy itself may spend a few seconds retrying
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when fetching prices through the proxy
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never got a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The proxy answered with a non-success status
    #[error("API request failed: {status} - {body}")]
    Status { status: u16, body: String },

    /// The body was not JSON
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The body was JSON but carried no records
    #[error("Invalid API response")]
    InvalidResponse,
}

/// Anything that can answer a price query
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<UpstreamResponse, FetchError>;
}

/// Client for the price proxy endpoint
#[derive(Debug, Clone)]
pub struct ProxyClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Full URL of the proxy's price endpoint
    endpoint: String,
    /// Caller-facing bearer token (not the upstream credential)
    access_token: String,
}

impl ProxyClient {
    /// Creates a new ProxyClient for the given endpoint and access token
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(http_client, endpoint, access_token)
    }

    /// Creates a new ProxyClient with a custom HTTP client
    pub fn with_client(
        http_client: Client,
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        }
    }

    /// Query parameters for a request; empty filters are omitted
    fn query_params(query: &PriceQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(state) = query.state.as_deref().filter(|s| !s.is_empty()) {
            params.push(("state", state.to_string()));
        }
        if let Some(district) = query.district.as_deref().filter(|d| !d.is_empty()) {
            params.push(("district", district.to_string()));
        }
        params
    }
}

impl PriceSource for ProxyClient {
    /// Fetches one page of prices through the proxy
    ///
    /// # Returns
    /// * `Ok(UpstreamResponse)` - The upstream body, with `records` present
    /// * `Err(FetchError)` - Network failure, non-2xx status, or a body without records
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<UpstreamResponse, FetchError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .bearer_auth(&self.access_token)
            .query(&Self::query_params(query))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: UpstreamResponse = serde_json::from_str(&text)?;
        if body.records.is_none() {
            return Err(FetchError::InvalidResponse);
        }

        debug!(
            total = body.total,
            records = body.records.as_ref().map_or(0, Vec::len),
            "fetched prices from proxy"
        );
        Ok(body)
    }
}
