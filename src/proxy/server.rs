//! HTTP surface of the price proxy

use axum::extract::{Query, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::upstream::{RetryPolicy, UpstreamClient, UpstreamError};
use crate::config::ProxyConfig;
use crate::market::PriceQuery;

pub const PRICES_PATH: &str = "/v1/market-prices";
pub const HEALTH_PATH: &str = "/healthz";

const ALLOW_ORIGIN: &str = "*";
const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Shared handler state
#[derive(Clone)]
pub struct ProxyState {
    upstream: Arc<UpstreamClient>,
    access_token: Arc<str>,
}

impl ProxyState {
    pub fn new(upstream: UpstreamClient, access_token: &str) -> Self {
        Self {
            upstream: Arc::new(upstream),
            access_token: Arc::from(access_token),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        let upstream = UpstreamClient::new(
            config.upstream_url.clone(),
            config.upstream_api_key.clone(),
            RetryPolicy::with_base_delay(config.retry_base),
        );
        Self::new(upstream, &config.access_token)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| {
                token
                    .trim()
                    .as_bytes()
                    .ct_eq(self.access_token.as_bytes())
                    .into()
            })
    }
}

/// Builds the proxy router; every response carries the CORS headers
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route(PRICES_PATH, get(market_prices).options(preflight))
        .route(HEALTH_PATH, get(healthz))
        .layer(middleware::map_response(with_cors))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until Ctrl-C
pub async fn serve(config: ProxyConfig) -> std::io::Result<()> {
    if config.upstream_api_key.is_none() {
        warn!("DATA_GOV_API_KEY is not set; price requests will fail with 500");
    }

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "market price proxy listening");

    let router = build_router(ProxyState::from_config(&config));
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn healthz() -> &'static str {
    "ok"
}

async fn market_prices(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !state.authorized(&headers) {
        warn!("rejected price request with missing or wrong bearer token");
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let query = match parse_query(&params) {
        Ok(query) => query,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    info!(
        limit = query.limit,
        offset = query.offset,
        state = query.state.as_deref().unwrap_or(""),
        district = query.district.as_deref().unwrap_or(""),
        "fetching market prices"
    );

    match state.upstream.fetch(&query).await {
        Ok(page) => {
            info!(
                records = page.record_count,
                total = %page.total_label(),
                "fetched records from upstream"
            );
            ([(header::CONTENT_TYPE, "application/json")], page.body).into_response()
        }
        Err(e) => {
            if let UpstreamError::Exhausted { attempts, .. } = &e {
                error!(attempts = *attempts, error = %e, "upstream failed on every attempt");
            } else {
                error!(error = %e, "market price request failed");
            }
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Reads `limit`, `offset`, `state` and `district`; blank values take defaults
fn parse_query(params: &HashMap<String, String>) -> Result<PriceQuery, String> {
    let defaults = PriceQuery::default();
    let text = |name: &str| {
        params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };
    let number = |name: &str, default: u32| match text(name) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("{name} must be a non-negative integer")),
        None => Ok(default),
    };

    Ok(PriceQuery {
        limit: number("limit", defaults.limit)?,
        offset: number("offset", defaults.offset)?,
        state: text("state").map(str::to_string),
        district: text("district").map(str::to_string),
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_query_defaults() {
        let query = parse_query(&params(&[])).unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
        assert!(query.state.is_none());
        assert!(query.district.is_none());

        let query = parse_query(&params(&[("limit", ""), ("state", "  ")])).unwrap();
        assert_eq!(query.limit, 100);
        assert!(query.state.is_none());
    }

    #[test]
    fn test_parse_query_values() {
        let query = parse_query(&params(&[
            ("limit", "500"),
            ("offset", "1000"),
            ("state", "Kerala"),
            ("district", "Idukki"),
        ]))
        .unwrap();
        assert_eq!(query.limit, 500);
        assert_eq!(query.offset, 1000);
        assert_eq!(query.state.as_deref(), Some("Kerala"));
        assert_eq!(query.district.as_deref(), Some("Idukki"));
    }

    #[test]
    fn test_parse_query_rejects_bad_numbers() {
        assert_eq!(
            parse_query(&params(&[("limit", "ten")])).unwrap_err(),
            "limit must be a non-negative integer"
        );
        assert_eq!(
            parse_query(&params(&[("offset", "-1")])).unwrap_err(),
            "offset must be a non-negative integer"
        );
    }

    #[test]
    fn test_bearer_token_check() {
        let state = ProxyState::new(
            UpstreamClient::new("http://127.0.0.1:9", None, RetryPolicy::default()),
            "letmein",
        );
        let mut headers = HeaderMap::new();
        assert!(!state.authorized(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(!state.authorized(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("letmein"));
        assert!(!state.authorized(&headers));

        // Prefixes and extensions of the token are different lengths
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer letmei"));
        assert!(!state.authorized(&headers));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer letmeinn"));
        assert!(!state.authorized(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer letmein"));
        assert!(state.authorized(&headers));
    }
}
