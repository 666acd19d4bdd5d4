//! Shared helpers: an in-process fake of the data.gov.in resource and a
//! proxy wired to it, both served on ephemeral localhost ports.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use mandi_prices::proxy::{build_router, ProxyState, RetryPolicy, UpstreamClient};

pub const API_KEY: &str = "test-upstream-key";
pub const ACCESS_TOKEN: &str = "caller-token";
pub const RETRY_BASE: Duration = Duration::from_millis(20);

pub const SAMPLE_BODY: &str = r#"{
    "total": 2,
    "count": 2,
    "records": [
        {"state":"Maharashtra","district":"Nashik","market":"Lasalgaon","commodity":"Onion",
         "variety":"Red","grade":"FAQ","arrival_date":"14/03/2025",
         "min_price":"1000","max_price":"1500","modal_price":"1200"},
        {"state":"Maharashtra","district":"Pune","market":"Pune","commodity":"Tomato",
         "variety":"Hybrid","grade":"FAQ","arrival_date":"14/03/2025",
         "min_price":"abc","max_price":"","modal_price":"800"}
    ]
}"#;

/// Scripted upstream: fails the first `fail_first` requests (or all of them
/// while `down` is set), then answers with `body`
#[derive(Clone)]
pub struct FakeUpstream {
    pub hits: Arc<AtomicUsize>,
    pub down: Arc<AtomicBool>,
    pub fail_first: usize,
    pub fail_status: StatusCode,
    pub body: String,
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl FakeUpstream {
    pub fn new(body: &str) -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            down: Arc::new(AtomicBool::new(false)),
            fail_first: 0,
            fail_status: StatusCode::SERVICE_UNAVAILABLE,
            body: body.to_string(),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.queries.lock().unwrap().last().cloned()
    }
}

async fn upstream_handler(
    State(fake): State<FakeUpstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let n = fake.hits.fetch_add(1, Ordering::SeqCst) + 1;
    fake.queries.lock().unwrap().push(query);

    if n <= fake.fail_first || fake.down.load(Ordering::SeqCst) {
        return (fake.fail_status, "upstream unavailable").into_response();
    }
    ([(header::CONTENT_TYPE, "application/json")], fake.body.clone()).into_response()
}

/// Serves `router` on 127.0.0.1 with an OS-assigned port
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Starts the fake upstream and returns its resource URL
pub async fn spawn_upstream(fake: FakeUpstream) -> String {
    let router = Router::new()
        .route("/resource", get(upstream_handler))
        .with_state(fake);
    let addr = spawn(router).await;
    format!("http://{}/resource", addr)
}

/// Starts a proxy in front of `upstream_url`; returns the price endpoint URL
pub async fn spawn_proxy(upstream_url: &str, api_key: Option<&str>) -> String {
    let upstream = UpstreamClient::new(
        upstream_url,
        api_key.map(str::to_string),
        RetryPolicy::with_base_delay(RETRY_BASE),
    );
    let addr = spawn(build_router(ProxyState::new(upstream, ACCESS_TOKEN))).await;
    format!("http://{}/v1/market-prices", addr)
}
