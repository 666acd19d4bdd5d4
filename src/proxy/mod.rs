//! The secrets-holding price proxy
//!
//! Callers authenticate with a bearer token of their own; the data.gov.in key
//! is attached here and never leaves the process.

mod server;
mod upstream;

pub use server::{build_router, serve, ProxyState, HEALTH_PATH, PRICES_PATH};
pub use upstream::{
    RetryPolicy, UpstreamClient, UpstreamError, UpstreamPage, DEFAULT_UPSTREAM_URL,
};
