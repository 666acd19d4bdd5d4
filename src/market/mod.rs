//! Core data models for market price retrieval
//!
//! This module contains the wire types returned by the AGMARKNET open data API,
//! the normalized price record used everywhere else, and the query types shared
//! by the proxy and the dashboard client.

pub mod client;
pub mod family;
pub mod filter;
pub mod normalize;
pub mod orchestrator;

pub use client::{FetchError, PriceSource, ProxyClient};
pub use family::CommodityFamily;
pub use filter::{PriceFilter, PAGE_SIZE};
pub use normalize::{normalize_record, normalize_records};
pub use orchestrator::{MarketPrices, MarketView, PendingFetch, Phase, FETCH_LIMIT};

use serde::{Deserialize, Deserializer, Serialize};

/// A single commodity price observation, normalized
///
/// String fields use the empty string for "unknown". Prices are in rupees per
/// quintal and default to 0 when the upstream value is missing or not numeric.
/// `min_price <= modal_price <= max_price` is not guaranteed; upstream data
/// violates it now and then.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRecord {
    pub state: String,
    pub district: String,
    pub market: String,
    pub commodity: String,
    pub variety: String,
    pub grade: String,
    /// Arrival date as sent upstream (`DD/MM/YYYY`), not parsed
    pub arrival_date: String,
    pub min_price: f64,
    pub max_price: f64,
    pub modal_price: f64,
}

/// A price record as it arrives from the upstream API
///
/// Every field is optional and numeric values are usually sent as strings.
/// Numbers and strings are both accepted for any field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPriceRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub commodity: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub variety: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub arrival_date: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub min_price: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub max_price: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub modal_price: Option<String>,
}

/// Response body of the upstream API (and of the proxy, which passes it through)
///
/// Only the fields the dashboard uses are modelled; the API also sends
/// catalogue metadata (title, field list, update dates) which is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamResponse {
    /// Total number of records matching the server-side filters
    #[serde(default, deserialize_with = "loose_count")]
    pub total: u64,
    /// Number of records in this page
    #[serde(default, deserialize_with = "loose_count")]
    pub count: u64,
    /// The records of this page; absent on malformed responses
    #[serde(default)]
    pub records: Option<Vec<RawPriceRecord>>,
}

/// What gets cached per query signature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub records: Vec<PriceRecord>,
    pub total: u64,
}

/// Parameters of a price request, as accepted by the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub limit: u32,
    pub offset: u32,
    pub state: Option<String>,
    pub district: Option<String>,
}

impl Default for PriceQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            state: None,
            district: None,
        }
    }
}

impl PriceQuery {
    /// Builds a query for a `(state, district)` pair; empty values mean "no filter"
    pub fn for_region(limit: u32, state: &str, district: &str) -> Self {
        Self {
            limit,
            offset: 0,
            state: non_empty(state),
            district: non_empty(district),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Cache key derived from the server-side filter pair
///
/// Only `(state, district)` go into the signature. Commodity family and
/// free-text search are applied client-side to already fetched data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature(String);

impl QuerySignature {
    pub fn new(state: &str, district: &str) -> Self {
        Self(format!("prices_{}_{}", state, district))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts a string, a number or a boolean as `Some(String)`; anything else as `None`
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Accepts a non-negative integer or a numeric string; anything else counts as 0
fn loose_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
