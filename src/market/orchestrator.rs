//! Retrieval orchestration for the market price dashboard
//!
//! [`MarketPrices`] owns the state of one mounted price view: the fetched
//! records, the loading/error/stale flags, and the active filters. It decides
//! when to serve from the cache and when to go to the network, and exposes the
//! derived views (distinct states and districts, filtered and paginated
//! records) as plain functions of that state.
//!
//! ```text
//! Idle ──mount──▶ Loading ──ok──▶ Ready
//!   │                │              ▲ │
//!   └─fresh cache────┼──────────────┘ │ refresh
//!                    └──err──▶ Failed ◀┘ (or Ready on stale fallback)
//! ```

use tracing::{debug, info, warn};

use super::filter::{self, PriceFilter, PAGE_SIZE};
use super::normalize::normalize_records;
use super::{
    CommodityFamily, FetchError, PriceQuery, PriceRecord, PriceSnapshot, PriceSource,
    QuerySignature, UpstreamResponse,
};
use crate::cache::CacheStore;

/// Records requested per fetch (one chunk per query signature)
pub const FETCH_LIMIT: u32 = 500;

/// Label shown right after a successful network fetch
const JUST_NOW: &str = "Just now";

/// Lifecycle phase of a mounted price view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// Records are available (possibly stale)
    Ready,
    /// The fetch failed and there was no cached fallback
    Failed,
}

/// Everything the presentation layer reads, computed from current state
#[derive(Debug, Clone, PartialEq)]
pub struct MarketView {
    /// Records on the current page, after filtering
    pub records: Vec<PriceRecord>,
    /// Records passing the client-side filters
    pub filtered_count: usize,
    /// Upstream total for the active server-side query
    pub total_records: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub is_stale: bool,
    pub last_updated: Option<String>,
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub selected_state: String,
    pub selected_district: String,
    pub selected_family: CommodityFamily,
    pub search_query: String,
    pub current_page: usize,
    pub total_pages: usize,
}

/// A network fetch that has been started but not yet completed
///
/// Returned by [`MarketPrices::begin_fetch`]; the caller runs `query` against
/// a [`PriceSource`] however it likes and hands the outcome back to
/// [`MarketPrices::complete_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub query: PriceQuery,
    signature: QuerySignature,
    has_fallback: bool,
}

/// State machine behind one mounted market price view
#[derive(Debug)]
pub struct MarketPrices<S> {
    source: S,
    cache: CacheStore,
    records: Vec<PriceRecord>,
    total_records: u64,
    phase: Phase,
    error: Option<String>,
    is_stale: bool,
    last_updated: Option<String>,
    filter: PriceFilter,
    current_page: usize,
}

impl<S: PriceSource> MarketPrices<S> {
    /// Creates an idle view over the given source and cache
    pub fn new(source: S, cache: CacheStore) -> Self {
        Self {
            source,
            cache,
            records: Vec::new(),
            total_records: 0,
            phase: Phase::Idle,
            error: None,
            is_stale: false,
            last_updated: None,
            filter: PriceFilter::default(),
            current_page: 1,
        }
    }

    /// Loads the unfiltered price list, from cache when fresh
    pub async fn mount(&mut self) {
        self.fetch_market_data("", "").await;
    }

    /// Drops the cache entry for the current `(state, district)` and refetches
    ///
    /// Always hits the network, even if the cached entry was fresh.
    pub async fn refresh(&mut self) {
        if let Some(pending) = self.begin_refresh() {
            let result = self.source.fetch_prices(&pending.query).await;
            self.complete_fetch(pending, result);
        }
    }

    /// Serves `(state, district)` from cache if fresh, otherwise fetches it
    pub async fn fetch_market_data(&mut self, state: &str, district: &str) {
        if let Some(pending) = self.begin_fetch(state, district) {
            let result = self.source.fetch_prices(&pending.query).await;
            self.complete_fetch(pending, result);
        }
    }
}

impl<S> MarketPrices<S> {
    // ── Fetch lifecycle ───────────────────────────────────────────────
    //
    // The async methods above run these back to back. The dashboard runs the
    // network request on its own task in between, so the view stays usable
    // while a request is in flight.

    /// First half of a fetch for `(state, district)`
    ///
    /// Applies any cached snapshot at once. Returns `None` when that snapshot
    /// is fresh and no request is needed; otherwise moves to
    /// [`Phase::Loading`] and returns the request to run. Stale data applied
    /// here stays visible while loading and becomes the fallback if the
    /// request fails.
    pub fn begin_fetch(&mut self, state: &str, district: &str) -> Option<PendingFetch> {
        let signature = QuerySignature::new(state, district);

        let cached = self.cache.get::<PriceSnapshot>(signature.as_str());
        let has_fallback = cached.is_some();
        if let Some(cached) = cached {
            self.apply_snapshot(cached.data);
            self.is_stale = cached.is_stale;
            self.last_updated = self.cache.age(signature.as_str());

            if !cached.is_stale {
                debug!(signature = %signature, "serving fresh cached prices");
                self.error = None;
                self.phase = Phase::Ready;
                return None;
            }
        }

        self.phase = Phase::Loading;
        self.error = None;

        Some(PendingFetch {
            query: PriceQuery::for_region(FETCH_LIMIT, state, district),
            signature,
            has_fallback,
        })
    }

    /// First half of a refresh: drops the cache entry for the current
    /// `(state, district)` so the request always goes to the network
    pub fn begin_refresh(&mut self) -> Option<PendingFetch> {
        let state = self.filter.state.clone();
        let district = self.filter.district.clone();
        let signature = QuerySignature::new(&state, &district);

        info!(signature = %signature, "refreshing market prices");
        self.cache.invalidate(signature.as_str());
        self.begin_fetch(&state, &district)
    }

    /// Second half of a fetch: caches and shows the result, or falls back
    pub fn complete_fetch(
        &mut self,
        pending: PendingFetch,
        result: Result<UpstreamResponse, FetchError>,
    ) {
        let signature = pending.signature;
        let result = result.and_then(|body| {
            let raw = body.records.ok_or(FetchError::InvalidResponse)?;
            Ok(PriceSnapshot {
                records: normalize_records(&raw),
                total: body.total,
            })
        });

        match result {
            Ok(snapshot) => {
                info!(
                    signature = %signature,
                    records = snapshot.records.len(),
                    total = snapshot.total,
                    "fetched market prices"
                );
                self.cache.set(signature.as_str(), &snapshot);
                self.apply_snapshot(snapshot);
                self.is_stale = false;
                self.last_updated = Some(JUST_NOW.to_string());
                self.phase = Phase::Ready;
            }
            Err(e) => {
                let message = e.to_string();
                if pending.has_fallback {
                    warn!(signature = %signature, error = %message, "fetch failed, showing cached prices");
                    self.error = Some(format!("{}. Showing cached data.", message));
                    self.is_stale = true;
                    self.phase = Phase::Ready;
                } else {
                    warn!(signature = %signature, error = %message, "fetch failed with no cached fallback");
                    self.error = Some(message);
                    self.phase = Phase::Failed;
                }
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: PriceSnapshot) {
        self.records = snapshot.records;
        self.total_records = snapshot.total;
    }
}

impl<S> MarketPrices<S> {
    // ── Filter setters ────────────────────────────────────────────────
    //
    // None of these refetch; they only change which fetched records are shown.

    /// Selects a state, clearing the district and going back to page 1
    pub fn set_selected_state(&mut self, state: impl Into<String>) {
        self.filter.state = state.into();
        self.filter.district.clear();
        self.current_page = 1;
    }

    pub fn set_selected_district(&mut self, district: impl Into<String>) {
        self.filter.district = district.into();
        self.current_page = 1;
    }

    pub fn set_selected_family(&mut self, family: CommodityFamily) {
        self.filter.family = family;
        self.current_page = 1;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filter.search = query.into();
        self.current_page = 1;
    }

    /// Moves to a 1-based page; the caller keeps it within `1..=total_pages`
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page;
    }

    // ── State accessors ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    /// Upstream total for the last server-side query (not the filtered count)
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Every fetched record, unfiltered
    pub fn all_records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn filter(&self) -> &PriceFilter {
        &self.filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    // ── Derived views ─────────────────────────────────────────────────

    /// Distinct states across all fetched records
    pub fn states(&self) -> Vec<String> {
        filter::distinct_states(&self.records)
    }

    /// Distinct districts within the selected state
    pub fn districts(&self) -> Vec<String> {
        filter::districts_for(&self.records, &self.filter.state)
    }

    pub fn filtered_records(&self) -> Vec<&PriceRecord> {
        self.filter.apply(&self.records)
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_records().len()
    }

    pub fn total_pages(&self) -> usize {
        filter::total_pages(self.filtered_count(), PAGE_SIZE)
    }

    /// Records on the current page
    pub fn page_records(&self) -> Vec<PriceRecord> {
        let filtered = self.filtered_records();
        filter::paginate(&filtered, self.current_page, PAGE_SIZE)
            .iter()
            .map(|r| (*r).clone())
            .collect()
    }

    /// Snapshot of everything the UI shows
    pub fn view(&self) -> MarketView {
        let filtered_count = self.filtered_count();

        MarketView {
            records: self.page_records(),
            filtered_count,
            total_records: self.total_records,
            loading: self.loading(),
            error: self.error.clone(),
            is_stale: self.is_stale,
            last_updated: self.last_updated.clone(),
            states: self.states(),
            districts: self.districts(),
            selected_state: self.filter.state.clone(),
            selected_district: self.filter.district.clone(),
            selected_family: self.filter.family,
            search_query: self.filter.search.clone(),
            current_page: self.current_page,
            total_pages: filter::total_pages(filtered_count, PAGE_SIZE),
        }
    }
}
