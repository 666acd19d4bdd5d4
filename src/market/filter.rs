//! Client-side filtering and pagination over fetched price records
//!
//! Everything here is a pure function of the records and the active filter,
//! recomputed on demand by the orchestrator after each mutation.

use std::collections::BTreeSet;

use super::{CommodityFamily, PriceRecord};

/// Records per dashboard page
pub const PAGE_SIZE: usize = 50;

/// The active client-side filter values
///
/// Empty strings mean "no filter" for `state`, `district` and `search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub state: String,
    pub district: String,
    pub family: CommodityFamily,
    pub search: String,
}

impl PriceFilter {
    /// Whether a record passes every active predicate
    ///
    /// Predicates apply in a fixed order: state, district, commodity family,
    /// then a case-insensitive substring search over commodity, market and
    /// variety.
    pub fn matches(&self, record: &PriceRecord) -> bool {
        if !self.state.is_empty() && record.state != self.state {
            return false;
        }
        if !self.district.is_empty() && record.district != self.district {
            return false;
        }
        if !self.family.includes(&record.commodity) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }

        let query = self.search.to_lowercase();
        record.commodity.to_lowercase().contains(&query)
            || record.market.to_lowercase().contains(&query)
            || record.variety.to_lowercase().contains(&query)
    }

    /// Records passing the filter, in their original order
    pub fn apply<'a>(&self, records: &'a [PriceRecord]) -> Vec<&'a PriceRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted distinct non-empty states across all records
pub fn distinct_states(records: &[PriceRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.state.as_str())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted distinct non-empty districts of records in `state`
///
/// Empty when no state is selected.
pub fn districts_for(records: &[PriceRecord], state: &str) -> Vec<String> {
    if state.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.state == state)
        .map(|r| r.district.as_str())
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Number of pages needed for `count` items
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// The items of 1-based page `page`
///
/// Out-of-range pages (including 0) yield an empty slice; clamping the page
/// number is the caller's job.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
