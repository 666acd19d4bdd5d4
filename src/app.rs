//! Application state for the terminal price dashboard
//!
//! [`App`] wraps the retrieval orchestrator and turns key presses into filter
//! changes, page moves and refresh requests. Rendering reads from it; the main
//! loop runs the network requests it starts and hands the results back.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::i18n::{Language, Translator};
use crate::market::{FetchError, MarketPrices, PendingFetch, Phase, UpstreamResponse};

/// Where key presses go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys are shortcuts
    #[default]
    Normal,
    /// Keys edit the search query
    Search,
}

/// Main application struct managing state and key handling
#[derive(Debug)]
pub struct App<S> {
    /// The price view being displayed
    pub prices: MarketPrices<S>,
    /// Display language lookups
    pub translator: Translator,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    pub input_mode: InputMode,
}

impl<S> App<S> {
    /// Creates a new App around an unmounted price view
    pub fn new(prices: MarketPrices<S>, language: Language) -> Self {
        Self {
            prices,
            translator: Translator::new(language),
            should_quit: false,
            refresh_requested: false,
            show_help: false,
            input_mode: InputMode::Normal,
        }
    }

    /// Whether the first load has not produced anything to show yet
    ///
    /// A load that already applied stale cached records is not "loading" here;
    /// those records are shown while the request runs.
    pub fn is_loading(&self) -> bool {
        matches!(self.prices.phase(), Phase::Idle | Phase::Loading)
            && self.prices.all_records().is_empty()
    }

    /// Handles a key press
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.input_mode == InputMode::Search {
            self.handle_search_key(key_event);
            return;
        }

        if self.is_loading() {
            // Only quit is allowed during the first load
            if key_event.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') if !self.prices.loading() => {
                self.refresh_requested = true;
            }
            KeyCode::Char('f') | KeyCode::Tab => {
                let next = self.prices.filter().family.next_tab();
                self.prices.set_selected_family(next);
            }
            KeyCode::Char('s') => self.cycle_state(),
            KeyCode::Char('d') => self.cycle_district(),
            KeyCode::Char('x') => self.clear_filters(),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('L') => {
                let next = self.translator.language().next();
                self.translator.set_language(next);
            }
            KeyCode::Right | KeyCode::Char('l') => self.next_page(),
            KeyCode::Left | KeyCode::Char('h') => self.previous_page(),
            KeyCode::Home | KeyCode::Char('g') => self.prices.set_current_page(1),
            KeyCode::End | KeyCode::Char('G') => {
                let last = self.prices.total_pages().max(1);
                self.prices.set_current_page(last);
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                let mut query = self.prices.filter().search.clone();
                if query.pop().is_some() {
                    self.prices.set_search_query(query);
                }
            }
            KeyCode::Char(c) => {
                let mut query = self.prices.filter().search.clone();
                query.push(c);
                self.prices.set_search_query(query);
            }
            _ => {}
        }
    }

    /// Moves to the next state in the list; past the last one means "all states"
    fn cycle_state(&mut self) {
        let next = next_option(&self.prices.states(), &self.prices.filter().state);
        self.prices.set_selected_state(next);
    }

    /// Same as [`Self::cycle_state`] for districts; needs a state selected
    fn cycle_district(&mut self) {
        let districts = self.prices.districts();
        if districts.is_empty() {
            return;
        }
        let next = next_option(&districts, &self.prices.filter().district);
        self.prices.set_selected_district(next);
    }

    fn clear_filters(&mut self) {
        self.prices.set_selected_state("");
        self.prices.set_selected_family(Default::default());
        self.prices.set_search_query("");
    }

    fn next_page(&mut self) {
        let page = self.prices.current_page();
        if page < self.prices.total_pages() {
            self.prices.set_current_page(page + 1);
        }
    }

    fn previous_page(&mut self) {
        let page = self.prices.current_page();
        if page > 1 {
            self.prices.set_current_page(page - 1);
        }
    }
}

impl<S> App<S> {
    /// Starts the initial load; `None` when fresh cached prices were enough
    pub fn begin_mount(&mut self) -> Option<PendingFetch> {
        self.prices.begin_fetch("", "")
    }

    /// Starts the refresh asked for with `r`
    pub fn begin_refresh(&mut self) -> Option<PendingFetch> {
        self.refresh_requested = false;
        self.prices.begin_refresh()
    }

    /// Applies the outcome of a request started by `begin_*`
    pub fn complete_fetch(
        &mut self,
        pending: PendingFetch,
        result: Result<UpstreamResponse, FetchError>,
    ) {
        self.prices.complete_fetch(pending, result);
    }
}

/// The option after `current`, cycling through "" (no filter) after the last
fn next_option(options: &[String], current: &str) -> String {
    if current.is_empty() {
        return options.first().cloned().unwrap_or_default();
    }
    options
        .iter()
        .position(|o| o == current)
        .and_then(|i| options.get(i + 1))
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, ManualClock, MemoryStore};
    use crate::market::{CommodityFamily, PriceQuery, PriceRecord, PriceSnapshot, PriceSource};

    /// Source that always fails; tests seed the cache instead
    struct Offline;

    impl PriceSource for Offline {
        async fn fetch_prices(&self, _query: &PriceQuery) -> Result<UpstreamResponse, FetchError> {
            Err(FetchError::InvalidResponse)
        }
    }

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn record(state: &str, district: &str, commodity: &str) -> PriceRecord {
        PriceRecord {
            state: state.to_string(),
            district: district.to_string(),
            market: district.to_string(),
            commodity: commodity.to_string(),
            modal_price: 1000.0,
            ..Default::default()
        }
    }

    /// App mounted from a fresh cache holding `records`
    async fn mounted_app(records: Vec<PriceRecord>) -> App<Offline> {
        let cache = CacheStore::with_clock(MemoryStore::new(), ManualClock::new(1_700_000_000_000));
        let total = records.len() as u64;
        cache.set("prices__", &PriceSnapshot { records, total });
        let mut app = App::new(MarketPrices::new(Offline, cache), Language::En);
        app.prices.mount().await;
        app
    }

    fn sample_records() -> Vec<PriceRecord> {
        vec![
            record("Maharashtra", "Nashik", "Onion"),
            record("Maharashtra", "Pune", "Tomato"),
            record("Karnataka", "Kolar", "Mango"),
        ]
    }

    #[test]
    fn test_new_app_is_loading() {
        let cache = CacheStore::new(MemoryStore::new());
        let app = App::new(MarketPrices::new(Offline, cache), Language::Te);
        assert!(app.is_loading());
        assert!(!app.should_quit);
        assert_eq!(app.translator.language(), Language::Te);
    }

    #[test]
    fn test_only_quit_while_loading() {
        let cache = CacheStore::new(MemoryStore::new());
        let mut app = App::new(MarketPrices::new(Offline, cache), Language::En);
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(!app.refresh_requested);
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_refresh_key_sets_flag() {
        let mut app = mounted_app(sample_records()).await;
        assert!(!app.is_loading());
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(app.refresh_requested);
    }

    #[tokio::test]
    async fn test_family_key_cycles_tabs() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.prices.filter().family, CommodityFamily::Vegetables);
        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.prices.filter().family, CommodityFamily::Fruits);
        assert_eq!(app.prices.filtered_count(), 1);
    }

    #[tokio::test]
    async fn test_state_and_district_cycling() {
        let mut app = mounted_app(sample_records()).await;

        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.prices.filter().district, "", "No districts without a state");

        app.handle_key(key_event(KeyCode::Char('s')));
        assert_eq!(app.prices.filter().state, "Karnataka");
        app.handle_key(key_event(KeyCode::Char('s')));
        assert_eq!(app.prices.filter().state, "Maharashtra");

        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.prices.filter().district, "Nashik");
        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.prices.filter().district, "Pune");
        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.prices.filter().district, "");

        app.handle_key(key_event(KeyCode::Char('s')));
        assert_eq!(app.prices.filter().state, "", "Wraps to all states");
    }

    #[tokio::test]
    async fn test_search_mode_edits_query() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);

        for c in "tomx".chars() {
            app.handle_key(key_event(KeyCode::Char(c)));
        }
        app.handle_key(key_event(KeyCode::Backspace));
        assert_eq!(app.prices.filter().search, "tom");
        assert_eq!(app.prices.filtered_count(), 1);

        // 'q' is text while searching
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.prices.filter().search, "tomq");
    }

    #[tokio::test]
    async fn test_paging_is_clamped() {
        let records = (0..120).map(|_| record("Punjab", "Ludhiana", "Wheat")).collect();
        let mut app = mounted_app(records).await;

        app.handle_key(key_event(KeyCode::Left));
        assert_eq!(app.prices.current_page(), 1);

        app.handle_key(key_event(KeyCode::Right));
        app.handle_key(key_event(KeyCode::Char('l')));
        app.handle_key(key_event(KeyCode::Right));
        assert_eq!(app.prices.current_page(), 3);

        app.handle_key(key_event(KeyCode::Char('g')));
        assert_eq!(app.prices.current_page(), 1);
        app.handle_key(key_event(KeyCode::End));
        assert_eq!(app.prices.current_page(), 3);
    }

    #[tokio::test]
    async fn test_clear_filters() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('s')));
        app.handle_key(key_event(KeyCode::Char('f')));
        app.handle_key(key_event(KeyCode::Char('x')));
        assert_eq!(app.prices.filter().state, "");
        assert_eq!(app.prices.filter().family, CommodityFamily::All);
        assert_eq!(app.prices.filtered_count(), 3);
    }

    #[tokio::test]
    async fn test_help_overlay_intercepts_keys() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(!app.refresh_requested);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_help_closes_on_listed_keys_only() {
        let mut app = mounted_app(sample_records()).await;
        for close in [KeyCode::Esc, KeyCode::Char('?'), KeyCode::Char('q')] {
            app.handle_key(key_event(KeyCode::Char('?')));
            app.handle_key(key_event(KeyCode::Char('x')));
            assert!(app.show_help, "Other keys leave help open");
            app.handle_key(key_event(close));
            assert!(!app.show_help);
            assert!(!app.should_quit, "Closing help does not quit");
        }
    }

    #[tokio::test]
    async fn test_language_key_cycles() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('L')));
        assert_eq!(app.translator.language(), Language::Te);
    }

    #[tokio::test]
    async fn test_refresh_failure_reports_error() {
        let mut app = mounted_app(sample_records()).await;
        app.handle_key(key_event(KeyCode::Char('r')));

        let pending = app.begin_refresh().expect("Refresh needs a request");
        assert!(!app.refresh_requested);
        assert!(!app.is_loading(), "Current records stay on screen while refreshing");

        // Keys still work while the request is in flight; refresh does not stack
        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.prices.filter().family, CommodityFamily::Vegetables);
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(!app.refresh_requested);

        app.complete_fetch(pending, Err(FetchError::InvalidResponse));
        assert_eq!(app.prices.phase(), Phase::Failed);
        assert_eq!(app.prices.error(), Some("Invalid API response"));
    }

    #[test]
    fn test_stale_cache_is_usable_before_the_fetch_returns() {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = CacheStore::with_clock(MemoryStore::new(), clock.clone());
        cache.set(
            "prices__",
            &PriceSnapshot {
                records: sample_records(),
                total: 3,
            },
        );
        clock.advance_hours(26);
        let mut app = App::new(MarketPrices::new(Offline, cache), Language::En);

        let pending = app.begin_mount().expect("Stale cache needs a request");
        assert!(app.prices.loading());
        assert!(!app.is_loading());
        assert!(app.prices.is_stale());

        app.handle_key(key_event(KeyCode::Char('s')));
        assert_eq!(app.prices.filter().state, "Karnataka");

        app.complete_fetch(pending, Err(FetchError::InvalidResponse));
        assert_eq!(app.prices.phase(), Phase::Ready);
        assert_eq!(app.prices.error(), Some("Invalid API response. Showing cached data."));
    }

    #[test]
    fn test_quit_works_during_first_load() {
        let cache = CacheStore::new(MemoryStore::new());
        let mut app = App::new(MarketPrices::new(Offline, cache), Language::En);
        let _pending = app.begin_mount().expect("Empty cache needs a request");
        assert!(app.is_loading());
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_next_option() {
        let options = vec!["A".to_string(), "B".to_string()];
        assert_eq!(next_option(&options, ""), "A");
        assert_eq!(next_option(&options, "A"), "B");
        assert_eq!(next_option(&options, "B"), "");
        assert_eq!(next_option(&options, "Z"), "");
        assert_eq!(next_option(&[], ""), "");
    }
}
