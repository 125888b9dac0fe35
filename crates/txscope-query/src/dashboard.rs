//! Transactions dashboard view-model
//!
//! Wires the filter store, debounced search, query cache, scroll loader and
//! memoized insights together and turns their state into display values.

use chrono::NaiveDate;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

use txscope_config::{Config, CurrencyConfig};
use txscope_core::{
    Category, FilterCriteria, FilterPatch, InsightsMemo, InsightsSummary, TransactionRecord,
    TransactionStatus,
};
use txscope_fetch::FetcherRef;
use txscope_utils::{format_currency, format_number, format_percent};

use crate::cache::{FetchHandle, QueryOptions, QuerySnapshot, QueryStatus, TransactionQuery};
use crate::scroll::{ScrollLoader, ScrollMetrics};
use crate::search::DebouncedSearch;
use crate::store::FilterStore;

/// Shown below the list once every page is loaded
pub const END_OF_LIST: &str = "No more transactions";

// ==================== Display values ====================

/// One summary card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightCard {
    pub title: &'static str,
    pub value: String,
}

/// Why the list is empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// The last fetch failed
    Error { message: Option<String> },
    /// The criteria match nothing
    NoResults,
}

impl EmptyState {
    pub fn title(&self) -> &'static str {
        match self {
            EmptyState::Error { .. } => "Failed to load transactions",
            EmptyState::NoResults => "No transactions found",
        }
    }

    pub fn description(&self) -> String {
        match self {
            EmptyState::Error { message: Some(message) } if !message.is_empty() => message.clone(),
            EmptyState::Error { .. } => "Something went wrong. Please try again.".to_string(),
            EmptyState::NoResults => "Try adjusting your search or filters.".to_string(),
        }
    }
}

/// Everything a front end needs to render one frame
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub records: Arc<Vec<TransactionRecord>>,
    pub cards: Vec<InsightCard>,
    pub empty_state: Option<EmptyState>,
    /// Error to show above a non-empty list
    pub error: Option<String>,
    pub is_loading: bool,
    pub is_fetching_next: bool,
    pub is_refetching: bool,
    pub show_end_of_list: bool,
    pub has_active_filters: bool,
}

// ==================== Dashboard ====================

pub struct Dashboard {
    store: FilterStore,
    search: DebouncedSearch,
    query: TransactionQuery,
    loader: ScrollLoader,
    insights: Mutex<InsightsMemo>,
    currency: CurrencyConfig,
}

impl Dashboard {
    pub fn new(config: &Config, store: FilterStore, fetcher: FetcherRef) -> Self {
        let query = TransactionQuery::new(fetcher, QueryOptions::from(&config.cache));
        Self::with_query(config, store, query)
    }

    pub fn with_query(config: &Config, store: FilterStore, query: TransactionQuery) -> Self {
        Self {
            search: DebouncedSearch::new(store.clone(), config.debounce()),
            store,
            query,
            loader: ScrollLoader::from(&config.scroll),
            insights: Mutex::new(InsightsMemo::new()),
            currency: config.currency.clone(),
        }
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn search(&self) -> &DebouncedSearch {
        &self.search
    }

    pub fn query(&self) -> &TransactionQuery {
        &self.query
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.store.get()
    }

    /// Bring the search buffer and the active query in line with the store
    pub fn sync(&self) -> Option<FetchHandle> {
        let criteria = self.store.get();
        self.search.sync_from_committed(&criteria.search);
        self.query.set_criteria(criteria)
    }

    /// Follow store changes in the background until the store goes away
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.store.subscribe();
        let dashboard = Arc::downgrade(self);
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                match dashboard.upgrade() {
                    Some(dashboard) => {
                        dashboard.sync();
                    }
                    None => break,
                }
            }
        })
    }

    // ==================== Filter actions ====================

    fn apply(&self, patch: FilterPatch) -> Option<FetchHandle> {
        if self.store.update(patch) {
            self.sync()
        } else {
            None
        }
    }

    /// Add or remove one status from the multi-select
    pub fn toggle_status(&self, status: TransactionStatus) -> Option<FetchHandle> {
        let mut selected = self.store.get().status;
        if !selected.remove(&status) {
            selected.insert(status);
        }
        self.apply(FilterPatch::new().status(selected))
    }

    pub fn set_category(&self, category: Option<Category>) -> Option<FetchHandle> {
        self.apply(FilterPatch::new().category(category))
    }

    pub fn set_date_range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<FetchHandle> {
        self.apply(FilterPatch::new().date_from(from).date_to(to))
    }

    pub fn clear_dates(&self) -> Option<FetchHandle> {
        self.set_date_range(None, None)
    }

    /// Keystroke in the search box
    pub fn search_input(&self, text: impl Into<String>) {
        self.search.input(text);
    }

    /// Reset every filter, including the search box
    pub fn clear_all(&self) -> Option<FetchHandle> {
        self.search.clear();
        self.store.clear();
        self.sync()
    }

    // ==================== Pagination ====================

    pub fn on_scroll(&self, metrics: &ScrollMetrics) -> Option<FetchHandle> {
        self.loader.on_scroll(metrics, &self.query)
    }

    pub fn on_content_change(&self, metrics: &ScrollMetrics) -> Option<FetchHandle> {
        self.loader.on_content_change(metrics, &self.query)
    }

    pub fn load_more(&self) -> Option<FetchHandle> {
        self.query.request_next()
    }

    pub fn retry(&self) -> Option<FetchHandle> {
        self.query.retry()
    }

    // ==================== Derived values ====================

    /// Insights over the currently shown records
    pub fn insights(&self) -> InsightsSummary {
        let snapshot = self.query.snapshot();
        self.summarize(&snapshot)
    }

    fn summarize(&self, snapshot: &QuerySnapshot) -> InsightsSummary {
        self.insights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&snapshot.records)
    }

    /// Number of summaries computed so far
    pub fn insight_computations(&self) -> usize {
        self.insights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .computations()
    }

    pub fn insight_cards(&self, summary: &InsightsSummary) -> Vec<InsightCard> {
        let currency = &self.currency;
        vec![
            InsightCard {
                title: "Total Transactions",
                value: format_number(summary.total_count, &currency.thousands_separator),
            },
            InsightCard {
                title: "Successful Amount",
                value: format_currency(
                    summary.successful_amount,
                    &currency.symbol,
                    currency.decimal_places,
                    &currency.thousands_separator,
                ),
            },
            InsightCard {
                title: "Success Rate",
                value: format_percent(summary.success_rate),
            },
            InsightCard {
                title: "Top Category",
                value: summary.top_category_label(),
            },
        ]
    }

    pub fn view(&self) -> DashboardView {
        let snapshot = self.query.snapshot();
        let summary = self.summarize(&snapshot);
        let empty = snapshot.records.is_empty();
        let settled = !snapshot.is_fetching() && snapshot.status != QueryStatus::Idle;

        let empty_state = if !empty || !settled {
            None
        } else if snapshot.is_error() {
            Some(EmptyState::Error {
                message: snapshot.error_message(),
            })
        } else {
            Some(EmptyState::NoResults)
        };

        DashboardView {
            cards: self.insight_cards(&summary),
            error: if empty { None } else { snapshot.error_message() },
            is_loading: snapshot.is_loading(),
            is_fetching_next: snapshot.is_fetching_next(),
            is_refetching: snapshot.is_refetching,
            show_end_of_list: !empty && !snapshot.has_more && !snapshot.is_error(),
            has_active_filters: snapshot.criteria.has_active_filters(),
            criteria: snapshot.criteria,
            records: snapshot.records,
            empty_state,
        }
    }
}

// ==================== Tests ====================
