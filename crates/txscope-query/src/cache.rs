//! Paginated query cache
//!
//! One entry per distinct `FilterCriteria`. Each entry holds its fetched pages
//! in cursor order, the "has more" flag, the last error and at most one fetch
//! in flight. Fetches run as Tokio tasks; their results are applied only if the
//! entry still expects them and, for non-prefetch fetches, only while their
//! criteria is still the active one.
//!
//! Every public operation that may start a fetch must be called from inside a
//! Tokio runtime.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use txscope_config::CacheConfig;
use txscope_core::error::DefaultErrorLogger;
use txscope_core::{CoreError, ErrorContext, ErrorLogger, FilterCriteria, Page, TransactionRecord};
use txscope_fetch::FetcherRef;

// ==================== Public types ====================

/// Cache lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Age after which a reused entry is refreshed in the background
    pub stale_time: Duration,
    /// Idle time after which an inactive entry is evicted
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for QueryOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            stale_time: config.stale_time(),
            gc_time: config.gc_time(),
        }
    }
}

/// Lifecycle of one criteria entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing requested yet
    Idle,
    /// Fetching the first page
    Loading,
    /// Pages loaded, nothing pending (a background refresh may be running)
    Ready,
    /// Fetching the next cursor
    LoadingNext,
    /// The last fetch failed; loaded pages are kept
    Error,
}

/// Result of one fetch, shared by everybody waiting on it
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A non-empty page was appended
    Appended { cursor: u32, count: usize },
    /// The page came back empty; no more data for this key
    Exhausted { cursor: u32 },
    /// A background refresh replaced the loaded pages
    Refreshed { pages: usize },
    /// The fetch failed
    Failed(CoreError),
    /// The result arrived for a criteria that is no longer active and was dropped
    Discarded,
}

/// Awaitable handle on an in-flight fetch
///
/// Cloning is cheap; all clones resolve to the same outcome. The fetch runs
/// whether or not anybody awaits the handle.
#[derive(Clone)]
pub struct FetchHandle {
    outcome: Shared<BoxFuture<'static, FetchOutcome>>,
}

impl FetchHandle {
    pub async fn wait(self) -> FetchOutcome {
        self.outcome.await
    }
}

impl std::fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchHandle").finish_non_exhaustive()
    }
}

/// Read-only view of the active query
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    /// Criteria key this snapshot belongs to
    pub criteria: FilterCriteria,
    /// Flattened records in fetch order
    pub records: Arc<Vec<TransactionRecord>>,
    pub status: QueryStatus,
    pub has_more: bool,
    pub error: Option<CoreError>,
    /// `records` belong to the previously active criteria
    pub is_placeholder: bool,
    /// A background refresh is running over already shown records
    pub is_refetching: bool,
    /// Number of non-empty pages loaded
    pub page_count: usize,
}

impl QuerySnapshot {
    fn idle(criteria: FilterCriteria) -> Self {
        Self {
            criteria,
            records: Arc::new(Vec::new()),
            status: QueryStatus::Idle,
            has_more: false,
            error: None,
            is_placeholder: false,
            is_refetching: false,
            page_count: 0,
        }
    }

    /// First page pending and nothing to show
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && !self.is_placeholder
    }

    pub fn is_fetching_next(&self) -> bool {
        self.status == QueryStatus::LoadingNext
    }

    /// Any fetch pending for this key
    pub fn is_fetching(&self) -> bool {
        matches!(self.status, QueryStatus::Loading | QueryStatus::LoadingNext) || self.is_refetching
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Human-readable error message, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

// ==================== Internal state ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    /// First page of a key
    Initial,
    /// The next cursor of a loaded key
    Next,
    /// Re-fetch of the first `n` pages, swapped in on completion
    Refresh,
}

struct InFlight {
    generation: u64,
    kind: FetchKind,
    /// Prefetches may complete for an inactive key
    prefetch: bool,
    handle: FetchHandle,
}

struct QueryEntry {
    pages: Vec<Page>,
    records: Arc<Vec<TransactionRecord>>,
    has_more: bool,
    status: QueryStatus,
    error: Option<CoreError>,
    /// What to re-issue on retry
    failed: Option<(FetchKind, u32)>,
    in_flight: Option<InFlight>,
    updated_at: Option<Instant>,
    last_used: Instant,
}

impl QueryEntry {
    fn new(now: Instant) -> Self {
        Self {
            pages: Vec::new(),
            records: Arc::new(Vec::new()),
            has_more: true,
            status: QueryStatus::Idle,
            error: None,
            failed: None,
            in_flight: None,
            updated_at: None,
            last_used: now,
        }
    }

    fn next_cursor(&self) -> u32 {
        self.pages.len() as u32 + 1
    }

    /// Cursors a refresh must cover; an exhausted key re-reads its empty tail page
    fn refresh_cursors(&self) -> u32 {
        if self.has_more {
            self.pages.len().max(1) as u32
        } else {
            self.next_cursor()
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        self.updated_at
            .map_or(true, |at| now.saturating_duration_since(at) >= stale_time)
    }

    fn in_flight_handle(&self) -> Option<FetchHandle> {
        self.in_flight.as_ref().map(|f| f.handle.clone())
    }

    fn append(&mut self, page: Page) {
        let mut records = Vec::with_capacity(self.records.len() + page.len());
        records.extend_from_slice(&self.records);
        records.extend(page.iter().cloned());
        self.records = Arc::new(records);
        self.pages.push(page);
    }

    fn replace_pages(&mut self, pages: Vec<Page>) {
        self.records = Arc::new(pages.iter().flatten().cloned().collect());
        self.pages = pages;
    }
}

struct CacheState {
    active: FilterCriteria,
    entries: HashMap<FilterCriteria, QueryEntry>,
    /// Records of the previously active key, shown while a new key loads
    placeholder: Option<Arc<Vec<TransactionRecord>>>,
    generation: u64,
}

struct Inner {
    fetcher: FetcherRef,
    options: QueryOptions,
    logger: Arc<dyn ErrorLogger>,
    state: Mutex<CacheState>,
    snapshots: watch::Sender<QuerySnapshot>,
}

// ==================== Query ====================

/// Paginated, criteria-keyed transaction query
#[derive(Clone)]
pub struct TransactionQuery {
    inner: Arc<Inner>,
}

impl TransactionQuery {
    pub fn new(fetcher: FetcherRef, options: QueryOptions) -> Self {
        Self::with_logger(fetcher, options, Arc::new(DefaultErrorLogger))
    }

    pub fn with_logger(fetcher: FetcherRef, options: QueryOptions, logger: Arc<dyn ErrorLogger>) -> Self {
        let active = FilterCriteria::default();
        let (snapshots, _) = watch::channel(QuerySnapshot::idle(active.clone()));
        Self {
            inner: Arc::new(Inner {
                fetcher,
                options,
                logger,
                state: Mutex::new(CacheState {
                    active,
                    entries: HashMap::new(),
                    placeholder: None,
                    generation: 0,
                }),
                snapshots,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot of the active criteria
    pub fn snapshot(&self) -> QuerySnapshot {
        let state = self.lock_state();
        build_snapshot(&state)
    }

    /// Watch snapshots; a new value is published after every state change
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Active criteria key
    pub fn criteria(&self) -> FilterCriteria {
        self.lock_state().active.clone()
    }

    /// Number of cached criteria entries
    pub fn cached_entries(&self) -> usize {
        self.lock_state().entries.len()
    }

    /// Make `criteria` the active key
    ///
    /// Returns the fetch this caused or joined, if any. A cached entry is shown
    /// at once; when it is stale it is refreshed in the background. A new key
    /// keeps showing the previous key's records until its first page lands.
    pub fn set_criteria(&self, criteria: FilterCriteria) -> Option<FetchHandle> {
        let now = Instant::now();
        let mut state = self.lock_state();
        self.evict_expired(&mut state, now);

        if state.active == criteria {
            if let Some(entry) = state.entries.get_mut(&criteria) {
                entry.last_used = now;
                if let Some(handle) = entry.in_flight_handle() {
                    return Some(handle);
                }
                if entry.status != QueryStatus::Idle {
                    return None;
                }
            }
        } else {
            let previous = state.active.clone();
            let previous_records = state.entries.get_mut(&previous).map(|entry| {
                entry.last_used = now;
                Arc::clone(&entry.records)
            });
            if let Some(records) = previous_records.filter(|r| !r.is_empty()) {
                state.placeholder = Some(records);
            }
            log::debug!("Active criteria {} -> {}", previous.describe(), criteria.describe());
            state.active = criteria.clone();
        }

        let stale_time = self.inner.options.stale_time;
        let entry = state
            .entries
            .entry(criteria.clone())
            .or_insert_with(|| QueryEntry::new(now));
        entry.last_used = now;

        let handle = if let Some(handle) = entry.in_flight_handle() {
            Some(handle)
        } else if entry.status == QueryStatus::Error {
            let (kind, cursor) = entry.failed.unwrap_or((FetchKind::Initial, 1));
            Some(self.start_fetch(&mut state, criteria.clone(), kind, cursor, false))
        } else if !entry.pages.is_empty() || entry.status == QueryStatus::Ready {
            if entry.is_stale(now, stale_time) && entry.status == QueryStatus::Ready {
                let cursors = entry.refresh_cursors();
                Some(self.start_fetch(&mut state, criteria.clone(), FetchKind::Refresh, cursors, false))
            } else {
                None
            }
        } else {
            Some(self.start_fetch(&mut state, criteria.clone(), FetchKind::Initial, 1, false))
        };

        if state.entries.get(&criteria).map_or(false, |e| !e.pages.is_empty() || e.status == QueryStatus::Ready) {
            state.placeholder = None;
        }

        self.publish(&state);
        handle
    }

    /// Fetch the next cursor of the active key
    ///
    /// Joins the pending fetch when one is running. Does nothing unless the
    /// entry is ready and the last page was non-empty.
    pub fn request_next(&self) -> Option<FetchHandle> {
        let mut state = self.lock_state();
        let key = state.active.clone();
        let entry = state.entries.get_mut(&key)?;

        if let Some(handle) = entry.in_flight_handle() {
            return Some(handle);
        }
        if entry.status != QueryStatus::Ready || !entry.has_more {
            return None;
        }

        let cursor = entry.next_cursor();
        let handle = self.start_fetch(&mut state, key, FetchKind::Next, cursor, false);
        self.publish(&state);
        Some(handle)
    }

    /// Re-issue the fetch that failed for the active key
    pub fn retry(&self) -> Option<FetchHandle> {
        let mut state = self.lock_state();
        let key = state.active.clone();
        let entry = state.entries.get_mut(&key)?;

        if let Some(handle) = entry.in_flight_handle() {
            return Some(handle);
        }
        if entry.status != QueryStatus::Error {
            return None;
        }

        let (kind, cursor) = entry.failed.unwrap_or((FetchKind::Initial, 1));
        log::info!("Retrying page {} for {}", cursor, key.describe());
        let handle = self.start_fetch(&mut state, key, kind, cursor, false);
        self.publish(&state);
        Some(handle)
    }

    /// Refresh the loaded pages of the active key in the background
    pub fn refetch(&self) -> Option<FetchHandle> {
        let mut state = self.lock_state();
        let key = state.active.clone();
        let entry = state.entries.get_mut(&key)?;

        if let Some(handle) = entry.in_flight_handle() {
            return Some(handle);
        }
        if entry.status != QueryStatus::Ready {
            return None;
        }

        let cursors = entry.refresh_cursors();
        let handle = self.start_fetch(&mut state, key, FetchKind::Refresh, cursors, false);
        self.publish(&state);
        Some(handle)
    }

    /// Load the first page of `criteria` without making it active
    pub fn prefetch(&self, criteria: FilterCriteria) -> Option<FetchHandle> {
        let now = Instant::now();
        let mut state = self.lock_state();
        let entry = state
            .entries
            .entry(criteria.clone())
            .or_insert_with(|| QueryEntry::new(now));

        if let Some(handle) = entry.in_flight_handle() {
            return Some(handle);
        }
        if entry.status != QueryStatus::Idle {
            return None;
        }

        let prefetch = state.active != criteria;
        let handle = self.start_fetch(&mut state, criteria, FetchKind::Initial, 1, prefetch);
        self.publish(&state);
        Some(handle)
    }

    // ==================== Fetch lifecycle ====================

    fn start_fetch(
        &self,
        state: &mut CacheState,
        key: FilterCriteria,
        kind: FetchKind,
        cursor: u32,
        prefetch: bool,
    ) -> FetchHandle {
        state.generation += 1;
        let generation = state.generation;

        let query = self.clone();
        let task_key = key.clone();
        let outcome = async move { query.run_fetch(task_key, kind, cursor, generation).await }
            .boxed()
            .shared();
        let handle = FetchHandle { outcome };
        tokio::spawn(handle.outcome.clone());

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.status = match kind {
                FetchKind::Initial => QueryStatus::Loading,
                FetchKind::Next => QueryStatus::LoadingNext,
                FetchKind::Refresh => QueryStatus::Ready,
            };
            entry.error = None;
            entry.in_flight = Some(InFlight {
                generation,
                kind,
                prefetch,
                handle: handle.clone(),
            });
        }

        log::debug!("Fetch #{} ({:?}, cursor {}) for {}", generation, kind, cursor, key.describe());
        handle
    }

    async fn run_fetch(&self, key: FilterCriteria, kind: FetchKind, cursor: u32, generation: u64) -> FetchOutcome {
        let result = match kind {
            FetchKind::Initial | FetchKind::Next => {
                self.inner.fetcher.fetch(cursor, &key).await.map(|page| vec![page])
            }
            FetchKind::Refresh => self.fetch_first_pages(&key, cursor).await,
        };
        self.complete(key, kind, cursor, generation, result)
    }

    /// Fetch cursors `1..=count` in order, stopping after the first empty page
    async fn fetch_first_pages(&self, key: &FilterCriteria, count: u32) -> Result<Vec<Page>, CoreError> {
        let mut pages = Vec::new();
        for cursor in 1..=count {
            let page = self.inner.fetcher.fetch(cursor, key).await?;
            let exhausted = page.is_empty();
            pages.push(page);
            if exhausted {
                break;
            }
        }
        Ok(pages)
    }

    fn complete(
        &self,
        key: FilterCriteria,
        kind: FetchKind,
        cursor: u32,
        generation: u64,
        result: Result<Vec<Page>, CoreError>,
    ) -> FetchOutcome {
        let now = Instant::now();
        let mut state = self.lock_state();
        let is_active = state.active == key;

        let Some(entry) = state.entries.get_mut(&key) else {
            log::debug!("Fetch #{} finished after {} was evicted", generation, key.describe());
            return FetchOutcome::Discarded;
        };
        let prefetch = match &entry.in_flight {
            Some(flight) if flight.generation == generation => flight.prefetch,
            _ => return FetchOutcome::Discarded,
        };
        entry.in_flight = None;

        if !is_active && !prefetch {
            log::debug!(
                "Discarding fetch #{} (cursor {}) for inactive criteria {}",
                generation,
                cursor,
                key.describe()
            );
            if entry.pages.is_empty() {
                state.entries.remove(&key);
            } else {
                entry.status = if entry.failed.is_some() { QueryStatus::Error } else { QueryStatus::Ready };
            }
            return FetchOutcome::Discarded;
        }

        let outcome = match result {
            Ok(mut pages) => {
                entry.error = None;
                entry.failed = None;
                entry.status = QueryStatus::Ready;
                entry.updated_at = Some(now);

                match kind {
                    FetchKind::Initial | FetchKind::Next => {
                        let page = pages.pop().unwrap_or_default();
                        if page.is_empty() {
                            entry.has_more = false;
                            FetchOutcome::Exhausted { cursor }
                        } else {
                            let count = page.len();
                            entry.has_more = true;
                            entry.append(page);
                            FetchOutcome::Appended { cursor, count }
                        }
                    }
                    FetchKind::Refresh => {
                        entry.has_more = pages.last().map_or(false, |p| !p.is_empty());
                        pages.retain(|p| !p.is_empty());
                        let count = pages.len();
                        entry.replace_pages(pages);
                        FetchOutcome::Refreshed { pages: count }
                    }
                }
            }
            Err(error) => {
                let context = ErrorContext::new(format!("{:?} fetch", kind))
                    .with_criteria(key.describe())
                    .with_cursor(cursor);
                self.inner.logger.log_error(&error, &context);

                entry.status = QueryStatus::Error;
                entry.error = Some(error.clone());
                entry.failed = Some((kind, cursor));
                FetchOutcome::Failed(error)
            }
        };

        if is_active {
            state.placeholder = None;
        }
        self.publish(&state);
        outcome
    }

    fn evict_expired(&self, state: &mut CacheState, now: Instant) {
        let gc_time = self.inner.options.gc_time;
        let active = state.active.clone();
        state.entries.retain(|key, entry| {
            let keep = *key == active
                || entry.in_flight.is_some()
                || now.saturating_duration_since(entry.last_used) < gc_time;
            if !keep {
                log::debug!("Evicting cached pages for {}", key.describe());
            }
            keep
        });
    }

    fn publish(&self, state: &CacheState) {
        self.inner.snapshots.send_replace(build_snapshot(state));
    }
}

fn build_snapshot(state: &CacheState) -> QuerySnapshot {
    let Some(entry) = state.entries.get(&state.active) else {
        return QuerySnapshot::idle(state.active.clone());
    };

    let (records, is_placeholder) = match &state.placeholder {
        Some(previous) if entry.pages.is_empty() && entry.status == QueryStatus::Loading => {
            (Arc::clone(previous), true)
        }
        _ => (Arc::clone(&entry.records), false),
    };

    QuerySnapshot {
        criteria: state.active.clone(),
        records,
        status: entry.status,
        has_more: entry.has_more,
        error: entry.error.clone(),
        is_placeholder,
        is_refetching: entry
            .in_flight
            .as_ref()
            .map_or(false, |f| f.kind == FetchKind::Refresh),
        page_count: entry.pages.len(),
    }
}

// ==================== Tests ====================
