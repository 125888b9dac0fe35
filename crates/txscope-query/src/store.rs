//! Filter state store
//!
//! Holds the committed `FilterCriteria` and mirrors every effective change
//! into the current location's query string. The location is replaced, never
//! pushed, so filtering does not add navigation entries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use txscope_core::{criteria_from_query, criteria_to_query, FilterCriteria, FilterPatch};

// ==================== History ====================

/// The address bar the store writes to
pub trait History: Send {
    /// Current query string, without the leading `?`
    fn query(&self) -> String;

    /// Replace the current entry's query string
    fn replace_query(&mut self, query: &str);

    /// Full location, path plus query
    fn location(&self) -> String;
}

/// In-process history with a single entry
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    path: String,
    query: String,
    replacements: usize,
}

impl MemoryHistory {
    /// Start at `location` (`/path?query`)
    pub fn new(location: &str) -> Self {
        let (path, query) = match location.split_once('?') {
            Some((path, query)) => (path, query),
            None if location.contains('=') => ("", location),
            None => (location, ""),
        };
        Self {
            path: path.to_string(),
            query: query.to_string(),
            replacements: 0,
        }
    }

    /// Number of replace operations so far
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Number of navigation entries; replacing never adds one
    pub fn len(&self) -> usize {
        1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl History for MemoryHistory {
    fn query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.replacements += 1;
    }

    fn location(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

// ==================== Store ====================

struct StoreInner {
    history: Mutex<Box<dyn History>>,
    criteria: watch::Sender<FilterCriteria>,
}

/// Observable filter state bound to a `History`
#[derive(Clone)]
pub struct FilterStore {
    inner: Arc<StoreInner>,
}

impl FilterStore {
    /// Build the store from the history's current query string
    ///
    /// Malformed fields fall back to their empty value.
    pub fn from_history<H: History + 'static>(history: H) -> Self {
        let criteria = criteria_from_query(&history.query());
        log::debug!("Initial filters: {}", criteria.describe());

        let (sender, _) = watch::channel(criteria);
        Self {
            inner: Arc::new(StoreInner {
                history: Mutex::new(Box::new(history)),
                criteria: sender,
            }),
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, Box<dyn History>> {
        self.inner.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Committed criteria
    pub fn get(&self) -> FilterCriteria {
        self.inner.criteria.borrow().clone()
    }

    /// Watch committed criteria; only effective changes are published
    pub fn subscribe(&self) -> watch::Receiver<FilterCriteria> {
        self.inner.criteria.subscribe()
    }

    /// Current location of the bound history
    pub fn location(&self) -> String {
        self.lock_history().location()
    }

    /// Shallow-merge `patch`; returns whether the criteria changed
    pub fn update(&self, patch: FilterPatch) -> bool {
        if patch.is_noop() {
            return false;
        }
        let mut next = self.get();
        if !patch.apply(&mut next) {
            return false;
        }
        self.commit(next)
    }

    /// Reset every field to its empty value
    pub fn clear(&self) -> bool {
        self.commit(FilterCriteria::default())
    }

    fn commit(&self, next: FilterCriteria) -> bool {
        // Held across the write so URL and value change together
        let mut history = self.lock_history();
        if *self.inner.criteria.borrow() == next {
            return false;
        }

        let bounds = next.date_bounds();
        if bounds.is_inverted() {
            log::warn!("Date range {} is inverted; no record can match", bounds.description());
        }

        let query = criteria_to_query(&next);
        history.replace_query(&query);
        log::debug!("Location replaced: {}", history.location());

        self.inner.criteria.send_replace(next);
        true
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use txscope_core::{Category, TransactionStatus};

    /// History that reports replacements through a shared counter
    struct CountingHistory {
        inner: MemoryHistory,
        replaced: Arc<AtomicUsize>,
    }

    impl History for CountingHistory {
        fn query(&self) -> String {
            self.inner.query()
        }

        fn replace_query(&mut self, query: &str) {
            self.replaced.fetch_add(1, Ordering::SeqCst);
            self.inner.replace_query(query);
        }

        fn location(&self) -> String {
            self.inner.location()
        }
    }

    fn counting(location: &str) -> (FilterStore, Arc<AtomicUsize>) {
        let replaced = Arc::new(AtomicUsize::new(0));
        let store = FilterStore::from_history(CountingHistory {
            inner: MemoryHistory::new(location),
            replaced: replaced.clone(),
        });
        (store, replaced)
    }

    #[test]
    fn test_initial_criteria_from_location() {
        let store = FilterStore::from_history(MemoryHistory::new(
            "/transactions?status=failed&category=deposit&dateFrom=2024-01-01",
        ));
        let criteria = store.get();
        assert_eq!(criteria.category, Some(Category::Deposit));
        assert!(criteria.status.contains(&TransactionStatus::Failed));
        assert_eq!(criteria.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(criteria.search, "");
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let store = FilterStore::from_history(MemoryHistory::new("/?dateFrom=yesterday&category=loan&search=ada"));
        let criteria = store.get();
        assert_eq!(criteria.date_from, None);
        assert_eq!(criteria.category, None);
        assert_eq!(criteria.search, "ada");
    }

    #[test]
    fn test_update_merges_fields_independently() {
        let store = FilterStore::from_history(MemoryHistory::new("/?category=payment&search=ada"));

        assert!(store.update(FilterPatch::new().status([TransactionStatus::Success])));
        let criteria = store.get();
        assert_eq!(criteria.category, Some(Category::Payment));
        assert_eq!(criteria.search, "ada");

        assert!(store.update(FilterPatch::new().category(None)));
        let criteria = store.get();
        assert_eq!(criteria.category, None);
        assert_eq!(criteria.status.len(), 1);
        assert_eq!(store.location(), "/?status=success&search=ada");
    }

    #[test]
    fn test_only_effective_changes_replace_location() {
        let (store, replaced) = counting("/dashboard");

        assert!(!store.update(FilterPatch::new()));
        assert!(!store.update(FilterPatch::new().search("")));
        assert_eq!(replaced.load(Ordering::SeqCst), 0);

        assert!(store.update(FilterPatch::new().search("john & jane")));
        assert_eq!(replaced.load(Ordering::SeqCst), 1);
        assert_eq!(store.location(), "/dashboard?search=john%20%26%20jane");

        assert!(!store.update(FilterPatch::new().search("john & jane")));
        assert_eq!(replaced.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, replaced) = counting("/?status=success,failed&category=invoice");

        assert!(store.clear());
        let once = store.get();
        assert!(!store.clear());
        assert_eq!(store.get(), once);
        assert!(once.is_empty());
        assert_eq!(replaced.load(Ordering::SeqCst), 1);
        assert_eq!(store.location(), "/");
    }

    #[test]
    fn test_replace_never_adds_entries() {
        let mut history = MemoryHistory::new("/?search=a");
        history.replace_query("search=b");
        history.replace_query("search=c");
        assert_eq!(history.len(), 1);
        assert_eq!(history.replacements(), 2);
        assert_eq!(history.location(), "/?search=c");
    }

    #[test]
    fn test_inverted_range_is_kept() {
        let store = FilterStore::from_history(MemoryHistory::default());
        assert!(store.update(
            FilterPatch::new()
                .date_from(NaiveDate::from_ymd_opt(2024, 2, 1))
                .date_to(NaiveDate::from_ymd_opt(2024, 1, 1))
        ));
        assert!(store.get().date_bounds().is_inverted());
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = FilterStore::from_history(MemoryHistory::new("/"));
        let mut updates = store.subscribe();

        store.update(FilterPatch::new().category(Some(Category::Withdrawal)));
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().category, Some(Category::Withdrawal));

        store.update(FilterPatch::new().category(Some(Category::Withdrawal)));
        assert!(!updates.has_changed().unwrap());
    }
}
