//! Debounced search input
//!
//! Keystrokes update a local buffer at once; the committed search in the
//! `FilterStore` only changes once input has been quiet for the debounce
//! interval.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use txscope_core::FilterPatch;

use crate::store::FilterStore;

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ==================== Debouncer ====================

/// Single-slot timer: each `schedule` replaces the pending action
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` after the delay unless rescheduled or cancelled first
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = tokio::time::Instant::now() + self.delay;
        let mut pending = relock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            action();
        }));
    }

    /// Drop the pending action; returns whether one was waiting
    pub fn cancel_pending(&self) -> bool {
        match relock(&self.pending).take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        relock(&self.pending)
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = relock(&self.pending).take() {
            handle.abort();
        }
    }
}

// ==================== Search input ====================

#[derive(Debug, Default)]
struct Buffer {
    /// Text shown in the input
    local: String,
    /// Last committed value this input has seen
    seen: String,
}

/// Locally buffered search text bound to a `FilterStore`
pub struct DebouncedSearch {
    store: FilterStore,
    debouncer: Debouncer,
    buffer: Mutex<Buffer>,
}

impl DebouncedSearch {
    pub fn new(store: FilterStore, delay: Duration) -> Self {
        let committed = store.get().search;
        Self {
            store,
            debouncer: Debouncer::new(delay),
            buffer: Mutex::new(Buffer {
                local: committed.clone(),
                seen: committed,
            }),
        }
    }

    /// Text currently shown in the input
    pub fn local(&self) -> String {
        relock(&self.buffer).local.clone()
    }

    /// Search value committed to the store
    pub fn committed(&self) -> String {
        self.store.get().search
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Record a keystroke; the commit happens after the quiet interval
    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        relock(&self.buffer).local = text.clone();

        let store = self.store.clone();
        self.debouncer.schedule(move || {
            if store.update(FilterPatch::new().search(text.clone())) {
                log::debug!("Search committed: {:?}", text);
            }
        });
    }

    /// Clear the input and commit the empty search at once
    pub fn clear(&self) {
        self.debouncer.cancel_pending();
        relock(&self.buffer).local.clear();
        self.store.update(FilterPatch::new().search(""));
    }

    /// Commit the buffered text now
    pub fn flush(&self) -> bool {
        self.debouncer.cancel_pending();
        let text = self.local();
        self.store.update(FilterPatch::new().search(text))
    }

    /// Follow the committed value after a store change
    ///
    /// Only a change of the committed search itself matters. When the new
    /// value differs from the buffer, the pending commit is dropped and the
    /// buffer is overwritten. Returns whether the buffer changed.
    pub fn sync_from_committed(&self, committed: &str) -> bool {
        let mut buffer = relock(&self.buffer);
        if buffer.seen == committed {
            return false;
        }
        buffer.seen = committed.to_string();
        if buffer.local == committed {
            return false;
        }
        self.debouncer.cancel_pending();
        buffer.local = committed.to_string();
        true
    }
}

// ==================== Tests ====================
