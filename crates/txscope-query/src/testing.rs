//! Shared test fixtures

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use txscope_core::{Category, CoreError, CoreResult, FilterCriteria, Page, TransactionRecord};
use txscope_fetch::{MemorySource, PageFetcher};

pub fn record(id: &str, status: bool) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        created_at: "2024-01-05T10:00:00Z".to_string(),
        name: format!("Customer {}", id),
        avatar: String::new(),
        amount: "10.00".to_string(),
        currency: "$".to_string(),
        category: Category::Payment,
        status,
    }
}

/// `count` records `tx-1..tx-count` cycling through every category
pub fn paged_source(count: usize) -> Arc<MemorySource> {
    let records = (1..=count)
        .map(|i| TransactionRecord {
            id: format!("tx-{}", i),
            created_at: format!("2024-01-{:02}T09:30:00Z", (i % 28) + 1),
            name: format!("Customer {}", i),
            avatar: String::new(),
            amount: format!("{}.50", i * 10),
            currency: "$".to_string(),
            category: Category::ALL[i % Category::ALL.len()],
            status: i % 3 != 0,
        })
        .collect();
    Arc::new(MemorySource::new(records))
}

/// Let spawned tasks run up to their next suspension point
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Fetcher whose calls block until the test resolves them
#[derive(Default)]
pub struct GatedFetcher {
    pending: Mutex<HashMap<(FilterCriteria, u32), oneshot::Sender<CoreResult<Page>>>>,
    calls: Mutex<Vec<u32>>,
}

pub fn gated() -> Arc<GatedFetcher> {
    Arc::new(GatedFetcher::default())
}

impl GatedFetcher {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_cursor(&self) -> Option<u32> {
        self.calls.lock().unwrap().last().copied()
    }

    /// Complete the pending call for (`criteria`, `cursor`)
    pub fn resolve(&self, criteria: &FilterCriteria, cursor: u32, result: CoreResult<Page>) {
        let sender = self
            .pending
            .lock()
            .unwrap()
            .remove(&(criteria.clone(), cursor))
            .unwrap_or_else(|| panic!("no pending fetch for {} page {}", criteria.describe(), cursor));
        let _ = sender.send(result);
    }
}

#[async_trait]
impl PageFetcher for GatedFetcher {
    async fn fetch(&self, cursor: u32, criteria: &FilterCriteria) -> CoreResult<Page> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert((criteria.clone(), cursor), tx);
        self.calls.lock().unwrap().push(cursor);
        rx.await
            .unwrap_or_else(|_| Err(CoreError::network("Failed to fetch transactions: gate dropped")))
    }
}
