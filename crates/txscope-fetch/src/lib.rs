//! Remote transaction source and page fetch adapter
//!
//! The remote endpoint only understands `page`, `limit`, `category` and
//! `search`. `FetchAdapter` forwards those and applies the status set and
//! date range to each returned page before handing it to the query cache.

use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
pub mod memory;
pub mod request;

pub use http::HttpTransactionSource;
pub use memory::MemorySource;
pub use request::PageRequest;

use txscope_core::{CoreResult, FilterCriteria, Page};

// ==================== Traits ====================

/// Source reference type
pub type SourceRef = Arc<dyn TransactionSource>;

/// Fetcher reference type
pub type FetcherRef = Arc<dyn PageFetcher>;

/// A paginated transaction endpoint
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Return the raw page for `request`, without client-side filtering
    async fn get_page(&self, request: &PageRequest) -> CoreResult<Page>;
}

/// Turns a (cursor, criteria) pair into a filtered page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, cursor: u32, criteria: &FilterCriteria) -> CoreResult<Page>;
}

// ==================== Adapter ====================

/// Default fetcher: one remote request per cursor plus client-side filtering
pub struct FetchAdapter {
    source: SourceRef,
    page_size: usize,
}

impl FetchAdapter {
    pub fn new(source: SourceRef, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

#[async_trait]
impl PageFetcher for FetchAdapter {
    async fn fetch(&self, cursor: u32, criteria: &FilterCriteria) -> CoreResult<Page> {
        let request = PageRequest::new(cursor, self.page_size, criteria);
        let raw = self.source.get_page(&request).await?;
        let raw_len = raw.len();

        let page: Page = if criteria.status.is_empty() && criteria.date_bounds().is_unbounded() {
            raw
        } else {
            raw.into_iter()
                .filter(|record| criteria.matches_client_side(record))
                .collect()
        };

        log::debug!(
            "Fetched page {} for {}: {} records ({} before client-side filters)",
            cursor,
            criteria.describe(),
            page.len(),
            raw_len
        );
        Ok(page)
    }
}

// ==================== Tests ====================
