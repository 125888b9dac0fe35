//! In-memory transaction source
//!
//! Behaves like the remote endpoint over a fixed record list: exact category
//! match, case-insensitive search on name and id, then `page`/`limit` slicing.
//! Used for offline runs against a JSON fixture.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::http::parse_page;
use crate::request::PageRequest;
use crate::TransactionSource;
use txscope_core::{CoreResult, Page, TransactionRecord};

#[derive(Debug, Default)]
pub struct MemorySource {
    records: Vec<TransactionRecord>,
    requests: AtomicUsize,
}

impl MemorySource {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            records,
            requests: AtomicUsize::new(0),
        }
    }

    /// Load records from a JSON array
    pub fn from_json(body: &str) -> CoreResult<Self> {
        Ok(Self::new(parse_page(body)?))
    }

    /// Number of pages served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSource for MemorySource {
    async fn get_page(&self, request: &PageRequest) -> CoreResult<Page> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let needle = request.search.as_ref().map(|s| s.to_lowercase());
        let offset = (request.page.saturating_sub(1) as usize).saturating_mul(request.limit);

        Ok(self
            .records
            .iter()
            .filter(|r| request.category.map_or(true, |c| r.category == c))
            .filter(|r| {
                needle.as_ref().map_or(true, |n| {
                    r.name.to_lowercase().contains(n) || r.id.to_lowercase().contains(n)
                })
            })
            .skip(offset)
            .take(request.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txscope_core::{Category, FilterCriteria};

    fn records() -> Vec<TransactionRecord> {
        (1..=5)
            .map(|i| TransactionRecord {
                id: format!("tx-{}", i),
                created_at: format!("2024-01-0{}T09:00:00Z", i),
                name: if i % 2 == 0 { "Grace Hopper".to_string() } else { "Alan Turing".to_string() },
                avatar: String::new(),
                amount: format!("{}.00", i),
                currency: "$".to_string(),
                category: if i <= 3 { Category::Payment } else { Category::Invoice },
                status: true,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_pages_then_empty() {
        let source = MemorySource::new(records());
        let criteria = FilterCriteria::default();

        let first = source.get_page(&PageRequest::new(1, 2, &criteria)).await.unwrap();
        let third = source.get_page(&PageRequest::new(3, 2, &criteria)).await.unwrap();
        let fourth = source.get_page(&PageRequest::new(4, 2, &criteria)).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(third.len(), 1);
        assert!(fourth.is_empty());
        assert_eq!(source.request_count(), 3);
    }

    #[tokio::test]
    async fn test_category_and_search() {
        let source = MemorySource::new(records());
        let criteria = FilterCriteria {
            category: Some(Category::Payment),
            search: "GRACE".to_string(),
            ..Default::default()
        };

        let page = source.get_page(&PageRequest::new(1, 10, &criteria)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["tx-2"]);
    }

    #[test]
    fn test_from_json() {
        let source = MemorySource::from_json("[]").unwrap();
        assert_eq!(source.request_count(), 0);
        assert!(MemorySource::from_json("nope").is_err());
    }
}
