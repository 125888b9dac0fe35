//! Request parameters sent to the remote endpoint

use txscope_core::{Category, CoreError, CoreResult, FilterCriteria};

/// Server-side part of a page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page cursor
    pub page: u32,
    /// Page size
    pub limit: usize,
    pub category: Option<Category>,
    /// Search text, omitted when empty
    pub search: Option<String>,
}

impl PageRequest {
    pub fn new(cursor: u32, limit: usize, criteria: &FilterCriteria) -> Self {
        Self {
            page: cursor.max(1),
            limit,
            category: criteria.category,
            search: Some(criteria.search.clone()).filter(|s| !s.is_empty()),
        }
    }

    /// Query parameters in wire order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }

    /// Full request URL against `base`
    pub fn to_url(&self, base: &str) -> CoreResult<reqwest::Url> {
        reqwest::Url::parse_with_params(base, self.query_pairs()).map_err(|e| CoreError::Config {
            message: format!("Invalid base URL '{}': {}", base, e),
        })
    }
}
