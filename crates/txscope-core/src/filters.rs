//! Filter criteria and partial updates
//!
//! `FilterCriteria` is a plain value: two criteria with the same fields are
//! the same cache key. Category and search are sent to the remote endpoint;
//! status and date bounds are applied here, over each returned page.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::models::TransactionRecord;
use crate::query_string::criteria_to_query;
use crate::time::DateBounds;
use crate::types::{Category, TransactionStatus};

/// Current filter selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FilterCriteria {
    /// Accepted statuses; empty accepts everything
    pub status: BTreeSet<TransactionStatus>,
    /// Single category, `None` for all
    pub category: Option<Category>,
    /// Free-text search, matched by the endpoint
    pub search: String,
    /// Inclusive lower calendar day
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper calendar day
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// True when no field constrains the result
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when status, category or dates are set (search is not counted)
    pub fn has_active_filters(&self) -> bool {
        !self.status.is_empty()
            || self.category.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
    }

    pub fn date_bounds(&self) -> DateBounds {
        DateBounds::new(self.date_from, self.date_to)
    }

    /// Status set membership; an empty set matches everything
    pub fn matches_status(&self, record: &TransactionRecord) -> bool {
        self.status.is_empty() || self.status.contains(&record.transaction_status())
    }

    pub fn matches_dates(&self, record: &TransactionRecord) -> bool {
        self.date_bounds().contains_timestamp(&record.created_at)
    }

    /// Filters the endpoint cannot apply itself
    pub fn matches_client_side(&self, record: &TransactionRecord) -> bool {
        self.matches_status(record) && self.matches_dates(record)
    }

    /// Short description for logs: the query string, or `<all>`
    pub fn describe(&self) -> String {
        let query = criteria_to_query(self);
        if query.is_empty() {
            "<all>".to_string()
        } else {
            query
        }
    }
}

/// Partial update of a `FilterCriteria`
///
/// Each field is independent: `None` leaves the current value alone, while
/// `Some(None)` on an optional field clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub status: Option<BTreeSet<TransactionStatus>>,
    pub category: Option<Option<Category>>,
    pub search: Option<String>,
    pub date_from: Option<Option<NaiveDate>>,
    pub date_to: Option<Option<NaiveDate>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = TransactionStatus>,
    {
        self.status = Some(statuses.into_iter().collect());
        self
    }

    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn date_from(mut self, date: Option<NaiveDate>) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: Option<NaiveDate>) -> Self {
        self.date_to = Some(date);
        self
    }

    /// True when the patch touches no field
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge into `criteria`, returning whether anything changed
    pub fn apply(&self, criteria: &mut FilterCriteria) -> bool {
        let before = criteria.clone();

        if let Some(status) = &self.status {
            criteria.status = status.clone();
        }
        if let Some(category) = self.category {
            criteria.category = category;
        }
        if let Some(search) = &self.search {
            criteria.search = search.clone();
        }
        if let Some(date_from) = self.date_from {
            criteria.date_from = date_from;
        }
        if let Some(date_to) = self.date_to {
            criteria.date_to = date_to;
        }

        *criteria != before
    }
}
