//! Summary statistics over the currently loaded records
//!
//! The loaded set is usually a prefix of the full result, so these numbers
//! describe what has been fetched so far.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::TransactionRecord;
use crate::types::Category;

/// Label shown when there is no top category
pub const NO_CATEGORY: &str = "N/A";

/// Derived insight values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InsightsSummary {
    /// Number of loaded records
    pub total_count: usize,
    /// Sum of amounts of succeeded records
    pub successful_amount: Decimal,
    /// Percentage of succeeded records, one decimal place, 0 when empty
    pub success_rate: Decimal,
    /// Category with the largest summed amount
    pub top_category: Option<Category>,
}

impl InsightsSummary {
    /// Display form of the top category, e.g. "Payment" or "N/A"
    pub fn top_category_label(&self) -> String {
        match self.top_category {
            Some(category) => category.label(),
            None => NO_CATEGORY.to_string(),
        }
    }
}

/// Compute insights over `records`
///
/// Category totals keep first-occurrence order, so on equal totals the
/// category seen first in `records` wins.
pub fn summarize(records: &[TransactionRecord]) -> InsightsSummary {
    let total_count = records.len();
    let mut succeeded = 0usize;
    let mut successful_amount = Decimal::ZERO;
    let mut category_totals: Vec<(Category, Decimal)> = Vec::with_capacity(Category::ALL.len());

    for record in records {
        let amount = match record.amount_value() {
            Some(amount) => amount,
            None => {
                log::warn!(
                    "Transaction {} has unparseable amount '{}', counted as 0",
                    record.id,
                    record.amount
                );
                Decimal::ZERO
            }
        };

        if record.status {
            succeeded += 1;
            successful_amount = add_amount(successful_amount, amount, record);
        }

        match category_totals.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, total)) => *total = add_amount(*total, amount, record),
            None => category_totals.push((record.category, amount)),
        }
    }

    let success_rate = if total_count > 0 {
        (Decimal::from(succeeded) * Decimal::ONE_HUNDRED / Decimal::from(total_count)).round_dp(1)
    } else {
        Decimal::ZERO
    };

    let mut top: Option<(Category, Decimal)> = None;
    for (category, total) in category_totals {
        match top {
            Some((_, best)) if total <= best => {}
            _ => top = Some((category, total)),
        }
    }

    InsightsSummary {
        total_count,
        successful_amount,
        success_rate,
        top_category: top.map(|(category, _)| category),
    }
}

/// Sum that saturates at the `Decimal` range instead of panicking
fn add_amount(total: Decimal, amount: Decimal, record: &TransactionRecord) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        log::warn!(
            "Adding amount '{}' of transaction {} overflows, total capped",
            record.amount,
            record.id
        );
        total.saturating_add(amount)
    })
}

/// Memoized `summarize` keyed on the record list
///
/// Recomputes only when handed a list that is neither the same allocation
/// nor equal in content to the previous one.
#[derive(Debug, Default)]
pub struct InsightsMemo {
    last: Option<(Arc<Vec<TransactionRecord>>, InsightsSummary)>,
    computations: usize,
}

impl InsightsMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, records: &Arc<Vec<TransactionRecord>>) -> InsightsSummary {
        if let Some((input, summary)) = &self.last {
            if Arc::ptr_eq(input, records) || input.as_slice() == records.as_slice() {
                let summary = summary.clone();
                // Hold on to the newest allocation so the next pointer check hits
                self.last = Some((Arc::clone(records), summary.clone()));
                return summary;
            }
        }

        let summary = summarize(records);
        self.computations += 1;
        self.last = Some((Arc::clone(records), summary.clone()));
        summary
    }

    /// Number of times the summary was actually recomputed
    pub fn computations(&self) -> usize {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(id: &str, amount: &str, status: bool, category: Category) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            created_at: "2024-01-05T10:00:00Z".to_string(),
            name: id.to_string(),
            avatar: String::new(),
            amount: amount.to_string(),
            currency: "$".to_string(),
            category,
            status,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> Vec<TransactionRecord> {
        vec![
            record("1", "10.00", true, Category::Payment),
            record("2", "5.00", false, Category::Deposit),
            record("3", "20.00", true, Category::Payment),
        ]
    }

    #[test]
    fn test_summary_example() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.successful_amount, dec("30.00"));
        assert_eq!(summary.success_rate, dec("66.7"));
        assert_eq!(summary.top_category_label(), "Payment");
    }

    #[test]
    fn test_empty_set() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.successful_amount, Decimal::ZERO);
        assert_eq!(summary.success_rate, Decimal::ZERO);
        assert_eq!(summary.top_category, None);
        assert_eq!(summary.top_category_label(), "N/A");
    }

    #[test]
    fn test_failed_amounts_count_toward_category_totals() {
        let records = vec![
            record("1", "10.00", true, Category::Payment),
            record("2", "50.00", false, Category::Withdrawal),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.successful_amount, dec("10.00"));
        assert_eq!(summary.top_category, Some(Category::Withdrawal));
        assert_eq!(summary.success_rate, dec("50.0"));
    }

    #[test]
    fn test_tie_goes_to_first_seen_category() {
        let records = vec![
            record("1", "7.50", true, Category::Invoice),
            record("2", "5.00", true, Category::Deposit),
            record("3", "2.50", true, Category::Deposit),
        ];
        assert_eq!(summarize(&records).top_category, Some(Category::Invoice));

        let reversed: Vec<_> = records.into_iter().rev().collect();
        assert_eq!(summarize(&reversed).top_category, Some(Category::Deposit));
    }

    #[test]
    fn test_unparseable_amount_counts_as_zero() {
        let records = vec![
            record("1", "oops", true, Category::Payment),
            record("2", "3.25", true, Category::Payment),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.successful_amount, dec("3.25"));
        assert_eq!(summary.success_rate, dec("100"));
    }

    #[test]
    fn test_overflowing_sum_saturates() {
        let huge = "50000000000000000000000000000";
        let records = vec![
            record("1", huge, true, Category::Payment),
            record("2", huge, true, Category::Payment),
            record("3", "1.00", true, Category::Deposit),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.successful_amount, Decimal::MAX);
        assert_eq!(summary.top_category, Some(Category::Payment));
        assert_eq!(summary.success_rate, dec("100"));
    }

    #[test]
    fn test_deterministic() {
        let records = sample();
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_memo_recomputes_only_on_change() {
        let mut memo = InsightsMemo::new();
        let records = Arc::new(sample());

        let first = memo.get(&records);
        let again = memo.get(&records);
        assert_eq!(first, again);
        assert_eq!(memo.computations(), 1);

        // Same content in a new allocation
        let copy = Arc::new(sample());
        memo.get(&copy);
        assert_eq!(memo.computations(), 1);

        let mut grown = sample();
        grown.push(record("4", "1.00", false, Category::Invoice));
        let grown = Arc::new(grown);
        let summary = memo.get(&grown);
        assert_eq!(memo.computations(), 2);
        assert_eq!(summary.total_count, 4);
    }
}
