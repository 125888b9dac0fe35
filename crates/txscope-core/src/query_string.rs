//! Shareable URL representation of filter criteria
//!
//! Fields: `status` (comma-joined), `category`, `search`, `dateFrom`, `dateTo`.
//! Empty fields are omitted; values are percent-encoded. Parsing is lenient:
//! a malformed value resets that one field to its default.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::error::{CoreError, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::filters::FilterCriteria;
use crate::time::{format_date, parse_date};
use crate::types::{Category, TransactionStatus};

const KEY_STATUS: &str = "status";
const KEY_CATEGORY: &str = "category";
const KEY_SEARCH: &str = "search";
const KEY_DATE_FROM: &str = "dateFrom";
const KEY_DATE_TO: &str = "dateTo";

/// Serialize the non-empty fields of `criteria`, in a fixed order
pub fn criteria_to_query(criteria: &FilterCriteria) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();

    if !criteria.status.is_empty() {
        let joined = criteria
            .status
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        pairs.push((KEY_STATUS, joined));
    }
    if let Some(category) = criteria.category {
        pairs.push((KEY_CATEGORY, category.as_str().to_string()));
    }
    if !criteria.search.is_empty() {
        pairs.push((KEY_SEARCH, criteria.search.clone()));
    }
    if let Some(date) = &criteria.date_from {
        pairs.push((KEY_DATE_FROM, format_date(date)));
    }
    if let Some(date) = &criteria.date_to {
        pairs.push((KEY_DATE_TO, format_date(date)));
    }

    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a query string (with or without the leading `?`)
///
/// Returns the criteria together with every value that had to be dropped.
pub fn parse_query(query: &str) -> (FilterCriteria, Vec<CoreError>) {
    let mut criteria = FilterCriteria::default();
    let mut issues = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for (key, raw) in split_pairs(query) {
        // First occurrence wins
        if !seen.insert(key.to_string()) {
            continue;
        }

        let value = match decode_component(raw) {
            Ok(value) => value,
            Err(message) => {
                issues.push(CoreError::Validation {
                    field: key.to_string(),
                    message,
                });
                continue;
            }
        };

        match key {
            KEY_STATUS => {
                for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    match token.parse::<TransactionStatus>() {
                        Ok(status) => {
                            criteria.status.insert(status);
                        }
                        Err(message) => issues.push(CoreError::Validation {
                            field: KEY_STATUS.to_string(),
                            message,
                        }),
                    }
                }
            }
            KEY_CATEGORY if !value.is_empty() => match value.parse::<Category>() {
                Ok(category) => criteria.category = Some(category),
                Err(message) => issues.push(CoreError::Validation {
                    field: KEY_CATEGORY.to_string(),
                    message,
                }),
            },
            KEY_SEARCH => criteria.search = value.into_owned(),
            KEY_DATE_FROM if !value.is_empty() => match parse_date(KEY_DATE_FROM, &value) {
                Ok(date) => criteria.date_from = Some(date),
                Err(e) => issues.push(e),
            },
            KEY_DATE_TO if !value.is_empty() => match parse_date(KEY_DATE_TO, &value) {
                Ok(date) => criteria.date_to = Some(date),
                Err(e) => issues.push(e),
            },
            _ => {}
        }
    }

    (criteria, issues)
}

/// Parse a query string, logging and discarding malformed values
pub fn criteria_from_query(query: &str) -> FilterCriteria {
    let (criteria, issues) = parse_query(query);
    let context = ErrorContext::new("parse URL filters");
    for issue in &issues {
        DefaultErrorLogger.log_warning(&issue.to_string(), &context);
    }
    criteria
}

fn split_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn decode_component(raw: &str) -> Result<Cow<'_, str>, String> {
    if raw.contains('+') {
        let spaced = raw.replace('+', " ");
        return urlencoding::decode(&spaced)
            .map(|decoded| Cow::Owned(decoded.into_owned()))
            .map_err(|e| e.to_string());
    }
    urlencoding::decode(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn full_criteria() -> FilterCriteria {
        FilterCriteria {
            status: [TransactionStatus::Success, TransactionStatus::Failed]
                .into_iter()
                .collect(),
            category: Some(Category::Invoice),
            search: "Café & co, 100% + more".to_string(),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 31),
        }
    }

    #[test]
    fn test_empty_criteria_serializes_to_nothing() {
        assert_eq!(criteria_to_query(&FilterCriteria::default()), "");
        assert_eq!(criteria_from_query(""), FilterCriteria::default());
        assert_eq!(criteria_from_query("?"), FilterCriteria::default());
    }

    #[test]
    fn test_field_order_and_encoding() {
        let criteria = FilterCriteria {
            status: [TransactionStatus::Failed].into_iter().collect(),
            category: Some(Category::Payment),
            search: "john doe".to_string(),
            date_from: NaiveDate::from_ymd_opt(2024, 1, 5),
            date_to: None,
        };
        assert_eq!(
            criteria_to_query(&criteria),
            "status=failed&category=payment&search=john%20doe&dateFrom=2024-01-05"
        );
    }

    #[test]
    fn test_round_trip() {
        let samples = vec![
            FilterCriteria::default(),
            full_criteria(),
            FilterCriteria {
                search: "a=b&c=d?e#f".to_string(),
                ..Default::default()
            },
            FilterCriteria {
                status: [TransactionStatus::Failed].into_iter().collect(),
                date_to: NaiveDate::from_ymd_opt(2024, 2, 29),
                ..Default::default()
            },
        ];

        for criteria in samples {
            let query = criteria_to_query(&criteria);
            let (parsed, issues) = parse_query(&query);
            assert!(issues.is_empty(), "issues for {}: {:?}", query, issues);
            assert_eq!(parsed, criteria, "round trip of {}", query);
        }
    }

    #[test]
    fn test_order_is_not_significant() {
        let a = criteria_from_query("?dateTo=2024-03-31&status=failed,success&category=invoice");
        let b = criteria_from_query("category=invoice&status=success%2Cfailed&dateTo=2024-03-31");
        assert_eq!(a, b);
    }

    #[test]
    fn test_plus_decodes_as_space() {
        let criteria = criteria_from_query("search=jane+smith");
        assert_eq!(criteria.search, "jane smith");
    }

    #[test]
    fn test_malformed_date_falls_back_to_default() {
        let (criteria, issues) = parse_query("dateFrom=yesterday&dateTo=2024-01-05&category=deposit");
        assert_eq!(criteria.date_from, None);
        assert_eq!(criteria.date_to, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(criteria.category, Some(Category::Deposit));
        assert_eq!(issues.len(), 1);
        assert!(matches!(&issues[0], CoreError::Validation { field, .. } if field == "dateFrom"));
    }

    #[test]
    fn test_unknown_tokens_are_dropped() {
        let (criteria, issues) = parse_query("status=success,pending,&category=refund&page=3");
        assert_eq!(
            criteria.status,
            [TransactionStatus::Success].into_iter().collect()
        );
        assert_eq!(criteria.category, None);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_empty_values_normalize_to_defaults() {
        let (criteria, issues) = parse_query("status=&category=&search=&dateFrom=&dateTo=");
        assert_eq!(criteria, FilterCriteria::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let criteria = criteria_from_query("search=first&search=second");
        assert_eq!(criteria.search, "first");
    }
}
