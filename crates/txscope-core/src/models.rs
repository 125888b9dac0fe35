//! Transaction records as served by the remote endpoint

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::time::parse_timestamp;
use crate::types::{Category, TransactionStatus};

/// Transaction information
///
/// Read-only on the client; the amount stays a string so no precision is lost
/// before it is parsed into a `Decimal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Unique transaction identifier
    pub id: String,
    /// Creation timestamp
    pub created_at: String,
    /// Display name of the counterparty
    pub name: String,
    /// Avatar image reference
    pub avatar: String,
    /// Amount as a decimal string
    pub amount: String,
    /// Currency symbol
    pub currency: String,
    /// Transaction category
    pub category: Category,
    /// True if the transaction succeeded
    pub status: bool,
}

/// One fetch cycle worth of records; empty means no more data
pub type Page = Vec<TransactionRecord>;

impl TransactionRecord {
    /// Filterable status
    pub fn transaction_status(&self) -> TransactionStatus {
        TransactionStatus::from(self.status)
    }

    /// "success" or "failed"
    pub fn status_label(&self) -> &'static str {
        self.transaction_status().as_str()
    }

    /// Parsed amount, `None` if the string is not a decimal number
    pub fn amount_value(&self) -> Option<Decimal> {
        Decimal::from_str(self.amount.trim()).ok()
    }

    /// Parsed creation time in UTC
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// One-line summary for logs and plain-text listings
    pub fn summary(&self) -> String {
        format!(
            "{} {} {}{} [{}] {}",
            self.created_at,
            self.name,
            self.currency,
            self.amount,
            self.category,
            self.status_label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_record() {
        let json = r#"{
            "id": "tx-1",
            "createdAt": "2024-01-05T10:30:00.000Z",
            "name": "Ada Lovelace",
            "avatar": "https://example.com/a.png",
            "amount": "120.50",
            "currency": "$",
            "category": "deposit",
            "status": false
        }"#;
        let record: TransactionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "tx-1");
        assert_eq!(record.category, Category::Deposit);
        assert_eq!(record.status_label(), "failed");
        assert_eq!(record.amount_value(), Some(Decimal::from_str("120.50").unwrap()));
        assert!(record.created_at_utc().is_some());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let json = r#"{"id":"x","createdAt":"","name":"","avatar":"","amount":"1",
            "currency":"$","category":"refund","status":true}"#;
        assert!(serde_json::from_str::<TransactionRecord>(json).is_err());
    }

    #[test]
    fn test_bad_amount() {
        let record = TransactionRecord {
            id: "x".to_string(),
            created_at: "2024-01-01".to_string(),
            name: "n".to_string(),
            avatar: String::new(),
            amount: "abc".to_string(),
            currency: "$".to_string(),
            category: Category::Payment,
            status: true,
        };
        assert_eq!(record.amount_value(), None);
        assert!(record.summary().contains("[payment] success"));
    }
}
