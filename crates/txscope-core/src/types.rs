//! Enumerations shared by records and filter criteria

use serde::{Deserialize, Serialize};

/// Transaction category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Money taken out of an account
    Withdrawal,
    /// Money put into an account
    Deposit,
    /// Outgoing payment to a third party
    Payment,
    /// Invoice settlement
    Invoice,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 4] = [
        Category::Withdrawal,
        Category::Deposit,
        Category::Payment,
        Category::Invoice,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Withdrawal => "withdrawal",
            Category::Deposit => "deposit",
            Category::Payment => "payment",
            Category::Invoice => "invoice",
        }
    }

    /// Human-readable label with the first character upper-cased
    pub fn label(&self) -> String {
        txscope_utils::capitalize_first(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "withdrawal" => Ok(Category::Withdrawal),
            "deposit" => Ok(Category::Deposit),
            "payment" => Ok(Category::Payment),
            "invoice" => Ok(Category::Invoice),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a transaction as used by the status filter
///
/// Records carry a plain boolean; this is its filterable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn label(&self) -> String {
        txscope_utils::capitalize_first(self.as_str())
    }
}

impl From<bool> for TransactionStatus {
    fn from(succeeded: bool) -> Self {
        if succeeded {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
